use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use rimu_api::{
    ClientConfig, Error, MetaSearch, MoveRequest, OrderQuery, RimuClient, RunningState,
    ServerSpec,
};
use serde_json::{Value, json};

/// One request as seen by the mock provider.
#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

/// Canned response keyed by method and exact path.
struct Canned {
    method: Method,
    path: String,
    status: StatusCode,
    body: String,
}

#[derive(Default)]
struct MockProvider {
    canned: Mutex<Vec<Canned>>,
    seen: Mutex<Vec<Seen>>,
}

impl MockProvider {
    fn respond(&self, method: Method, path: &str, status: StatusCode, body: impl ToString) {
        self.canned.lock().unwrap().push(Canned {
            method,
            path: path.to_string(),
            status,
            body: body.to_string(),
        });
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn handle(
    State(mock): State<Arc<MockProvider>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    mock.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).ok(),
    });

    let canned = mock.canned.lock().unwrap();
    match canned.iter().find(|c| c.method == method && c.path == path) {
        Some(c) => (c.status, c.body.clone()),
        None => (StatusCode::NOT_FOUND, format!("no route for {method} {path}")),
    }
}

async fn spawn_provider() -> (Arc<MockProvider>, String) {
    let mock = Arc::new(MockProvider::default());
    let app = Router::new().fallback(handle).with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (mock, format!("http://{addr}"))
}

fn client(base_url: &str, api_key: Option<&str>) -> RimuClient {
    RimuClient::new(ClientConfig {
        api_key: api_key.map(str::to_string),
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .unwrap()
}

fn orders_body(orders: Value) -> String {
    json!({ "get_orders_response": { "status_code": 200, "about_orders": orders } }).to_string()
}

#[tokio::test]
async fn distros_need_no_key() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/distributions",
        StatusCode::OK,
        json!({ "get_distros_response": { "distro_infos": [
            { "distro_code": "centos7.64", "distro_description": "CentOS 7" },
            { "distro_code": "coreos.64" },
        ]}}),
    );

    let api = client(&url, None);
    let distros = api.distros().await.unwrap();

    assert_eq!(distros.len(), 2);
    assert_eq!(distros[1].distro_code, "coreos.64");
    assert_eq!(api.cached_distros().map(<[_]>::len), Some(2));
    assert_eq!(mock.seen()[0].authorization, None);
}

#[tokio::test]
async fn data_centers_reuse_fetched_plans() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/pricing-plans",
        StatusCode::OK,
        json!({ "get_pricing_plans_response": { "pricing_plan_infos": [
            { "pricing_plan_code": "MiroVPS1", "offered_at_data_center": { "data_center_location_code": "DCDALLAS" } },
            { "pricing_plan_code": "MiroVPS2", "offered_at_data_center": { "data_center_location_code": "DCLONDON" } },
            { "pricing_plan_code": "MiroVPS3", "offered_at_data_center": { "data_center_location_code": "DCDALLAS" } },
        ]}}),
    );

    let api = client(&url, Some("k"));
    let first = api.data_centers().await.unwrap();
    let second = api.data_centers().await.unwrap();

    let codes: Vec<_> = first.iter().map(|d| d.data_center_location_code.as_str()).collect();
    assert_eq!(codes, vec!["DCDALLAS", "DCLONDON"]);
    assert_eq!(first, second);
    assert_eq!(mock.seen().len(), 1);
}

#[tokio::test]
async fn orders_without_key_fail_before_sending() {
    let (mock, url) = spawn_provider().await;

    let err = client(&url, None)
        .orders(&OrderQuery::active_vps())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingCredential));
    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn orders_send_key_and_matrix_filters() {
    let (mock, url) = spawn_provider().await;
    let path = "/r/orders;include_inactive=N;server_type=VPS;\
                meta_search=com.rimuhosting.kclusterid%3Ac1%20com.rimuhosting.kismaster%3AY";
    mock.respond(
        Method::GET,
        path,
        StatusCode::OK,
        orders_body(json!([{ "order_oid": 11, "domain_name": "m.example.com" }])),
    );

    let query = OrderQuery::active_vps().meta_search(
        MetaSearch::new()
            .with("com.rimuhosting.kclusterid", "c1")
            .with("com.rimuhosting.kismaster", "Y"),
    );
    let orders = client(&url, Some("secret")).orders(&query).await.unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_oid, 11);
    let seen = mock.seen();
    assert_eq!(seen[0].authorization.as_deref(), Some("rimuapi apikey=secret"));
}

#[tokio::test]
async fn empty_order_list_is_not_an_error() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/orders;include_inactive=N;server_type=VPS",
        StatusCode::OK,
        orders_body(json!(null)),
    );

    let orders = client(&url, Some("k"))
        .orders(&OrderQuery::active_vps())
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn order_by_oid_requires_exactly_one() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/orders;include_inactive=N;server_type=VPS;order_oids=1",
        StatusCode::OK,
        orders_body(json!([])),
    );
    mock.respond(
        Method::GET,
        "/r/orders;include_inactive=N;server_type=VPS;order_oids=2",
        StatusCode::OK,
        orders_body(json!([{ "order_oid": 2 }, { "order_oid": 2 }])),
    );
    mock.respond(
        Method::GET,
        "/r/orders;include_inactive=N;server_type=VPS;order_oids=3",
        StatusCode::OK,
        orders_body(json!([{ "order_oid": 3, "domain_name": "three.com" }])),
    );

    let api = client(&url, Some("k"));
    assert!(matches!(api.order_by_oid(1).await, Err(Error::OrderNotFound(1))));
    assert!(matches!(
        api.order_by_oid(2).await,
        Err(Error::DuplicateOrder { order_oid: 2, count: 2 })
    ));
    assert_eq!(api.order_by_oid(3).await.unwrap().domain_name, "three.com");
}

#[tokio::test]
async fn find_order_oids_by_domain_and_ip() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/orders;include_inactive=N",
        StatusCode::OK,
        orders_body(json!([
            { "order_oid": 1, "domain_name": "a.com", "allocated_ips": { "primary_ip": "10.0.0.1" } },
            { "order_oid": 2, "domain_name": "a.com", "allocated_ips": { "primary_ip": "10.0.0.2" } },
            { "order_oid": 3, "domain_name": "b.com" },
        ])),
    );

    let api = client(&url, Some("k"));
    assert_eq!(api.find_order_oids("a.com", None).await.unwrap(), vec![1, 2]);
    assert_eq!(api.find_order_oids("a.com", Some("10.0.0.2")).await.unwrap(), vec![2]);
    assert!(api.find_order_oids("c.com", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_posts_new_order_request() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::POST,
        "/r/orders/new-vps",
        StatusCode::OK,
        json!({ "post_new_vps_response": { "about_order": { "order_oid": 77 } } }),
    );

    let spec = ServerSpec {
        domain_name: Some("new.example.com".into()),
        memory_mb: Some(1024),
        ssh_pub_key: Some("ssh-ed25519 AAAA".into()),
        ..Default::default()
    };
    let resp = client(&url, Some("k")).create(None, &spec).await.unwrap();

    assert_eq!(resp["post_new_vps_response"]["about_order"]["order_oid"], 77);
    let seen = mock.seen();
    assert_eq!(
        seen[0].body,
        Some(json!({ "new_order_request": {
            "instantiation_options": { "domain_name": "new.example.com" },
            "vps_parameters": { "memory_mb": 1024 },
            "file_injection_data": [
                { "data_as_string": "ssh-ed25519 AAAA", "path": "/root/.ssh/authorized_keys" }
            ],
        }}))
    );
}

#[tokio::test]
async fn create_with_bad_domain_never_sends() {
    let (mock, url) = spawn_provider().await;
    let spec = ServerSpec {
        domain_name: Some("bad-.example.com".into()),
        ..Default::default()
    };

    let err = client(&url, Some("k")).create(None, &spec).await.unwrap_err();

    assert!(matches!(err, Error::InvalidDomain(_)));
    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn reinstall_puts_to_order_path() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::PUT,
        "/r/orders/order-42-host.example.com/vps/reinstall",
        StatusCode::OK,
        json!({ "put_reinstall_response": {} }),
    );

    let spec = ServerSpec {
        distro: Some("coreos.64".into()),
        ..Default::default()
    };
    client(&url, Some("k"))
        .reinstall(42, Some("host.example.com"), &spec)
        .await
        .unwrap();

    let seen = mock.seen();
    assert_eq!(seen[0].method, Method::PUT);
    assert_eq!(
        seen[0].body.as_ref().unwrap()["new_order_request"]["instantiation_options"]["distro"],
        "coreos.64"
    );
}

#[tokio::test]
async fn api_errors_carry_human_readable_message() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::POST,
        "/r/orders/new-vps",
        StatusCode::BAD_REQUEST,
        json!({ "post_new_vps_response": { "status_message": "fail", "error_info": {
            "error_class": "ValidationException",
            "human_readable_message": "That distro is not available",
        }}}),
    );

    let spec = ServerSpec {
        domain_name: Some("x.com".into()),
        ..Default::default()
    };
    let err = client(&url, Some("k")).create(None, &spec).await.unwrap_err();

    match err {
        Error::Api { status, reason, message } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(reason, "Bad Request");
            assert_eq!(message, "That distro is not available");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn api_errors_fall_back_to_raw_body() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/orders/order-5-a.com",
        StatusCode::INTERNAL_SERVER_ERROR,
        "upstream exploded",
    );

    let err = client(&url, Some("k")).info(5, "a.com").await.unwrap_err();
    assert!(matches!(err, Error::Api { message, .. } if message == "upstream exploded"));
}

#[tokio::test]
async fn info_and_status_unwrap_envelopes() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::GET,
        "/r/orders/order-9-nine.com",
        StatusCode::OK,
        json!({ "get_order_response": { "about_order": {
            "order_oid": 9, "domain_name": "nine.com", "running_state": "NOTRUNNING",
        }}}),
    );
    mock.respond(
        Method::GET,
        "/r/orders/order-9-nine.com/vps",
        StatusCode::OK,
        json!({ "get_vps_status_response": { "running_vps_info": { "running_state": "RUNNING" } } }),
    );

    let api = client(&url, Some("k"));
    let order = api.info(9, "nine.com").await.unwrap();
    assert_eq!(order.running_state, Some(RunningState::NotRunning));

    let status = api.status(9, "nine.com").await.unwrap();
    assert_eq!(status, json!({ "running_state": "RUNNING" }));
}

#[tokio::test]
async fn running_state_changes_send_state_name() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::PUT,
        "/r/orders/order-3-c.com/vps/running-state",
        StatusCode::OK,
        json!({}),
    );

    let api = client(&url, Some("k"));
    api.reboot(3, "c.com").await.unwrap();
    api.power_cycle(3, "c.com").await.unwrap();

    let states: Vec<_> = mock
        .seen()
        .iter()
        .map(|s| s.body.as_ref().unwrap()["running_state_change_request"]["running_state"].clone())
        .collect();
    assert_eq!(states, vec![json!("RESTARTING"), json!("POWERCYCLING")]);
}

#[tokio::test]
async fn delete_and_move_validate_domain_first() {
    let (mock, url) = spawn_provider().await;
    let api = client(&url, Some("k"));

    assert!(matches!(api.delete(1, "-x.com").await, Err(Error::InvalidDomain(_))));
    assert!(matches!(
        api.move_vps(1, "x_.com", &MoveRequest::default()).await,
        Err(Error::InvalidDomain(_))
    ));
    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn delete_returns_body_and_move_sends_request() {
    let (mock, url) = spawn_provider().await;
    mock.respond(
        Method::DELETE,
        "/r/orders/order-8-na.com/vps",
        StatusCode::OK,
        json!({ "delete_server_response": { "status_message": "ok" } }),
    );
    mock.respond(
        Method::PUT,
        "/r/orders/order-8-na.com/vps/host-server",
        StatusCode::OK,
        "",
    );

    let api = client(&url, Some("k"));
    let resp = api.delete(8, "na.com").await.unwrap();
    assert_eq!(resp["delete_server_response"]["status_message"], "ok");

    let moved = api
        .move_vps(
            8,
            "na.com",
            &MoveRequest {
                move_reason: "maintenance".into(),
                selected_host_server_oid: Some(555),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved, Value::Null);

    let body = mock.seen()[1].body.clone().unwrap();
    assert_eq!(body["vps_move_request"]["move_reason"], "maintenance");
    assert_eq!(body["vps_move_request"]["selected_host_server_oid"], 555);
    assert_eq!(body["vps_move_request"]["pricing_change_option"], "CHOOSE_BEST_OPTION");
}
