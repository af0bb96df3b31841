//! Typed Rust client for the RimuHosting REST API.
//!
//! Covers the order/VPS surface needed to run servers from the command line:
//! catalog listings (distributions, pricing plans, data centers), order
//! queries, and VPS create, reinstall, delete, running-state and host moves.
//!
//! Every call is a single request; nothing is retried.

mod domain;
mod query;
mod request;
mod summary;
mod types;

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};

pub use domain::is_valid_domain;
pub use query::{MetaSearch, OrderQuery};
pub use request::{AUTHORIZED_KEYS_PATH, ServerSpec, build_request};
pub use summary::{data_centers, summarize};
pub use types::*;

pub const DEFAULT_BASE_URL: &str = "https://rimuhosting.com";

const KEY_HELP: &str = "no RimuHosting API key configured. \
    Get one from https://rimuhosting.com/cp/apikeys.jsp, then set \
    RIMUHOSTING_APIKEY or put `apikey = <key>` in ~/.rimuhosting";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("domain name not valid: {0:?}")]
    InvalidDomain(String),

    #[error("{}", KEY_HELP)]
    MissingCredential,

    #[error("rimuhosting api returned {status} {reason}: {message}")]
    Api {
        status: StatusCode,
        reason: String,
        message: String,
    },

    #[error("rimuhosting api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not decode rimuhosting data: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unexpected rimuhosting response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid server spec: {0}")]
    InvalidSpec(String),

    #[error("no order with oid {0}")]
    OrderNotFound(u64),

    #[error("found {count} orders with oid {order_oid}")]
    DuplicateOrder { order_oid: u64, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Explicit client configuration, resolved once by the caller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Log request and response bodies at debug level.
    pub verbose: bool,
    /// Per-request timeout. `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            verbose: false,
            timeout: None,
        }
    }
}

/// Client for the RimuHosting REST API.
pub struct RimuClient {
    api_key: Option<String>,
    base_url: String,
    verbose: bool,
    http: reqwest::Client,
    distros: OnceLock<Vec<DistroInfo>>,
    plans: OnceLock<Vec<PricingPlan>>,
}

impl RimuClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key: config.api_key.filter(|k| !k.is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            verbose: config.verbose,
            http: builder.build()?,
            distros: OnceLock::new(),
            plans: OnceLock::new(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth(key: &str) -> String {
        format!("rimuapi apikey={key}")
    }

    /// Issue one request and return the parsed JSON body.
    ///
    /// Fails with [`Error::MissingCredential`] before sending anything when
    /// `requires_key` is set and no key is configured. Non-2xx responses
    /// become [`Error::Api`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        requires_key: bool,
    ) -> Result<Value> {
        if requires_key && self.api_key.is_none() {
            return Err(Error::MissingCredential);
        }

        debug!(%method, path, "rimuhosting request");
        if self.verbose {
            if let Some(b) = &body {
                debug!(path, body = %b, "request body");
            }
        }

        let mut builder = self
            .http
            .request(method, self.url(path))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", Self::auth(key));
        }
        if let Some(b) = &body {
            builder = builder.body(b.to_string());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        debug!(path, status = status.as_u16(), "rimuhosting response");
        if self.verbose {
            debug!(path, body = %text, "response body");
        }

        if !status.is_success() {
            return Err(Error::Api {
                status,
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(Error::Decode)
    }

    async fn get_as<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        requires_key: bool,
    ) -> Result<T> {
        let value = self.send(Method::GET, path, None, requires_key).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    fn order_path(order_oid: u64, domain: &str) -> String {
        format!("/r/orders/order-{order_oid}-{domain}")
    }

    fn require_domain(domain: &str) -> Result<()> {
        if is_valid_domain(domain) {
            Ok(())
        } else {
            Err(Error::InvalidDomain(domain.to_string()))
        }
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// Available distributions. Does not need an API key.
    pub async fn distros(&self) -> Result<Vec<DistroInfo>> {
        let env: DistrosEnvelope = self.get_as("/r/distributions", false).await?;
        let distros = env.get_distros_response.distro_infos;
        let _ = self.distros.set(distros.clone());
        Ok(distros)
    }

    /// Pricing plans. Does not need an API key.
    pub async fn plans(&self) -> Result<Vec<PricingPlan>> {
        let env: PlansEnvelope = self.get_as("/r/pricing-plans", false).await?;
        let plans = env.get_pricing_plans_response.pricing_plan_infos;
        let _ = self.plans.set(plans.clone());
        Ok(plans)
    }

    /// Distinct data centers, from the plans already fetched by this client
    /// or from a fresh plan listing.
    pub async fn data_centers(&self) -> Result<Vec<DataCenter>> {
        if let Some(plans) = self.plans.get() {
            return Ok(data_centers(plans));
        }
        let plans = self.plans().await?;
        Ok(data_centers(&plans))
    }

    /// Distributions already fetched by this client, if any.
    pub fn cached_distros(&self) -> Option<&[DistroInfo]> {
        self.distros.get().map(Vec::as_slice)
    }

    // ── Orders ──────────────────────────────────────────────────────

    pub async fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let env: OrdersEnvelope = self.get_as(&query.to_path(), true).await?;
        Ok(env.get_orders_response.about_orders)
    }

    /// The single active VPS order with `order_oid`.
    pub async fn order_by_oid(&self, order_oid: u64) -> Result<Order> {
        let mut found = self
            .orders(&OrderQuery::active_vps().order_oid(order_oid))
            .await?;
        match found.len() {
            0 => Err(Error::OrderNotFound(order_oid)),
            1 => Ok(found.remove(0)),
            count => Err(Error::DuplicateOrder { order_oid, count }),
        }
    }

    /// Oids of active orders named `domain`. With `ip`, only the order that
    /// also carries that address is returned.
    pub async fn find_order_oids(&self, domain: &str, ip: Option<&str>) -> Result<Vec<u64>> {
        let orders = self.orders(&OrderQuery::default()).await?;
        let named = orders.iter().filter(|o| o.domain_name == domain);

        let oids = match ip {
            Some(ip) => named.filter(|o| o.has_ip(ip)).map(|o| o.order_oid).take(1).collect(),
            None => named.map(|o| o.order_oid).collect(),
        };
        Ok(oids)
    }

    /// Full order record.
    pub async fn info(&self, order_oid: u64, domain: &str) -> Result<Order> {
        let env: OrderEnvelope = self
            .get_as(&Self::order_path(order_oid, domain), true)
            .await?;
        Ok(env.get_order_response.about_order)
    }

    /// Live VPS status (`running_vps_info`).
    pub async fn status(&self, order_oid: u64, domain: &str) -> Result<Value> {
        let path = format!("{}/vps", Self::order_path(order_oid, domain));
        let mut resp = self.send(Method::GET, &path, None, true).await?;
        resp.pointer_mut("/get_vps_status_response/running_vps_info")
            .map(Value::take)
            .ok_or_else(|| {
                Error::UnexpectedResponse("missing get_vps_status_response.running_vps_info".into())
            })
    }

    // ── VPS lifecycle ───────────────────────────────────────────────

    /// Order a new VPS.
    pub async fn create(&self, domain: Option<&str>, spec: &ServerSpec) -> Result<Value> {
        let req = build_request(domain, spec)?;
        let domain = req.instantiation_options.domain_name.clone();
        let body = json!({ "new_order_request": req });

        let resp = self
            .send(Method::POST, "/r/orders/new-vps", Some(body), true)
            .await?;
        info!(%domain, "rimuhosting: vps ordered");
        Ok(resp)
    }

    /// Reinstall an existing VPS from `spec`.
    pub async fn reinstall(
        &self,
        order_oid: u64,
        domain: Option<&str>,
        spec: &ServerSpec,
    ) -> Result<Value> {
        let req = build_request(domain, spec)?;
        let path = format!(
            "{}/vps/reinstall",
            Self::order_path(order_oid, &req.instantiation_options.domain_name)
        );
        let body = json!({ "new_order_request": req });

        let resp = self.send(Method::PUT, &path, Some(body), true).await?;
        info!(order_oid, "rimuhosting: vps reinstalled");
        Ok(resp)
    }

    /// Cancel a VPS.
    pub async fn delete(&self, order_oid: u64, domain: &str) -> Result<Value> {
        Self::require_domain(domain)?;
        let path = format!("{}/vps", Self::order_path(order_oid, domain));

        let resp = self.send(Method::DELETE, &path, None, true).await?;
        info!(order_oid, "rimuhosting: vps deleted");
        Ok(resp)
    }

    pub async fn change_state(
        &self,
        order_oid: u64,
        domain: &str,
        state: RunningState,
    ) -> Result<Value> {
        Self::require_domain(domain)?;
        if state == RunningState::Unknown {
            return Err(Error::InvalidSpec("cannot request an UNKNOWN running state".into()));
        }
        let path = format!("{}/vps/running-state", Self::order_path(order_oid, domain));
        let body = json!({ "running_state_change_request": { "running_state": state } });

        let resp = self.send(Method::PUT, &path, Some(body), true).await?;
        info!(order_oid, %state, "rimuhosting: running state changed");
        Ok(resp)
    }

    pub async fn start(&self, order_oid: u64, domain: &str) -> Result<Value> {
        self.change_state(order_oid, domain, RunningState::Running).await
    }

    pub async fn stop(&self, order_oid: u64, domain: &str) -> Result<Value> {
        self.change_state(order_oid, domain, RunningState::NotRunning).await
    }

    pub async fn reboot(&self, order_oid: u64, domain: &str) -> Result<Value> {
        self.change_state(order_oid, domain, RunningState::Restarting).await
    }

    pub async fn power_cycle(&self, order_oid: u64, domain: &str) -> Result<Value> {
        self.change_state(order_oid, domain, RunningState::PowerCycling).await
    }

    /// Move a VPS to another host server.
    pub async fn move_vps(&self, order_oid: u64, domain: &str, req: &MoveRequest) -> Result<Value> {
        Self::require_domain(domain)?;
        let path = format!("{}/vps/host-server", Self::order_path(order_oid, domain));
        let body = json!({ "vps_move_request": req });

        let resp = self.send(Method::PUT, &path, Some(body), true).await?;
        info!(order_oid, "rimuhosting: vps move requested");
        Ok(resp)
    }
}

/// Best-effort human-readable message from an error body.
///
/// The provider nests `error_info.human_readable_message` either at the top
/// level or inside a single `*_response` envelope. Anything else falls back to
/// the raw text.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    let readable = |v: &Value| {
        v.pointer("/error_info/human_readable_message")
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    readable(&value)
        .or_else(|| value.as_object()?.values().find_map(readable))
        .unwrap_or_else(|| body.to_string())
}
