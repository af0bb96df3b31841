use rimu_api::{
    MetaSearch, MoveRequest, OrderQuery, RimuClient, ServerSpec, build_request, summarize,
};
use serde_json::Value;
use tracing::debug;

use super::{load_spec, read_text, to_json};
use crate::cli::{MkvmArgs, MoveArgs, OrderArgs};
use crate::error::{Error, Result};

// ── Catalog ─────────────────────────────────────────────────────────

pub async fn datacenters(client: &RimuClient) -> Result<Value> {
    to_json(&client.data_centers().await?)
}

pub async fn distros(client: &RimuClient) -> Result<Value> {
    to_json(&client.distros().await?)
}

// ── Listing ─────────────────────────────────────────────────────────

#[derive(serde::Serialize)]
struct ServerList {
    servers: Vec<rimu_api::OrderSummary>,
}

pub async fn ls(client: &RimuClient, all: bool, meta_search: Option<&str>) -> Result<Value> {
    let mut query = OrderQuery::active_vps().include_inactive(all);
    if let Some(expr) = meta_search {
        query = query.meta_search(MetaSearch::parse(expr));
    }

    let orders = client.orders(&query).await?;
    to_json(&ServerList {
        servers: orders.iter().map(summarize).collect(),
    })
}

// ── mkvm ────────────────────────────────────────────────────────────

/// Fold the command-line overrides into `spec`. Flags win over the file.
pub fn apply_overrides(
    spec: &mut ServerSpec,
    args: &MkvmArgs,
    cloud_config: Option<String>,
) -> Result<()> {
    if cloud_config.is_some() {
        spec.cloud_config_data = cloud_config;
    }
    if let Some(dc) = &args.dc_location {
        spec.dc_location = Some(dc.clone());
    }
    if let Some(domain) = &args.domain_name {
        spec.domain_name = Some(domain.clone());
    }
    if let Some(mb) = args.memory_mb {
        spec.memory_mb = Some(mb);
    }
    if let Some(gb) = args.disk_space_gb {
        let mb = gb.checked_mul(1024).ok_or_else(|| {
            Error::InvalidArgument(format!("--disk-space-gb {gb} is too large"))
        })?;
        spec.disk_space_mb = Some(mb);
    }
    if let Some(distro) = &args.distro {
        spec.distro = Some(distro.clone());
    }
    Ok(())
}

pub async fn mkvm(client: &RimuClient, args: &MkvmArgs) -> Result<Value> {
    let mut spec = match &args.server_json {
        Some(path) => load_spec(path)?,
        None => ServerSpec::default(),
    };
    let cloud_config = args.cloud_config.as_deref().map(read_text).transpose()?;
    apply_overrides(&mut spec, args, cloud_config)?;

    if let Some(order_oid) = args.reinstall_order_oid {
        if spec.domain_name.is_some() {
            build_request(None, &spec)?;
        }
        let existing = client.order_by_oid(order_oid).await?;
        debug!(order_oid, domain = %existing.domain_name, "mkvm: reinstalling");

        // keep the server's current name unless one was given
        let domain = spec
            .domain_name
            .is_none()
            .then_some(existing.domain_name.as_str());
        return Ok(client.reinstall(existing.order_oid, domain, &spec).await?);
    }

    Ok(client.create(None, &spec).await?)
}

// ── Single-order actions ────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Action {
    Status,
    Info,
    Delete,
    Start,
    Stop,
    Reboot,
    PowerCycle,
}

async fn resolve_domain(client: &RimuClient, args: &OrderArgs) -> Result<String> {
    match &args.domain_name {
        Some(domain) => Ok(domain.clone()),
        None => Ok(client.order_by_oid(args.order_oid).await?.domain_name),
    }
}

pub async fn order_action(client: &RimuClient, action: Action, args: &OrderArgs) -> Result<Value> {
    let domain = resolve_domain(client, args).await?;
    let oid = args.order_oid;

    let resp = match action {
        Action::Status => client.status(oid, &domain).await?,
        Action::Info => return to_json(&client.info(oid, &domain).await?),
        Action::Delete => client.delete(oid, &domain).await?,
        Action::Start => client.start(oid, &domain).await?,
        Action::Stop => client.stop(oid, &domain).await?,
        Action::Reboot => client.reboot(oid, &domain).await?,
        Action::PowerCycle => client.power_cycle(oid, &domain).await?,
    };
    Ok(resp)
}

pub async fn move_vps(client: &RimuClient, args: &MoveArgs) -> Result<Value> {
    let domain = resolve_domain(client, &args.order).await?;
    let req = MoveRequest {
        is_update_dns: args.update_dns,
        move_reason: args.reason.clone(),
        pricing_change_option: args.pricing.into(),
        selected_host_server_oid: args.host_server_oid,
    };
    Ok(client.move_vps(args.order.order_oid, &domain, &req).await?)
}
