//! Master/minion clusters on top of plain RimuHosting VPS orders.
//!
//! Membership lives entirely in order metadata (see [`tags`]) and is
//! re-derived from a provider query on every call.

pub mod coordinator;
pub mod tags;

use async_trait::async_trait;
use rimu_api::{Order, OrderQuery, RimuClient, ServerSpec};
use serde_json::Value;

pub use coordinator::{ClusterConfig, ClusterCoordinator, ClusterDetail, ClusterPhase, MemberSummary};
pub use tags::Role;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] rimu_api::Error),

    #[error("cluster {kclusterid} already exists (master order {order_oid}); delete it, pick a new id, or reinstall it")]
    AlreadyExists { kclusterid: String, order_oid: u64 },

    #[error("found {count} masters for cluster {kclusterid}")]
    AmbiguousCluster { kclusterid: String, count: usize },

    #[error("master of cluster {kclusterid} (order {order_oid}) has no primary ip yet")]
    MasterNotReady { kclusterid: String, order_oid: u64 },

    #[error("no master found for cluster {0}; create the master first")]
    NotFound(String),

    #[error("invalid cluster id: {0:?}")]
    InvalidClusterId(String),

    #[error("server json already carries a {0} tag; pass the cluster id on the command line instead")]
    TagConflict(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The slice of the provider API the coordinator needs.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn orders(&self, query: &OrderQuery) -> rimu_api::Result<Vec<Order>>;

    async fn create(&self, domain: Option<&str>, spec: &ServerSpec) -> rimu_api::Result<Value>;

    async fn reinstall(
        &self,
        order_oid: u64,
        domain: Option<&str>,
        spec: &ServerSpec,
    ) -> rimu_api::Result<Value>;
}

#[async_trait]
impl OrderApi for RimuClient {
    async fn orders(&self, query: &OrderQuery) -> rimu_api::Result<Vec<Order>> {
        RimuClient::orders(self, query).await
    }

    async fn create(&self, domain: Option<&str>, spec: &ServerSpec) -> rimu_api::Result<Value> {
        RimuClient::create(self, domain, spec).await
    }

    async fn reinstall(
        &self,
        order_oid: u64,
        domain: Option<&str>,
        spec: &ServerSpec,
    ) -> rimu_api::Result<Value> {
        RimuClient::reinstall(self, order_oid, domain, spec).await
    }
}
