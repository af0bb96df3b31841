//! Metadata tags that mark cluster membership.
//!
//! The provider has no notion of a cluster. A cluster is every active VPS
//! carrying [`CLUSTER_ID_KEY`] with the same value, one of which also carries
//! [`MASTER_KEY`]`=Y`.

use rimu_api::{MetaSearch, OrderQuery};

use crate::{Error, Result};

pub const CLUSTER_ID_KEY: &str = "com.rimuhosting.kclusterid";
pub const MASTER_KEY: &str = "com.rimuhosting.kismaster";
pub const MINION_KEY: &str = "com.rimuhosting.kisminion";

/// Value of the role marker tags.
pub const MARKER: &str = "Y";

/// Placeholder in minion cloud-config replaced by the master's IPv4 address.
pub const MASTER_IP_TOKEN: &str = "$kubernetes_master_ipv4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Minion,
}

impl Role {
    pub fn marker_key(self) -> &'static str {
        match self {
            Self::Master => MASTER_KEY,
            Self::Minion => MINION_KEY,
        }
    }
}

/// Cluster ids end up inside a space-separated search expression, so they
/// must be non-empty and free of whitespace.
pub fn validate_cluster_id(kclusterid: &str) -> Result<()> {
    if kclusterid.is_empty() || kclusterid.chars().any(char::is_whitespace) {
        return Err(Error::InvalidClusterId(kclusterid.to_string()));
    }
    Ok(())
}

/// Active VPS orders holding `role` in cluster `kclusterid`.
pub fn members_query(kclusterid: &str, role: Role) -> OrderQuery {
    OrderQuery::active_vps().meta_search(
        MetaSearch::new()
            .with(CLUSTER_ID_KEY, kclusterid)
            .with(role.marker_key(), MARKER),
    )
}

/// Active VPS masters of any cluster.
pub fn all_masters_query() -> OrderQuery {
    OrderQuery::active_vps().meta_search(
        MetaSearch::new()
            .with_key(CLUSTER_ID_KEY)
            .with(MASTER_KEY, MARKER),
    )
}
