use std::collections::HashSet;

use rimu_api::{Order, OrderSummary, ServerSpec, build_request, summarize};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::tags::{self, CLUSTER_ID_KEY, MARKER, MASTER_IP_TOKEN, Role, validate_cluster_id};
use crate::{Error, OrderApi, Result};

/// Fixed choices applied to every cluster member.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Distro forced onto masters and minions.
    pub distro: String,
    pub master_domain: String,
    pub minion_domain: String,
    /// Upper bound on `$kubernetes_master_ipv4` replacements per cloud-config.
    pub substitution_limit: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            distro: "coreos.64".into(),
            master_domain: "coreosmaster.localhost".into(),
            minion_domain: "coreosminion.localhost".into(),
            substitution_limit: 99,
        }
    }
}

/// Where a cluster is in its lifecycle, as far as the provider shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterPhase {
    Nonexistent,
    /// Master ordered but no primary IP allocated yet.
    MasterProvisioning,
    MasterReady,
}

impl ClusterPhase {
    fn of(master: Option<&Order>) -> Self {
        match master {
            None => Self::Nonexistent,
            Some(m) if m.primary_ip().is_none() => Self::MasterProvisioning,
            Some(_) => Self::MasterReady,
        }
    }
}

/// An order summary plus the cluster it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub kclusterid: String,
    #[serde(flatten)]
    pub order: OrderSummary,
}

impl MemberSummary {
    fn of(order: &Order) -> Self {
        Self {
            kclusterid: order.meta_value(CLUSTER_ID_KEY).unwrap_or_default().to_string(),
            order: summarize(order),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterDetail {
    pub kclusterid: String,
    pub phase: ClusterPhase,
    pub master: Option<MemberSummary>,
    pub minions: Vec<MemberSummary>,
}

/// Creates and inspects master/minion clusters.
///
/// Every operation re-reads membership from the provider. "Find the master,
/// then act" is not atomic: two callers racing on the same cluster id can
/// both create a master, after which lookups fail with
/// [`Error::AmbiguousCluster`] until one is deleted.
pub struct ClusterCoordinator<A> {
    api: A,
    config: ClusterConfig,
}

impl<A: OrderApi> ClusterCoordinator<A> {
    pub fn new(api: A, config: ClusterConfig) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// The one master of `kclusterid`, or `None` if the cluster does not
    /// exist yet. More than one master is an error, never a pick.
    pub async fn find_master(&self, kclusterid: &str) -> Result<Option<Order>> {
        validate_cluster_id(kclusterid)?;

        let mut masters = self
            .api
            .orders(&tags::members_query(kclusterid, Role::Master))
            .await?;
        debug!(kclusterid, count = masters.len(), "cluster: master lookup");

        match masters.len() {
            0 => Ok(None),
            1 => Ok(masters.pop()),
            count => Err(Error::AmbiguousCluster {
                kclusterid: kclusterid.to_string(),
                count,
            }),
        }
    }

    pub async fn phase(&self, kclusterid: &str) -> Result<ClusterPhase> {
        let master = self.find_master(kclusterid).await?;
        Ok(ClusterPhase::of(master.as_ref()))
    }

    /// Order the master VPS of a new cluster.
    ///
    /// With `reinstall` set this is [`Self::reinstall_master`]. Otherwise an
    /// existing master for `kclusterid` fails with [`Error::AlreadyExists`].
    /// `cloud_config` is used only when `spec` has no `cloud_config_data`.
    pub async fn create_master(
        &self,
        kclusterid: &str,
        spec: ServerSpec,
        cloud_config: Option<&str>,
        reinstall: bool,
    ) -> Result<Value> {
        if reinstall {
            return self.reinstall_master(kclusterid, spec, cloud_config).await;
        }

        let spec = self.prepare(kclusterid, spec, Role::Master, cloud_config)?;

        if let Some(existing) = self.find_master(kclusterid).await? {
            return Err(Error::AlreadyExists {
                kclusterid: kclusterid.to_string(),
                order_oid: existing.order_oid,
            });
        }

        let resp = self.api.create(None, &spec).await?;
        info!(kclusterid, "cluster: master ordered");
        Ok(resp)
    }

    /// Reinstall the existing master of `kclusterid` from `spec`.
    ///
    /// The master keeps its domain unless `spec` names one.
    pub async fn reinstall_master(
        &self,
        kclusterid: &str,
        spec: ServerSpec,
        cloud_config: Option<&str>,
    ) -> Result<Value> {
        let keep_name = spec.domain_name.is_none();
        let spec = self.prepare(kclusterid, spec, Role::Master, cloud_config)?;

        let master = self
            .find_master(kclusterid)
            .await?
            .ok_or_else(|| Error::NotFound(kclusterid.to_string()))?;

        // without an explicit domain the master keeps its current name
        let domain = keep_name.then_some(master.domain_name.as_str());
        let resp = self.api.reinstall(master.order_oid, domain, &spec).await?;
        info!(kclusterid, order_oid = master.order_oid, "cluster: master reinstalled");
        Ok(resp)
    }

    /// Order a minion that joins the master of `kclusterid`.
    ///
    /// The master must exist and already have a primary IP; that IP replaces
    /// `$kubernetes_master_ipv4` in the minion's cloud-config.
    pub async fn create_minion(
        &self,
        kclusterid: &str,
        spec: ServerSpec,
        cloud_config: Option<&str>,
    ) -> Result<Value> {
        let mut spec = self.prepare(kclusterid, spec, Role::Minion, cloud_config)?;

        let master = self
            .find_master(kclusterid)
            .await?
            .ok_or_else(|| Error::NotFound(kclusterid.to_string()))?;
        let ip = master.primary_ip().ok_or_else(|| Error::MasterNotReady {
            kclusterid: kclusterid.to_string(),
            order_oid: master.order_oid,
        })?;

        if let Some(cc) = spec.cloud_config_data.as_mut() {
            *cc = substitute_master_ip(cc, ip, self.config.substitution_limit);
        }

        let resp = self.api.create(None, &spec).await?;
        info!(kclusterid, master_ip = ip, "cluster: minion ordered");
        Ok(resp)
    }

    /// Every active cluster master, one per cluster.
    pub async fn list_clusters(&self) -> Result<Vec<MemberSummary>> {
        let masters = self.api.orders(&tags::all_masters_query()).await?;
        let summaries: Vec<_> = masters.iter().map(MemberSummary::of).collect();

        let mut seen = HashSet::new();
        for s in &summaries {
            if !seen.insert(s.kclusterid.as_str()) {
                warn!(kclusterid = %s.kclusterid, "cluster: more than one master");
            }
        }
        Ok(summaries)
    }

    /// The master (if any) and active minions of `kclusterid`.
    pub async fn cluster_detail(&self, kclusterid: &str) -> Result<ClusterDetail> {
        let master = self.find_master(kclusterid).await?;
        let minions = self
            .api
            .orders(&tags::members_query(kclusterid, Role::Minion))
            .await?;

        Ok(ClusterDetail {
            kclusterid: kclusterid.to_string(),
            phase: ClusterPhase::of(master.as_ref()),
            master: master.as_ref().map(MemberSummary::of),
            minions: minions.iter().map(MemberSummary::of).collect(),
        })
    }

    /// Apply the cluster conventions to `spec` and validate it. Makes no
    /// provider calls.
    fn prepare(
        &self,
        kclusterid: &str,
        mut spec: ServerSpec,
        role: Role,
        cloud_config: Option<&str>,
    ) -> Result<ServerSpec> {
        validate_cluster_id(kclusterid)?;
        if spec.has_meta(CLUSTER_ID_KEY) {
            return Err(Error::TagConflict(CLUSTER_ID_KEY));
        }

        spec.distro = Some(self.config.distro.clone());
        if spec.domain_name.is_none() {
            spec.domain_name = Some(match role {
                Role::Master => self.config.master_domain.clone(),
                Role::Minion => self.config.minion_domain.clone(),
            });
        }
        if spec.cloud_config_data.is_none() {
            spec.cloud_config_data = cloud_config.map(str::to_string);
        }
        spec.push_meta(CLUSTER_ID_KEY, kclusterid);
        spec.push_meta(role.marker_key(), MARKER);

        build_request(None, &spec)?;
        Ok(spec)
    }
}

/// Replace up to `limit` occurrences of the master IP placeholder.
pub fn substitute_master_ip(cloud_config: &str, ip: &str, limit: usize) -> String {
    cloud_config.replacen(MASTER_IP_TOKEN, ip, limit)
}
