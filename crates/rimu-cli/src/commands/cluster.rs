use rimu_cluster::{ClusterCoordinator, MemberSummary, OrderApi};
use serde::Serialize;
use serde_json::Value;

use super::{load_spec, read_text, to_json};
use crate::cli::ClusterCommands;
use crate::error::Result;

#[derive(Serialize)]
struct ClusterList {
    cluster_masters: Vec<MemberSummary>,
}

pub async fn run<A: OrderApi>(
    coordinator: &ClusterCoordinator<A>,
    command: &ClusterCommands,
) -> Result<Value> {
    match command {
        ClusterCommands::List => to_json(&ClusterList {
            cluster_masters: coordinator.list_clusters().await?,
        }),

        ClusterCommands::Detail { kclusterid } => {
            to_json(&coordinator.cluster_detail(kclusterid).await?)
        }

        ClusterCommands::CreateMaster {
            kclusterid,
            server_json,
            cloud_config,
            isreinstall,
        } => {
            let spec = load_spec(server_json)?;
            let cloud_config = read_text(cloud_config)?;
            Ok(coordinator
                .create_master(kclusterid, spec, Some(&cloud_config), *isreinstall)
                .await?)
        }

        ClusterCommands::CreateMinion {
            kclusterid,
            server_json,
            cloud_config,
            dc_location,
        } => {
            let mut spec = load_spec(server_json)?;
            if let Some(dc) = dc_location {
                spec.dc_location = Some(dc.clone());
            }
            let cloud_config = read_text(cloud_config)?;
            Ok(coordinator
                .create_minion(kclusterid, spec, Some(&cloud_config))
                .await?)
        }
    }
}
