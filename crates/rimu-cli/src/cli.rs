//! Command-line surface of `rimu`.
//!
//! Multi-word flags are kebab-case; the underscore spellings are accepted
//! too.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rimu_api::PricingChangeOption;

/// Manage RimuHosting VPS servers and master/minion clusters.
#[derive(Parser)]
#[command(name = "rimu", version, about, long_about = None)]
pub struct Cli {
    /// API key (get one at https://rimuhosting.com/cp/apikeys.jsp)
    #[arg(long, env = "RIMUHOSTING_APIKEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the API base URL
    #[arg(long, env = "RIMUHOSTING_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "RIMUHOSTING_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Show debug logging, including request and response bodies
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the data centers servers can be ordered in
    Datacenters,

    /// List the available distributions
    Distros,

    /// List servers on this account
    Ls {
        /// Include inactive orders
        #[arg(long)]
        all: bool,

        /// Only orders matching this metadata search, e.g. "key:value"
        #[arg(long, alias = "meta_search")]
        meta_search: Option<String>,
    },

    /// Create a VPS, or reinstall one with --reinstall-order-oid
    Mkvm(MkvmArgs),

    /// Live running status of a VPS
    Status(OrderArgs),

    /// Full order record of a VPS
    Info(OrderArgs),

    /// Cancel a VPS
    Delete(OrderArgs),

    /// Start a VPS
    Start(OrderArgs),

    /// Shut down a VPS
    Stop(OrderArgs),

    /// Reboot a VPS
    Reboot(OrderArgs),

    /// Hard power-cycle a VPS
    Powercycle(OrderArgs),

    /// Move a VPS to another host server
    Move(MoveArgs),

    /// Master/minion clusters
    #[command(subcommand)]
    Cluster(ClusterCommands),
}

#[derive(Args)]
pub struct OrderArgs {
    /// Order to act on
    pub order_oid: u64,

    /// Domain of the order; looked up when omitted
    #[arg(long, alias = "domain_name")]
    pub domain_name: Option<String>,
}

#[derive(Args)]
pub struct MkvmArgs {
    /// Server json, flat or in the provider's new-order shape
    #[arg(long, alias = "server_json")]
    pub server_json: Option<PathBuf>,

    /// Cloud-config file; requires a distro that supports it
    #[arg(long, alias = "cloud_config")]
    pub cloud_config: Option<PathBuf>,

    /// Data center, e.g. DCDALLAS, DCFRANKFURT, DCAUCKLAND
    #[arg(long, alias = "dc_location")]
    pub dc_location: Option<String>,

    /// Reinstall this existing VPS instead of ordering a new one
    #[arg(long, alias = "reinstall_order_oid")]
    pub reinstall_order_oid: Option<u64>,

    /// Memory size in MB, overriding the server json
    #[arg(long, alias = "memory_mb")]
    pub memory_mb: Option<u64>,

    /// Disk size in GB, overriding the server json
    #[arg(long, alias = "disk_space_gb")]
    pub disk_space_gb: Option<u64>,

    /// Distro, overriding the server json
    #[arg(long)]
    pub distro: Option<String>,

    /// Domain name, overriding the server json
    #[arg(long, alias = "domain_name")]
    pub domain_name: Option<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    #[command(flatten)]
    pub order: OrderArgs,

    /// Point the domain's DNS at the new address
    #[arg(long, alias = "update_dns")]
    pub update_dns: bool,

    /// Free-text reason recorded with the move
    #[arg(long, default_value = "")]
    pub reason: String,

    #[arg(long, value_enum, default_value_t = PricingArg::Best)]
    pub pricing: PricingArg,

    /// Move onto this specific host server
    #[arg(long, alias = "host_server_oid")]
    pub host_server_oid: Option<u64>,
}

/// How pricing may change when the VPS lands on a different host.
#[derive(Clone, Copy, ValueEnum)]
pub enum PricingArg {
    Best,
    SameResources,
    SamePricing,
}

impl From<PricingArg> for PricingChangeOption {
    fn from(arg: PricingArg) -> Self {
        match arg {
            PricingArg::Best => Self::ChooseBestOption,
            PricingArg::SameResources => Self::ChooseSameResources,
            PricingArg::SamePricing => Self::ChooseSamePricing,
        }
    }
}

#[derive(Subcommand)]
pub enum ClusterCommands {
    /// List cluster masters
    List,

    /// Show the master and minions of one cluster
    Detail {
        #[arg(long)]
        kclusterid: String,
    },

    /// Order (or reinstall) the master of a cluster
    CreateMaster {
        /// Unique id for the cluster, e.g. cluster1
        #[arg(long)]
        kclusterid: String,

        #[arg(long, aliases = ["server_json", "master_server_json", "master-server-json"])]
        server_json: PathBuf,

        #[arg(long, aliases = ["cloud_config", "master_cloud_config", "master-cloud-config"])]
        cloud_config: PathBuf,

        /// Reinstall the existing master instead of ordering one
        #[arg(long)]
        isreinstall: bool,
    },

    /// Order a minion that joins an existing master
    CreateMinion {
        #[arg(long)]
        kclusterid: String,

        #[arg(long, alias = "server_json")]
        server_json: PathBuf,

        /// Cloud-config; $kubernetes_master_ipv4 is replaced by the master IP
        #[arg(long, alias = "cloud_config")]
        cloud_config: PathBuf,

        /// Data center, overriding the server json
        #[arg(long, alias = "dc_location")]
        dc_location: Option<String>,
    },
}
