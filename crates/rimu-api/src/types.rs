use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Orders ──────────────────────────────────────────────────────────

/// A provisioned server as reported by `/r/orders`.
///
/// Only the fields the client interprets are typed; everything else the
/// provider sends is kept in `extra` so printing an order loses nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_oid: u64,
    #[serde(default)]
    pub domain_name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub running_state: Option<RunningState>,
    #[serde(default)]
    pub vps_parameters: Option<VpsParameters>,
    #[serde(default)]
    pub allocated_ips: Option<AllocatedIps>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meta_data: Vec<MetaData>,
    #[serde(default)]
    pub order_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    /// Primary IP, if the provider has allocated one yet.
    pub fn primary_ip(&self) -> Option<&str> {
        self.allocated_ips
            .as_ref()
            .and_then(|ips| ips.primary_ip.as_deref())
            .filter(|ip| !ip.is_empty())
    }

    /// Value of the first metadata tag named `key`.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta_data
            .iter()
            .find(|m| m.key_name == key)
            .map(|m| m.value.as_str())
    }

    /// Whether this order carries `ip` as its primary or a secondary address.
    pub fn has_ip(&self, ip: &str) -> bool {
        self.allocated_ips.as_ref().is_some_and(|ips| {
            ips.primary_ip.as_deref() == Some(ip) || ips.secondary_ips.iter().any(|s| s == ip)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub data_center_location_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpsParameters {
    #[serde(default)]
    pub memory_mb: Option<u64>,
    #[serde(default)]
    pub disk_space_mb: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatedIps {
    #[serde(default)]
    pub primary_ip: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub secondary_ips: Vec<String>,
}

/// A `{key_name, value}` tag attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub key_name: String,
    #[serde(default)]
    pub value: String,
}

impl MetaData {
    pub fn new(key_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            value: value.into(),
        }
    }
}

/// Provider-reported VPS running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunningState {
    Running,
    NotRunning,
    Restarting,
    PowerCycling,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RunningState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::NotRunning => "NOTRUNNING",
            Self::Restarting => "RESTARTING",
            Self::PowerCycling => "POWERCYCLING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RunningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrdersEnvelope {
    pub get_orders_response: OrdersResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrdersResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub about_orders: Vec<Order>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub get_order_response: OrderResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderResponse {
    pub about_order: Order,
}

// ── Summaries ───────────────────────────────────────────────────────

/// Stable, flattened view of an [`Order`] for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_oid: u64,
    pub primary_ip: String,
    pub domain_name: String,
    pub dc_location: String,
    pub running_state: RunningState,
    pub memory_mb: Option<u64>,
    pub order_description: Option<String>,
}

// ── Catalog ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistroInfo {
    pub distro_code: String,
    #[serde(default)]
    pub distro_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPlan {
    #[serde(default)]
    pub pricing_plan_code: Option<String>,
    #[serde(default)]
    pub server_type: Option<String>,
    #[serde(default)]
    pub monthly_pre_tax_pricing: Option<f64>,
    #[serde(default)]
    pub offered_at_data_center: Option<DataCenter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCenter {
    #[serde(default)]
    pub data_center_location_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center_location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center_location_country_2ltr: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DistrosEnvelope {
    pub get_distros_response: DistrosResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DistrosResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub distro_infos: Vec<DistroInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlansEnvelope {
    pub get_pricing_plans_response: PlansResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlansResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pricing_plan_infos: Vec<PricingPlan>,
}

// ── New / reinstall requests ────────────────────────────────────────

/// Body of `POST /r/orders/new-vps` and `PUT .../vps/reinstall`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrderRequest {
    pub instantiation_options: InstantiationOptions,
    pub vps_parameters: VpsParametersRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dc_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Vec<MetaData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_injection_data: Option<Vec<FileInjection>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstantiationOptions {
    pub domain_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_config_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VpsParametersRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_space_mb: Option<u64>,
}

/// A file the provider writes into the guest at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInjection {
    pub data_as_string: String,
    pub path: String,
}

// ── Host moves ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingChangeOption {
    #[default]
    ChooseBestOption,
    ChooseSameResources,
    ChooseSamePricing,
}

/// Body of `PUT .../vps/host-server`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveRequest {
    pub is_update_dns: bool,
    pub move_reason: String,
    pub pricing_change_option: PricingChangeOption,
    pub selected_host_server_oid: Option<u64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
