use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::is_valid_domain;
use crate::types::{
    FileInjection, InstantiationOptions, MetaData, NewOrderRequest, VpsParametersRequest,
};
use crate::{Error, Result};

/// Guest path the `ssh_pub_key` option is written to.
pub const AUTHORIZED_KEYS_PATH: &str = "/root/.ssh/authorized_keys";

/// Flat set of optional inputs for creating or reinstalling a server.
///
/// Which sub-object of the provider request each field lands in is decided by
/// [`build_request`], not by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_config_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_space_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dc_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Vec<MetaData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_injection_data: Option<Vec<FileInjection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_pub_key: Option<String>,
}

impl ServerSpec {
    /// Read a spec from server JSON.
    ///
    /// Accepts both a flat object and the provider's own request shape, where
    /// options sit under `instantiation_options` and `vps_parameters`. A
    /// top-level key wins over the same key in a nested object. Unrecognised
    /// keys are ignored.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(Error::InvalidSpec("server json must be an object".into()));
        };

        let mut flat = Map::new();
        for section in ["instantiation_options", "vps_parameters"] {
            if let Some(Value::Object(nested)) = root.remove(section) {
                flat.extend(nested);
            }
        }
        flat.extend(root);

        // nulls mean "not set", same as a missing key
        flat.retain(|_, v| !v.is_null());

        serde_json::from_value(Value::Object(flat)).map_err(Error::Decode)
    }

    /// Append a metadata tag, creating the list if needed.
    pub fn push_meta(&mut self, key_name: impl Into<String>, value: impl Into<String>) {
        self.meta_data
            .get_or_insert_with(Vec::new)
            .push(MetaData::new(key_name, value));
    }

    /// Whether any tag named `key_name` is already present.
    pub fn has_meta(&self, key_name: &str) -> bool {
        self.meta_data
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|m| m.key_name == key_name))
    }
}

/// Assemble a provider request from `spec`.
///
/// `explicit_domain` takes precedence over `spec.domain_name`. The domain is
/// validated here; a missing domain is rejected like an empty one.
///
/// `ssh_pub_key`, when set, replaces `file_injection_data` with a single
/// `authorized_keys` entry rather than adding to it.
pub fn build_request(explicit_domain: Option<&str>, spec: &ServerSpec) -> Result<NewOrderRequest> {
    let domain = explicit_domain
        .or(spec.domain_name.as_deref())
        .unwrap_or_default();
    if !is_valid_domain(domain) {
        return Err(Error::InvalidDomain(domain.to_string()));
    }

    let file_injection_data = match &spec.ssh_pub_key {
        Some(key) => Some(vec![FileInjection {
            data_as_string: key.clone(),
            path: AUTHORIZED_KEYS_PATH.to_string(),
        }]),
        None => spec.file_injection_data.clone(),
    };

    Ok(NewOrderRequest {
        instantiation_options: InstantiationOptions {
            domain_name: domain.to_string(),
            password: spec.password.clone(),
            distro: spec.distro.clone(),
            control_panel: spec.control_panel.clone(),
            cloud_config_data: spec.cloud_config_data.clone(),
        },
        vps_parameters: VpsParametersRequest {
            memory_mb: spec.memory_mb,
            disk_space_mb: spec.disk_space_mb,
        },
        dc_location: spec.dc_location.clone(),
        meta_data: spec.meta_data.clone(),
        file_injection_data,
    })
}
