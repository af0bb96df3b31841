pub mod cluster;
pub mod servers;

use std::path::Path;

use rimu_api::ServerSpec;
use serde_json::Value;

use crate::error::{Error, Result};

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a server json file into a spec.
pub(crate) fn load_spec(path: &Path) -> Result<ServerSpec> {
    let value: Value = serde_json::from_str(&read_text(path)?).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ServerSpec::from_json(value)?)
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(Error::Output)
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::PathBuf;

    /// Write `contents` to a fresh file under the temp dir.
    pub fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("rimu-cli-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }
}
