use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rimu_api::{ClientConfig, DEFAULT_BASE_URL};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{Error, Result};

/// Name of the per-user settings file in the home directory.
pub const SETTINGS_FILE: &str = ".rimuhosting";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub debug: bool,
}

impl AppConfig {
    /// Resolve settings once at startup.
    ///
    /// Flags and their environment variables are already folded together by
    /// clap; the settings file is only consulted for a missing API key.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let api_key = match cli.api_key.clone().filter(|k| !k.is_empty()) {
            Some(key) => Some(key),
            None => match settings_path() {
                Some(path) => key_from_file(&path)?,
                None => None,
            },
        };

        Ok(Self {
            api_key,
            base_url: cli
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: cli.timeout_secs.map(Duration::from_secs),
            debug: cli.debug,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            verbose: self.debug,
            timeout: self.timeout,
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(SETTINGS_FILE))
}

/// The `apikey` entry of the settings file at `path`. A missing file is not
/// an error.
fn key_from_file(path: &Path) -> Result<Option<String>> {
    let settings_error = |source| Error::Settings {
        path: path.to_path_buf(),
        source,
    };

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(None),
        Err(e) => return Err(settings_error(e)),
    };

    debug!(path = %path.display(), "config: read settings file");
    settings_key(entries).map_err(settings_error)
}

/// Last non-empty `apikey` in a stream of `key = value` lines.
fn settings_key<R: Read>(entries: dotenvy::Iter<R>) -> dotenvy::Result<Option<String>> {
    let mut key = None;
    for entry in entries {
        let (name, value) = entry?;
        if name == "apikey" && !value.is_empty() {
            key = Some(value);
        }
    }
    Ok(key)
}
