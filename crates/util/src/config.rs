//! Configuration for the Orca CLI.
//!
//! Settings are read from a small JSON file in the standard configuration
//! directory (`~/.config/orca/config.json` on most platforms) and then
//! overridden by environment variables. A missing file yields defaults; a
//! malformed one is reported with a warning and ignored.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "ORCA_CONFIG_PATH";
/// Environment variable overriding the backend base URL.
pub const API_BASE_ENV: &str = "ORCA_API_BASE";
/// Environment variable supplying the bearer token.
pub const API_TOKEN_ENV: &str = "ORCA_API_TOKEN";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_BASE_URL: &str = "http://localhost:7007";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_EXECUTE_ROUTE: &str = "/orchestrator/workflows/:workflowId/execute";

/// Error surfaced when reading the configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure other than a missing file.
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A value that cannot be used, such as a zero poll interval.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrcaConfig {
    /// Base URL of the backend hosting the orchestrator and permission APIs.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Delay between poll cycles while an instance is in flight.
    pub poll_interval_ms: u64,
    /// Client-side route used to rerun a workflow.
    pub execute_route: String,
}

impl Default for OrcaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            execute_route: DEFAULT_EXECUTE_ROUTE.to_string(),
        }
    }
}

impl OrcaConfig {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    /// Load from an explicit path and apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = load_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), base_url = %config.base_url, "loaded configuration");
        Ok(config)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(base_url) = non_empty_env(API_BASE_ENV) {
            self.base_url = base_url;
        }
        if let Some(token) = non_empty_env(API_TOKEN_ENV) {
            self.token = Some(token);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if !self.execute_route.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "execute_route",
                reason: format!("'{}' must start with '/'", self.execute_route),
            });
        }
        Ok(())
    }
}

/// Resolves the config file path, honoring [`CONFIG_PATH_ENV`].
pub fn default_config_path() -> PathBuf {
    if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orca")
        .join(CONFIG_FILE_NAME)
}

fn load_file(path: &Path) -> Result<OrcaConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse config file; using defaults"
                );
                Ok(OrcaConfig::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(OrcaConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest),
        None if path == "~" => home_dir().unwrap_or_else(|| PathBuf::from("~")),
        None => PathBuf::from(path),
    }
}
