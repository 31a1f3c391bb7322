//! Application-level configuration loading: data location, series defaults and autosave timing.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    services::autosave,
    state::document::{DEFAULT_BEST_OF, GlobalSettings},
};

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RPS_LEDGER_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration.
pub struct AppConfig {
    /// Directory holding the game document.
    pub data_dir: PathBuf,
    /// Series length of new games when the document is created from scratch.
    pub default_best_of: u32,
    /// Period of the autosave task.
    pub autosave_interval: Duration,
    /// How long shutdown waits for the final save.
    pub shutdown_grace: Duration,
}

impl AppConfig {
    /// Load the configuration from the resolved path, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration from `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => match raw.validate() {
                    Ok(()) => {
                        let config: Self = raw.into();
                        info!(
                            path = %path.display(),
                            data_dir = %config.data_dir.display(),
                            "loaded configuration"
                        );
                        config
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "invalid config values; falling back to defaults"
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Settings for a freshly created document.
    pub fn default_settings(&self) -> GlobalSettings {
        GlobalSettings::with_best_of(self.default_best_of)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    data_dir: PathBuf,
    #[validate(range(min = 1))]
    default_best_of: u32,
    #[validate(range(min = 1))]
    autosave_interval_ms: u64,
    shutdown_grace_ms: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            default_best_of: DEFAULT_BEST_OF,
            autosave_interval_ms: autosave::DEFAULT_PERIOD.as_millis() as u64,
            shutdown_grace_ms: autosave::DEFAULT_GRACE.as_millis() as u64,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            data_dir: value.data_dir,
            default_best_of: value.default_best_of,
            autosave_interval: Duration::from_millis(value.autosave_interval_ms),
            shutdown_grace: Duration::from_millis(value.shutdown_grace_ms),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
