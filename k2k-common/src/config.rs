//! Configuration loading and config file resolution
//!
//! Bootstrap settings for the viewer, read once at startup:
//! 1. Command-line arguments (highest priority, applied by the binary)
//! 2. Environment variables (`K2K_CONFIG`, `K2K_SERVER_URL`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error: the viewer logs a warning and
//! runs on defaults.

use crate::events::RenderOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "K2K_CONFIG";

/// Upper bound for any configured delay
const MAX_DELAY_MS: u64 = 10_000;

/// Complete viewer configuration as stored in TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tracking server connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Polling loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between calibration status polls
    #[serde(default = "default_calibration_delay_ms")]
    pub calibration_delay_ms: u64,

    /// Delay between tracking polls (0 = poll as fast as the server answers)
    #[serde(default)]
    pub tracking_interval_ms: u64,

    /// Stop the session after this many consecutive poll failures
    ///
    /// Unset means report every failure and keep polling.
    #[serde(default)]
    pub max_consecutive_failures: Option<u32>,

    /// Give up calibrating after this long (unset = wait forever)
    #[serde(default)]
    pub calibration_timeout_ms: Option<u64>,

    /// Stop tracking after this long (unset = track until stopped)
    #[serde(default)]
    pub tracking_timeout_ms: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            calibration_delay_ms: default_calibration_delay_ms(),
            tracking_interval_ms: 0,
            max_consecutive_failures: None,
            calibration_timeout_ms: None,
            tracking_timeout_ms: None,
        }
    }
}

impl PollingConfig {
    pub fn calibration_delay(&self) -> Duration {
        Duration::from_millis(self.calibration_delay_ms)
    }

    pub fn tracking_interval(&self) -> Duration {
        Duration::from_millis(self.tracking_interval_ms)
    }

    pub fn calibration_timeout(&self) -> Option<Duration> {
        self.calibration_timeout_ms.map(Duration::from_millis)
    }

    pub fn tracking_timeout(&self) -> Option<Duration> {
        self.tracking_timeout_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_calibration_delay_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given and present, else fall back to defaults
    ///
    /// A file that exists but cannot be parsed is still an error; only a
    /// missing file degrades to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => {
                info!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(Error::Config("server.url must not be empty".to_string()));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(Error::Config(
                "server.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.polling.calibration_delay_ms > MAX_DELAY_MS {
            return Err(Error::Config(format!(
                "polling.calibration_delay_ms must be at most {}",
                MAX_DELAY_MS
            )));
        }
        if self.polling.tracking_interval_ms > MAX_DELAY_MS {
            return Err(Error::Config(format!(
                "polling.tracking_interval_ms must be at most {}",
                MAX_DELAY_MS
            )));
        }
        if self.polling.max_consecutive_failures == Some(0) {
            return Err(Error::Config(
                "polling.max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pick the config file to read
///
/// Priority: CLI argument, then `K2K_CONFIG`, then the per-user default
/// location (only if it exists).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Per-user default config location: `<config_dir>/k2k/viewer.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("k2k").join("viewer.toml"))
}
