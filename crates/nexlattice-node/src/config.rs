use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_discovery_port() -> u16 {
    nexlattice_transport::DISCOVERY_PORT
}

fn default_message_port() -> u16 {
    nexlattice_transport::MESSAGE_PORT
}

fn default_dashboard_port() -> u16 {
    8080
}

fn default_discovery_interval() -> u64 {
    30
}

fn default_liveness_interval() -> u64 {
    10
}

fn default_stats_interval() -> u64 {
    60
}

/// Node configuration, loaded from JSON. Field names and defaults mirror
/// the original device firmware's `config.json` so an existing deployment
/// carries over unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// This node's unique identifier on the mesh.
    pub node_id: String,
    /// Human-readable name advertised in `DISCOVERY` packets.
    pub node_name: String,
    /// Wi-Fi network name to associate with before starting the mesh.
    pub wifi_ssid: String,
    /// Wi-Fi network password.
    pub wifi_password: String,
    /// Pre-shared key used to derive session keys and sign/verify messages.
    pub shared_key: String,
    /// Host the dashboard HTTP sink listens on.
    pub dashboard_host: String,
    /// Port the dashboard HTTP sink listens on.
    #[serde(default = "default_dashboard_port")]
    pub dashboard_port: u16,
    /// UDP port for `DISCOVERY` broadcast traffic.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// UDP port for point-to-point application traffic.
    #[serde(default = "default_message_port")]
    pub message_port: u16,
    /// Seconds between unsolicited `DISCOVERY` broadcasts.
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_secs: u64,
    /// Seconds between peer liveness sweeps and `PING` probes.
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_secs: u64,
    /// Seconds between dashboard `STATS` reports.
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

/// Errors raised while loading or validating a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file was not valid JSON, or was missing required fields.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A loaded config failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load and validate a config from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON, or
    /// [`ConfigError::Invalid`] if [`Config::validate`] rejects it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_string = path_ref.display().to_string();
        let contents = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_string.clone(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path_string,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants that `serde` alone can't express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first failing field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_id.trim().is_empty() {
            return Err(ConfigError::Invalid("node_id must not be empty".into()));
        }
        if self.shared_key.is_empty() {
            return Err(ConfigError::Invalid("shared_key must not be empty".into()));
        }
        if self.discovery_port == self.message_port {
            return Err(ConfigError::Invalid(
                "discovery_port and message_port must differ".into(),
            ));
        }
        Ok(())
    }
}
