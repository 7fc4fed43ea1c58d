//! Server configuration.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - TOML configuration file (`--config`, or the first default path found)
//! - Environment variables (`HUDDLE_PORT`, `HUDDLE_METRICS__PORT`, ...)

use anyhow::{Context, Result};
use huddle_core::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config files searched when no path is given.
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "huddle.toml",
    "/etc/huddle/huddle.toml",
    "~/.config/huddle/huddle.toml",
];

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "HUDDLE";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Period of the full-room refresh, in milliseconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,

    /// Drop rooms once their last member disconnects.
    #[serde(default)]
    pub evict_empty_rooms: bool,

    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Path for WebSocket endpoint.
    #[serde(default = "default_ws_path")]
    pub websocket_path: String,
}

/// Resource limits configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum inbound message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4098
}

fn default_refresh_interval() -> u64 {
    10_000 // 10 seconds
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            refresh_interval_ms: default_refresh_interval(),
            evict_empty_rooms: false,
            transport: TransportConfig::default(),
            limits: LimitsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            websocket_path: default_ws_path(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or the first default path
    /// that exists, with environment overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or the merged values do not
    /// form a valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_default_file(),
        };

        let mut builder = config::Config::builder();
        if let Some(file) = &file {
            tracing::info!("Loading configuration from {}", file.display());
            builder = builder.add_source(config::File::from(file.as_path()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let merged = builder.build().context("Failed to read configuration")?;
        let config: Config = merged
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(config)
    }

    fn find_default_file() -> Option<PathBuf> {
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
            .find(|path| path.exists())
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Get the socket address to bind to.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` and `port` do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    /// Period of the full-room refresh.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            evict_empty_rooms: self.evict_empty_rooms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 4098);
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        assert!(!config.evict_empty_rooms);
        assert_eq!(config.transport.websocket_path, "/ws");
    }

    #[test]
    fn test_config_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap().port(), 4098);

        let bad = Config {
            host: "not a host".into(),
            ..Config::default()
        };
        assert!(bad.bind_addr().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            host = "127.0.0.1"
            port = 9000
            refresh_interval_ms = 250
            evict_empty_rooms = true

            [limits]
            max_message_size = 1024
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
        assert!(config.registry_config().evict_empty_rooms);
        assert_eq!(config.limits.max_message_size, 1024);
        assert_eq!(config.metrics.port, 9090);
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!("huddle-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "port = 5000\nrefresh_interval_ms = 500").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.refresh_interval_ms, 500);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = Path::new("/nonexistent/huddle.toml");
        assert!(Config::load(Some(path)).is_err());
    }

    #[test]
    fn test_toml_output_parses_back() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.port, 4098);
    }
}
