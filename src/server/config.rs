//! Server configuration types

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Progress stream tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Server-side WebSocket ping interval
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Idle timeout before a session is considered dead. Kept generously
    /// above the client keep-alive interval so transient hiccups do not
    /// trigger false disconnects.
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_heartbeat_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_timeout_above_ping() {
        let config = ProgressConfig::default();
        assert!(config.heartbeat_timeout_secs > config.ping_interval_secs);
    }

    #[test]
    fn test_empty_toml_deserializes_to_defaults() {
        let config: AppConfig = toml_from_str("");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.progress.heartbeat_timeout_secs, 60);
    }

    fn toml_from_str(s: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}
