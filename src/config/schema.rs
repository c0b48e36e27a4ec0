//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (or absent) config file works.

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for the daemon.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DaemonConfig {
    /// Status listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Status listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:7600").
    pub bind_address: String,

    /// Maximum concurrent status connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7600".to_string(),
            max_connections: 64,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level filter when VIGIL_LOG is not set.
    pub level: String,

    /// Log file path. When unset, logs go to stderr and SIGHUP-driven
    /// log rolling has nothing to reopen.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
