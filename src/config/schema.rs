//! Configuration schema definitions.
//!
//! This module defines the configuration structure consumed at startup.
//! All types derive Serde traits for deserialization from config files.
//!
//! Required fields deserialize to empty strings when absent so that
//! validation can report every missing field in one pass instead of
//! stopping at the first serde error.

use serde::{Deserialize, Serialize};

/// Root configuration for the chat service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Process-wide settings.
    pub global: GlobalConfig,

    /// Logger settings.
    pub log: LogConfig,

    /// Listening servers.
    pub servers: ServersConfig,
}

impl Config {
    /// Whether the process runs in production mode (`global.env = "prod"`).
    pub fn is_production(&self) -> bool {
        self.global.env == ENV_PROD
    }
}

/// Environment name that switches the logger to JSON output.
pub const ENV_PROD: &str = "prod";

/// Accepted values of `global.env`.
pub const ENVIRONMENTS: [&str; 3] = ["dev", "stage", ENV_PROD];

/// Global configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Deployment environment (`dev`, `stage` or `prod`).
    pub env: String,
}

/// Logger configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Initial severity threshold (debug, info, warn, error).
    pub level: String,
}

/// Server configurations.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServersConfig {
    /// Debug/introspection server.
    pub debug: DebugServerConfig,
}

/// Debug server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DebugServerConfig {
    /// Listen address in `host:port` form (e.g. "localhost:8079").
    pub addr: String,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for DebugServerConfig {
    fn default() -> Self {
        Self {
            addr: String::new(),
            shutdown_timeout_secs: 3,
            request_timeout_secs: 60,
        }
    }
}
