//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! sync service. All types derive Serde traits for deserialization from
//! config files. Every section has a working default so the service can
//! start with an empty file (localhost, no auth, no filtering).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the preset sync service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Listener configuration (bind host/port, fallbacks).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Network-origin access control.
    pub access_control: AccessControlConfig,

    /// Scope-value pattern filtering.
    pub pattern_filter: PatternFilterConfig,

    /// Preset storage settings.
    pub storage: StorageConfig,

    /// Request authentication settings.
    pub auth: AuthConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Request size limits.
    pub limits: LimitsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "127.0.0.1").
    pub host: String,

    /// Preferred port.
    pub port: u16,

    /// Ports tried in order when the preferred one is occupied.
    pub fallback_ports: Vec<u16>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            fallback_ports: vec![8766, 8767, 8768],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout (read + handle + write) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// How the origin filter treats caller addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// No origin filtering.
    #[default]
    AllowAll,
    /// Only addresses inside `allow_ranges` pass (default-deny).
    Whitelist,
    /// Addresses inside `deny_ranges` are rejected (default-allow).
    Blacklist,
}

/// Network-origin access control configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Which set, if any, is consulted.
    pub mode: AccessMode,

    /// CIDR ranges or bare addresses allowed in whitelist mode.
    pub allow_ranges: Vec<String>,

    /// CIDR ranges or bare addresses rejected in blacklist mode.
    pub deny_ranges: Vec<String>,
}

/// Scope-value pattern filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PatternFilterConfig {
    /// Enable pattern filtering of client-supplied scope values.
    pub enabled: bool,

    /// Line-oriented allow-pattern rule file.
    pub allow_file: Option<PathBuf>,

    /// Line-oriented deny-pattern rule file.
    pub deny_file: Option<PathBuf>,

    /// When set, an allow-pattern match beats any deny-pattern match,
    /// and a non-empty allow set becomes exhaustive.
    pub whitelist_overrides_blacklist: bool,
}

/// Preset storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. ":memory:" keeps everything in RAM.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("presets.db"),
        }
    }
}

/// Authentication mode for the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No authentication. The default for localhost-only deployments.
    #[default]
    None,
    /// Shared token via header or query parameter.
    Token,
    /// Username/password via HTTP Basic.
    Basic,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Selected mode.
    pub mode: AuthMode,

    /// Shared token (token mode).
    pub token: String,

    /// Expected username (basic mode).
    pub username: String,

    /// Expected password (basic mode).
    pub password: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit one structured log line per request.
    pub request_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            request_logging: true,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}
