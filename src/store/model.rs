//! Stored record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a preset applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// Exact page URL.
    Url,
    /// Whole domain.
    Domain,
    /// Every site.
    Global,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Url => "url",
            ScopeType::Domain => "domain",
            ScopeType::Global => "global",
        }
    }
}

impl std::str::FromStr for ScopeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(ScopeType::Url),
            "domain" => Ok(ScopeType::Domain),
            "global" => Ok(ScopeType::Global),
            other => Err(format!("unknown scope type '{other}'")),
        }
    }
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, scoped bundle of form-field data. The `fields` blob is
/// opaque to the service; `encrypted` only describes its semantics to
/// clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub scope_type: ScopeType,
    pub scope_value: String,
    pub fields: serde_json::Value,
    pub encrypted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub use_count: i64,
    /// Owning device. Empty string means unscoped/shared.
    pub device_id: String,
    pub metadata: Option<serde_json::Value>,
}

/// Client-supplied input for a save. Server-assigned attributes
/// (timestamps, use counter) are filled in by the store.
#[derive(Debug, Clone)]
pub struct NewPreset {
    /// Identifier; assigned when absent.
    pub id: Option<String>,
    pub name: String,
    pub scope_type: ScopeType,
    pub scope_value: String,
    pub fields: serde_json::Value,
    pub encrypted: bool,
    pub device_id: String,
    pub metadata: Option<serde_json::Value>,
}

/// Action recorded in the sync log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Save,
    Delete,
    Use,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Save => "save",
            SyncAction::Delete => "delete",
            SyncAction::Use => "use",
        }
    }
}

impl std::str::FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save" => Ok(SyncAction::Save),
            "delete" => Ok(SyncAction::Delete),
            "use" => Ok(SyncAction::Use),
            other => Err(format!("unknown sync action '{other}'")),
        }
    }
}

/// Append-only audit record of a mutating store operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub seq: i64,
    pub preset_id: String,
    pub action: SyncAction,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
}
