//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SyncConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; filter rules are trust-boundary
//!   settings, so changing them requires a process restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AccessControlConfig, AccessMode, AuthConfig, AuthMode, ListenerConfig, LimitsConfig,
    ObservabilityConfig, PatternFilterConfig, StorageConfig, SyncConfig, TimeoutConfig,
};
