//! Access-control and pattern filtering subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     config ranges  → origin.rs  (compile IpNet sets)
//!     rule files     → pattern.rs (compile regex sets)
//!
//! Per request:
//!     peer address   → origin.rs  → allow / 403
//!     scope value    → pattern.rs → allow / 403
//! ```
//!
//! # Design Decisions
//! - Both filters are compiled once and immutable for the process
//!   lifetime; handlers hold them behind Arc with no locking
//! - Tests construct isolated instances with their own rule sets

pub mod origin;
pub mod pattern;

pub use origin::OriginFilter;
pub use pattern::{PatternError, PatternFilter};
