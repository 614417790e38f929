//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce structured tracing events
//!     → logging.rs (subscriber setup, level from config)
//!     → stdout
//!
//! Per-request log lines come from http::middleware::logging.
//! ```

pub mod logging;
