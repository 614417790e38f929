//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Open store → Compile filters → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store/filters, listener last
//! - Shutdown has a bounded grace period: forced exit after deadline

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
