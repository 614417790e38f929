//! Local-network form preset synchronization service.
//!
//! Lets multiple browser instances and devices share named, scoped
//! form presets over the local network, without a cloud account. The
//! service stores opaque field blobs, partitions ownership by device
//! identifier, and keeps an append-only sync log of every mutation.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │               PRESET SYNC SERVICE            │
//!                    │                                              │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌──────────┐  │
//!   ─────────────────┼─▶│   net   │──▶│   http   │──▶│ handlers │  │
//!                    │  │listener │   │ pipeline │   │          │  │
//!                    │  └─────────┘   └────┬─────┘   └────┬─────┘  │
//!                    │                     │              │        │
//!                    │                     ▼              ▼        │
//!                    │               ┌──────────┐   ┌──────────┐   │
//!   Client Response  │               │  filter  │   │  store   │   │
//!   ◀────────────────┼───────────────│ (origin, │   │ (SQLite, │   │
//!                    │               │ pattern) │   │ sync log)│   │
//!                    │               └──────────┘   └──────────┘   │
//!                    │                                             │
//!                    │  ┌───────────────────────────────────────┐  │
//!                    │  │          Cross-Cutting Concerns       │  │
//!                    │  │  config  │ observability │ lifecycle  │  │
//!                    │  └───────────────────────────────────────┘  │
//!                    └─────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod net;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::SyncConfig;
pub use error::ServiceError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::PresetStore;
