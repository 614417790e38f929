//! Service-wide error type.
//!
//! One taxonomy shared by the store, the filters, and the HTTP layer.
//! The mapping onto status codes lives in `http::response`; internal
//! detail for storage and serialization failures never reaches the
//! client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or incomplete request input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or wrong credentials.
    #[error("authentication required")]
    Unauthorized,

    /// Rejected by the origin or pattern filter.
    #[error("request rejected by filter rules")]
    Filtered,

    /// Preset absent, or owned by a different device. The two cases
    /// are deliberately indistinguishable.
    #[error("preset not found")]
    NotFound,

    /// Underlying SQLite failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Field-blob or metadata (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
