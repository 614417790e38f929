//! Response envelope and error mapping.
//!
//! Every response body follows the wire contract
//! `{ success, data?, error?, message? }`. Store and handler errors map
//! onto it through `IntoResponse` for `ServiceError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ServiceError;

/// Standard JSON envelope for every route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 200 with a data payload.
pub fn ok<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, Some(data), None, None)
}

/// 201 with the stored record.
pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, Some(data), None, None)
}

/// 200 with a human-readable message and no payload.
pub fn message(text: impl Into<String>) -> Response {
    envelope::<()>(StatusCode::OK, None, None, Some(text.into()))
}

/// Error envelope with an explicit status; used by middleware that
/// rejects before any handler runs.
pub fn error(status: StatusCode, error: impl Into<String>) -> Response {
    envelope::<()>(status, None, Some(error.into()), None)
}

fn envelope<T: Serialize>(
    status: StatusCode,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
) -> Response {
    let body = ApiResponse {
        success: status.is_success(),
        data,
        error,
        message,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, text) = match &self {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "authentication required".to_string())
            }
            ServiceError::Filtered => (
                StatusCode::FORBIDDEN,
                "request rejected by filter rules".to_string(),
            ),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "preset not found".to_string()),
            ServiceError::Storage(e) => {
                // Detail stays server-side; the client gets a generic error.
                tracing::error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
            ServiceError::Serialization(e) => {
                tracing::error!(error = %e, "Serialization failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
        };
        error(status, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_map_to_contract_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServiceError::Filtered, StatusCode::FORBIDDEN),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                ServiceError::Storage(rusqlite::Error::InvalidQuery),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let body = ApiResponse::<()> {
            success: true,
            data: None,
            error: None,
            message: Some("ok".into()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "ok"}));
    }
}
