//! Network-origin check, the first gate after request logging.
//!
//! Runs for every route, `/health` included. A rejected caller never
//! reaches authentication or a handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::filter::OriginFilter;
use crate::http::response;

pub async fn origin_filter_middleware(
    State(filter): State<Arc<OriginFilter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if filter.is_ip_allowed(addr.ip()) {
        next.run(req).await
    } else {
        tracing::warn!(caller = %addr, path = %req.uri().path(), "Origin rejected");
        response::error(StatusCode::FORBIDDEN, "origin not allowed")
    }
}
