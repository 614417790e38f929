//! Request authentication.
//!
//! Supports a shared-token mode (token via `X-Auth-Token` header,
//! `Authorization: Bearer`, or `?token=` query parameter) and a
//! basic-credential mode. Disabled entirely is the default for
//! localhost-only deployments. `/health` bypasses authentication but
//! not the origin filter, which runs earlier.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::Engine;

use crate::config::schema::{AuthConfig, AuthMode};
use crate::http::response;

pub async fn auth_middleware(
    State(config): State<Arc<AuthConfig>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if config.mode == AuthMode::None || req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let authorized = match config.mode {
        AuthMode::None => true,
        AuthMode::Token => token_matches(&req, &config.token),
        AuthMode::Basic => basic_matches(&req, &config.username, &config.password),
    };

    if authorized {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), mode = ?config.mode, "Authentication failed");
        response::error(StatusCode::UNAUTHORIZED, "authentication required")
    }
}

fn token_matches(req: &Request<Body>, expected: &str) -> bool {
    if let Some(token) = header_str(req, "x-auth-token") {
        return token == expected;
    }
    if let Some(value) = header_str(req, "authorization") {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return token == expected;
        }
    }
    query_param(req, "token").is_some_and(|token| token == expected)
}

fn basic_matches(req: &Request<Body>, username: &str, password: &str) -> bool {
    let Some(value) = header_str(req, "authorization") else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };
    match credentials.split_once(':') {
        Some((user, pass)) => user == username && pass == password,
        None => false,
    }
}

fn header_str<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn query_param<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
    req.uri().query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn token_accepted_from_all_three_carriers() {
        assert!(token_matches(
            &request("/presets", &[("X-Auth-Token", "s3cret")]),
            "s3cret"
        ));
        assert!(token_matches(
            &request("/presets", &[("Authorization", "Bearer s3cret")]),
            "s3cret"
        ));
        assert!(token_matches(&request("/presets?token=s3cret", &[]), "s3cret"));
    }

    #[test]
    fn wrong_or_missing_token_is_rejected() {
        assert!(!token_matches(
            &request("/presets", &[("X-Auth-Token", "wrong")]),
            "s3cret"
        ));
        assert!(!token_matches(&request("/presets", &[]), "s3cret"));
    }

    #[test]
    fn basic_credentials_are_decoded_and_compared() {
        // "alice:open sesame"
        let encoded = base64::engine::general_purpose::STANDARD.encode("alice:open sesame");
        let header = format!("Basic {encoded}");
        assert!(basic_matches(
            &request("/presets", &[("Authorization", header.as_str())]),
            "alice",
            "open sesame"
        ));
        assert!(!basic_matches(
            &request("/presets", &[("Authorization", header.as_str())]),
            "alice",
            "different"
        ));
        assert!(!basic_matches(
            &request("/presets", &[("Authorization", "Basic not-base64!!!")]),
            "alice",
            "open sesame"
        ));
    }
}
