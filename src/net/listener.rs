//! Listener binding with port fallback.
//!
//! # Responsibilities
//! - Bind the configured host/port
//! - Walk the fallback ports in order when the preferred one is taken
//! - Fail fatally only when nothing binds

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The host did not parse as an address.
    InvalidHost(String),
    /// Every configured port failed; carries the last bind error.
    Bind(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidHost(host) => write!(f, "Invalid listener host '{}'", host),
            ListenerError::Bind(e) => write!(f, "Failed to bind any configured port: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind the preferred port, falling back through the configured list.
///
/// Returns the first listener that binds. The actual port may differ
/// from the preferred one; callers read it from `local_addr()`.
pub async fn bind_with_fallback(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let ip: std::net::IpAddr = config
        .host
        .parse()
        .map_err(|_| ListenerError::InvalidHost(config.host.clone()))?;

    let mut last_err = None;
    for (attempt, port) in std::iter::once(config.port)
        .chain(config.fallback_ports.iter().copied())
        .enumerate()
    {
        let addr = SocketAddr::new(ip, port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if attempt > 0 {
                    tracing::warn!(
                        preferred = config.port,
                        bound = port,
                        "Preferred port occupied, using fallback"
                    );
                }
                return Ok(listener);
            }
            Err(e) => {
                tracing::debug!(port, error = %e, "Port unavailable");
                last_err = Some(e);
            }
        }
    }

    Err(ListenerError::Bind(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no ports configured")
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16, fallbacks: Vec<u16>) -> ListenerConfig {
        ListenerConfig {
            host: "127.0.0.1".to_string(),
            port,
            fallback_ports: fallbacks,
        }
    }

    #[tokio::test]
    async fn binds_preferred_port_when_free() {
        let listener = bind_with_fallback(&config(0, vec![])).await.unwrap();
        assert_eq!(listener.local_addr().unwrap().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn falls_back_when_preferred_is_taken() {
        // Occupy a concrete port first.
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken = occupied.local_addr().unwrap().port();

        let listener = bind_with_fallback(&config(taken, vec![0])).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), taken);
    }

    #[tokio::test]
    async fn fails_when_no_port_binds() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken = occupied.local_addr().unwrap().port();

        let result = bind_with_fallback(&config(taken, vec![taken])).await;
        assert!(matches!(result, Err(ListenerError::Bind(_))));
    }

    #[tokio::test]
    async fn bad_host_is_rejected() {
        let mut cfg = config(0, vec![]);
        cfg.host = "not-a-host".to_string();
        assert!(matches!(
            bind_with_fallback(&cfg).await,
            Err(ListenerError::InvalidHost(_))
        ));
    }
}
