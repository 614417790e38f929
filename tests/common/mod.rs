//! Shared harness for integration tests.
//!
//! Spins up a real service instance on an ephemeral port with an
//! isolated on-disk store, then lets tests drive it with reqwest.

use std::path::PathBuf;

use preset_sync::config::SyncConfig;
use preset_sync::filter::{OriginFilter, PatternFilter};
use preset_sync::http::HttpServer;
use preset_sync::lifecycle::Shutdown;
use preset_sync::net::bind_with_fallback;
use preset_sync::store::PresetStore;

pub struct TestService {
    pub base_url: String,
    /// SQLite file backing this instance; tests may open it directly.
    #[allow(dead_code)]
    pub db_path: PathBuf,
    shutdown: Shutdown,
    _dir: tempfile::TempDir,
}

impl TestService {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a service with the default config, mutated by the caller.
/// The listener port is ephemeral and the store lives in a temp dir.
pub async fn spawn_service(configure: impl FnOnce(&mut SyncConfig)) -> TestService {
    let dir = tempfile::tempdir().unwrap();

    let mut config = SyncConfig::default();
    config.listener.port = 0;
    config.listener.fallback_ports = Vec::new();
    config.storage.path = dir.path().join("presets.db");
    config.observability.request_logging = false;
    configure(&mut config);

    let store = PresetStore::open(&config.storage.path).unwrap();
    let origin = OriginFilter::from_config(&config.access_control);
    let patterns = PatternFilter::from_config(&config.pattern_filter).unwrap();

    let listener = bind_with_fallback(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(&config, store, origin, patterns);
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestService {
        base_url: format!("http://{addr}"),
        db_path: config.storage.path.clone(),
        shutdown,
        _dir: dir,
    }
}

/// Client that never routes loopback traffic through a proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Minimal valid preset body for the given device.
#[allow(dead_code)]
pub fn preset_body(name: &str, device_id: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "scope_type": "domain",
        "scope_value": "example.com",
        "device_id": device_id,
        "fields": {"user": "a"},
        "encrypted": false,
    })
}
