//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the explicit route table
//! - Wire up the request pipeline (logging → origin → auth → handler)
//! - Apply timeout and body-size layers
//! - Serve with graceful drain on shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::SyncConfig;
use crate::filter::{OriginFilter, PatternFilter};
use crate::http::handlers;
use crate::http::middleware::{auth_middleware, origin_filter_middleware, request_log_middleware};
use crate::store::PresetStore;

/// Application state injected into handlers.
///
/// The store is internally synchronized; the pattern filter is
/// immutable after startup. Nothing here needs request-level locking.
#[derive(Clone)]
pub struct AppState {
    pub store: PresetStore,
    pub patterns: Arc<PatternFilter>,
}

/// HTTP server for the preset sync service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble the router and pipeline from pre-built components.
    ///
    /// The filters arrive already compiled: constructing them is a
    /// startup concern (and fatal on failure), not a serving concern.
    pub fn new(
        config: &SyncConfig,
        store: PresetStore,
        origin: OriginFilter,
        patterns: PatternFilter,
    ) -> Self {
        let state = AppState {
            store,
            patterns: Arc::new(patterns),
        };
        let router = Self::build_router(config, state, Arc::new(origin));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &SyncConfig, state: AppState, origin: Arc<OriginFilter>) -> Router {
        let auth = Arc::new(config.auth.clone());

        // Explicit (method, path) → handler table; path parameters are
        // extracted by axum, scope values travel as query parameters.
        Router::new()
            .route("/health", get(handlers::health))
            .route("/presets", get(handlers::list_presets).post(handlers::create_preset))
            .route(
                "/presets/{id}",
                get(handlers::get_preset)
                    .put(handlers::update_preset)
                    .delete(handlers::delete_preset),
            )
            .route("/presets/{id}/usage", post(handlers::record_usage))
            .route("/presets/scope/{scope_type}", get(handlers::get_presets_by_scope))
            .route("/devices", get(handlers::list_devices))
            .route("/sync/log", get(handlers::recent_sync_log))
            .route("/sync/log/{id}", get(handlers::preset_sync_log))
            .route("/sync/status", get(handlers::sync_status))
            .route("/sync/cleanup", post(handlers::cleanup))
            .fallback(handlers::not_found)
            .with_state(state)
            // Layer order is inside-out: auth runs after the origin
            // check, request logging wraps everything.
            .layer(from_fn_with_state(auth, auth_middleware))
            .layer(from_fn_with_state(origin, origin_filter_middleware))
            .layer(from_fn_with_state(
                config.observability.request_logging,
                request_log_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
