//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, values, panics, errors)
//! - Serve on a listener until shutdown is signalled

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::callbacks::CallbackStore;
use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::middleware::{errors, install_hook, panics, values_middleware, RequestIdPolicy};

/// Application state injected into handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub callbacks: CallbackStore,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let router = build_router(&config, AppState::default());
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// The service's routes with the full middleware stack.
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/callbacks", post(handlers::create_callback))
        .route(
            "/v1/callbacks/{id}",
            get(handlers::get_callback).delete(handlers::delete_callback),
        )
        .with_state(state);

    with_middleware(routes, config)
}

/// Wrap `router` in the service middleware stack.
///
/// Outermost first: trace, timeout, values/logger, panics, errors.
#[allow(deprecated)]
pub fn with_middleware(router: Router, config: &ServiceConfig) -> Router {
    install_hook();

    let policy = RequestIdPolicy {
        trust_header: config.web.trust_request_id,
    };

    router
        .layer(middleware::from_fn(errors))
        .layer(middleware::from_fn(panics))
        .layer(middleware::from_fn_with_state(policy, values_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(TraceLayer::new_for_http())
}
