//! # HTTP Server
//!
//! Combines all endpoint routers behind CORS and request tracing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::admin_routes::admin_routes;
use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::observability_routes::health_routes;
use super::state::AppState;
use super::submission_routes::submission_routes;
use crate::observability::Event;

/// HTTP server for the record store API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over the given state
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        Router::new()
            .merge(health_routes())
            .nest("/api/submissions", submission_routes(state.clone()))
            .nest("/api/auth", auth_routes(state.clone()))
            .nest("/api/admin", admin_routes(state))
            .layer(TraceLayer::new_for_http())
            .layer(config.cors_layer())
    }

    /// Configured listen address
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        self.config.bind_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self
            .config
            .bind_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(event = Event::ServerStart.as_str(), %addr, "listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!(event = Event::ServerStop.as_str(), "server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Authenticator;
    use crate::backing_store::InMemoryBlobStore;
    use crate::records::{Namespaces, RecordStore};
    use secrecy::SecretString;

    fn state() -> Arc<AppState> {
        let records = RecordStore::new(
            Arc::new(InMemoryBlobStore::new()),
            SecretString::from("k".to_string()),
            2,
        );
        Arc::new(AppState::new(
            records,
            Authenticator::from_config(None),
            Namespaces::default(),
        ))
    }

    #[test]
    fn test_server_with_custom_port() {
        let config = HttpServerConfig {
            port: 9090,
            ..Default::default()
        };
        let server = HttpServer::new(config, state());
        assert_eq!(server.bind_addr().unwrap(), "0.0.0.0:9090".parse().unwrap());
    }

    #[test]
    fn test_router_builds_with_origin_list() {
        let config = HttpServerConfig {
            cors_origins: vec!["https://example.org".to_string(), "\u{0}bad".to_string()],
            ..Default::default()
        };
        let _router = HttpServer::new(config, state()).router();
    }
}
