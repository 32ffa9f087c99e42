//! HTTP server for the imoveis API.

pub mod handlers;

pub use handlers::AppState;

use crate::db::ConnectionProvider;
use crate::error::{ApiError, ApiResult};
use axum::Router;
use axum::routing::{delete, get, put};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/imoveis",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route("/imoveis/{id}", get(handlers::get_property))
        .route("/imoveis/tipo/{tipo}", get(handlers::get_properties_by_tipo))
        .route(
            "/imoveis/cidade/{cidade}",
            get(handlers::get_properties_by_cidade),
        )
        .route(
            "/imoveis/atualiza/{id}/{coluna}/{alteracao}",
            put(handlers::update_property),
        )
        .route("/imoveis/delete/{id}", delete(handlers::delete_property))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server bound to one address.
pub struct HttpServer {
    provider: Arc<ConnectionProvider>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
}

impl HttpServer {
    pub fn new(provider: Arc<ConnectionProvider>, host: impl Into<String>, port: u16) -> Self {
        Self {
            provider,
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until SIGINT or SIGTERM, then let in-flight requests finish.
    pub async fn run(&self) -> ApiResult<()> {
        let bind_addr = self.bind_addr();
        let app = router(AppState::new(Arc::clone(&self.provider)));

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            ApiError::internal(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        info!(
            addr = %bind_addr,
            db_type = %self.provider.db_type(),
            target_db = %self.provider.target(),
            "Listening for requests"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_signal())
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server error");
                ApiError::internal(format!("HTTP server error: {}", e))
            })?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn provider() -> Arc<ConnectionProvider> {
        Arc::new(ConnectionProvider::from_config(&DatabaseConfig::default()).unwrap())
    }

    #[test]
    fn test_http_server_bind_addr() {
        let server = HttpServer::new(provider(), "0.0.0.0", 3000);
        assert_eq!(server.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(AppState::new(provider()));
    }
}
