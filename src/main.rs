//! imoveis API - Main entry point.
//!
//! Serves read, update, delete and create routes over the `imoveis` table.

use clap::Parser;
use imoveis_api::config::Config;
use imoveis_api::db::ConnectionProvider;
use imoveis_api::http::HttpServer;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the environment may already be set
    dotenvy::dotenv().ok();

    let config = Config::parse();
    init_tracing(&config);

    info!("Starting imoveis API v{}", env!("CARGO_PKG_VERSION"));

    let provider = Arc::new(ConnectionProvider::from_config(&config.database)?);
    info!(
        db_type = %provider.db_type(),
        target_db = %provider.target(),
        tls = config.database.ssl_ca_path.is_some(),
        "Database configured (one connection per request)"
    );

    let server = HttpServer::new(provider, &config.http_host, config.http_port);
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
