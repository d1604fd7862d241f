//! frest demo server.
//!
//! Serves the sample API with request validation, reply normalization and
//! generated OpenAPI documentation.

use frest::config::Config;
use frest::logging;
use tokio::net::TcpListener;

mod api;

use crate::api::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting frest v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        docs_enabled = %config.docs.enabled,
        "Configuration loaded"
    );

    let app = build_router(&config.docs);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    if config.docs.enabled {
        tracing::info!("Swagger UI available at http://{}{}/", addr, config.docs.ui_path);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
