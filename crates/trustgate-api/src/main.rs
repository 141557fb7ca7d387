//! # trustgate-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the service-offering issuer.
//! Binds to configurable port (default 8080).

use std::sync::Arc;

use trustgate_api::db::{self, PgRepository};
use trustgate_api::issuance::{Collaborators, IssuerConfig};
use trustgate_api::middleware::metrics::ApiMetrics;
use trustgate_api::repository::{DynRepository, MemoryRepository};
use trustgate_api::state::{AppConfig, AppState};
use trustgate_client::{ClientConfig, TrustClient};
use trustgate_core::SeededNameGenerator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();

    let client_config = ClientConfig::from_env().map_err(|e| {
        tracing::error!("Collaborator configuration invalid: {e}");
        e
    })?;
    tracing::info!(?client_config, "collaborators configured");
    let issuer_config = IssuerConfig::from_client_config(&client_config);
    let client = TrustClient::new(client_config)?;

    // Database pool is optional; without it everything stays in memory.
    let db_pool = db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;
    let repository: DynRepository = match &db_pool {
        Some(pool) => Arc::new(PgRepository::new(pool.clone())),
        None => Arc::new(MemoryRepository::new()),
    };

    let metrics = ApiMetrics::new()?;
    let state = AppState::new(
        config.clone(),
        repository,
        Collaborators::from_client(&client),
        Arc::new(SeededNameGenerator::from_entropy()),
        issuer_config,
        metrics,
        db_pool,
    );

    let app = trustgate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Trustgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Structured tracing; JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
