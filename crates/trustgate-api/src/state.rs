//! # Application State
//!
//! Shared state for the Axum application: configuration, the repository,
//! the issuance pipeline, the read side and metrics.

use std::sync::Arc;

use sqlx::PgPool;
use trustgate_core::NameGenerator;

use crate::issuance::query::OfferingQuery;
use crate::issuance::{Collaborators, IssuerConfig, ServiceOfferIssuer};
use crate::middleware::metrics::ApiMetrics;
use crate::repository::DynRepository;

// -- Application State --------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl AppConfig {
    /// Read `PORT` (default 8080).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { port }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,

    /// Persistence, in memory or Postgres.
    pub repository: DynRepository,

    // -- Pipeline --
    pub issuer: Arc<ServiceOfferIssuer>,
    pub query: Arc<OfferingQuery>,

    pub metrics: ApiMetrics,

    /// Postgres pool, when `DATABASE_URL` is set. Used by the readiness
    /// check; all reads and writes go through `repository`.
    pub db_pool: Option<PgPool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("issuer", &self.issuer)
            .field("metrics", &self.metrics)
            .field("db_pool", &self.db_pool.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the pipeline over `repository` and `collaborators`.
    pub fn new(
        config: AppConfig,
        repository: DynRepository,
        collaborators: Collaborators,
        names: Arc<dyn NameGenerator>,
        issuer_config: IssuerConfig,
        metrics: ApiMetrics,
        db_pool: Option<PgPool>,
    ) -> Self {
        let query = OfferingQuery::new(
            Arc::clone(&repository),
            Arc::clone(&collaborators.fetcher),
        );
        let issuer = ServiceOfferIssuer::new(
            Arc::clone(&repository),
            collaborators,
            names,
            issuer_config,
            metrics.clone(),
        );
        Self {
            config,
            repository,
            issuer: Arc::new(issuer),
            query: Arc::new(query),
            metrics,
            db_pool,
        }
    }
}
