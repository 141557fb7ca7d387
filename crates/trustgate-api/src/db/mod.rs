//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the API
//! persists participants, credentials, offerings and their links to
//! PostgreSQL through [`PgRepository`]. When absent, the API runs on the
//! in-memory [`crate::repository::MemoryRepository`] (development and
//! testing).
//!
//! An issuance batch is written in one transaction: credentials first, then
//! the offering, its standard links and its label/level link.

pub mod credentials;
pub mod master_data;
pub mod offerings;
pub mod participants;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use trustgate_core::{
    CredentialId, CredentialRecord, CredentialType, Did, LabelLevelLink, OfferingId, Participant,
    ParticipantId, ServiceOffer, StandardType,
};

use crate::repository::{IssuanceBatch, OfferingFilter, OfferingRepository, Page, RepositoryError};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 Issued offerings will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// [`OfferingRepository`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Wrap a connected pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferingRepository for PgRepository {
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, RepositoryError> {
        participants::get_by_id(&self.pool, id).await
    }

    async fn participant_by_did(&self, did: &Did) -> Result<Option<Participant>, RepositoryError> {
        participants::get_by_did(&self.pool, did).await
    }

    async fn latest_credential(
        &self,
        participant_id: ParticipantId,
        credential_type: CredentialType,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        credentials::latest_for_participant(&self.pool, participant_id, credential_type).await
    }

    async fn credential(
        &self,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        credentials::get_by_id(&self.pool, id).await
    }

    async fn credentials_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<CredentialRecord>, RepositoryError> {
        credentials::list_for_participant(&self.pool, participant_id).await
    }

    async fn credential_url_exists(&self, vc_url: &str) -> Result<bool, RepositoryError> {
        Ok(credentials::url_exists(&self.pool, vc_url).await?)
    }

    async fn commit(&self, batch: IssuanceBatch) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(p) = &batch.participant {
            participants::upsert(&mut *tx, p).await?;
        }
        for c in &batch.credentials {
            credentials::insert(&mut *tx, c).await?;
        }
        if let Some(o) = &batch.offering {
            offerings::insert(&mut *tx, o).await?;
            for standard_id in &o.standard_ids {
                offerings::insert_standard(&mut *tx, o.id, *standard_id).await?;
            }
        }
        if let Some(link) = &batch.label_level_link {
            offerings::insert_label_level_link(&mut *tx, link).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn offering(&self, id: OfferingId) -> Result<Option<ServiceOffer>, RepositoryError> {
        Ok(offerings::get_by_id(&self.pool, id).await?)
    }

    async fn set_message_reference(
        &self,
        id: OfferingId,
        reference: &str,
    ) -> Result<bool, RepositoryError> {
        let now = chrono::Utc::now();
        Ok(offerings::update_message_reference(&self.pool, id, reference, now).await?)
    }

    async fn filter_offerings(
        &self,
        filter: &OfferingFilter,
    ) -> Result<Page<ServiceOffer>, RepositoryError> {
        Ok(offerings::filter(&self.pool, filter).await?)
    }

    async fn label_level_link(
        &self,
        offering_id: OfferingId,
    ) -> Result<Option<LabelLevelLink>, RepositoryError> {
        Ok(offerings::get_label_level_link(&self.pool, offering_id).await?)
    }

    async fn standards_by_type(
        &self,
        names: &[String],
    ) -> Result<Vec<StandardType>, RepositoryError> {
        Ok(master_data::standards_by_type(&self.pool, names).await?)
    }

    async fn subdivision_names(&self, codes: &[String]) -> Result<Vec<String>, RepositoryError> {
        Ok(master_data::subdivision_names(&self.pool, codes).await?)
    }
}
