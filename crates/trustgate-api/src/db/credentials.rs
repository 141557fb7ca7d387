//! Credential persistence operations.
//!
//! The `credentials` table is append-only; there is no update function.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use trustgate_core::{CredentialId, CredentialRecord, CredentialType, ParticipantId};
use uuid::Uuid;

use crate::repository::RepositoryError;

const COLUMNS: &str = "id, vc_url, vc_json, credential_type, participant_id, created_at";

/// Insert a credential record.
pub async fn insert<'e>(
    exec: impl PgExecutor<'e>,
    c: &CredentialRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO credentials (id, vc_url, vc_json, credential_type, participant_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(c.id.as_uuid())
    .bind(&c.vc_url)
    .bind(&c.vc_json)
    .bind(c.credential_type.as_str())
    .bind(c.participant_id.as_uuid())
    .bind(c.created_at)
    .execute(exec)
    .await?;
    Ok(())
}

/// Fetch a credential by id.
pub async fn get_by_id<'e>(
    exec: impl PgExecutor<'e>,
    id: CredentialId,
) -> Result<Option<CredentialRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, CredentialRow>(&format!(
        "SELECT {COLUMNS} FROM credentials WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(exec)
    .await?;
    row.map(CredentialRow::into_record).transpose()
}

/// Newest credential of a type owned by a participant.
pub async fn latest_for_participant<'e>(
    exec: impl PgExecutor<'e>,
    participant_id: ParticipantId,
    credential_type: CredentialType,
) -> Result<Option<CredentialRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, CredentialRow>(&format!(
        "SELECT {COLUMNS} FROM credentials
         WHERE participant_id = $1 AND credential_type = $2
         ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(participant_id.as_uuid())
    .bind(credential_type.as_str())
    .fetch_optional(exec)
    .await?;
    row.map(CredentialRow::into_record).transpose()
}

/// All credentials of a participant, oldest first.
pub async fn list_for_participant<'e>(
    exec: impl PgExecutor<'e>,
    participant_id: ParticipantId,
) -> Result<Vec<CredentialRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, CredentialRow>(&format!(
        "SELECT {COLUMNS} FROM credentials WHERE participant_id = $1 ORDER BY created_at"
    ))
    .bind(participant_id.as_uuid())
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(CredentialRow::into_record).collect()
}

/// Whether any credential is addressed by `vc_url`.
pub async fn url_exists<'e>(exec: impl PgExecutor<'e>, vc_url: &str) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM credentials WHERE vc_url = $1)")
            .bind(vc_url)
            .fetch_one(exec)
            .await?;
    Ok(exists)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    vc_url: String,
    vc_json: String,
    credential_type: String,
    participant_id: Uuid,
    created_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_record(self) -> Result<CredentialRecord, RepositoryError> {
        let credential_type =
            CredentialType::parse(&self.credential_type).map_err(|e| RepositoryError::CorruptRow {
                table: "credentials",
                reason: e.to_string(),
            })?;
        Ok(CredentialRecord {
            id: CredentialId::from_uuid(self.id),
            vc_url: self.vc_url,
            vc_json: self.vc_json,
            credential_type,
            participant_id: ParticipantId::from_uuid(self.participant_id),
            created_at: self.created_at,
        })
    }
}
