//! Participant persistence operations.
//!
//! Functions take any Postgres executor so they run inside the issuance
//! transaction or directly on the pool.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use trustgate_core::{Did, Participant, ParticipantId};
use uuid::Uuid;

use crate::repository::RepositoryError;

/// Insert a participant, or update its mutable flags if it exists.
pub async fn upsert<'e>(exec: impl PgExecutor<'e>, p: &Participant) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO participants (id, did, legal_name, key_stored, own_did_solution, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO UPDATE
         SET legal_name = EXCLUDED.legal_name,
             key_stored = EXCLUDED.key_stored,
             own_did_solution = EXCLUDED.own_did_solution",
    )
    .bind(p.id.as_uuid())
    .bind(p.did.as_str())
    .bind(&p.legal_name)
    .bind(p.key_stored)
    .bind(p.own_did_solution)
    .bind(p.created_at)
    .execute(exec)
    .await?;
    Ok(())
}

/// Fetch a participant by id.
pub async fn get_by_id<'e>(
    exec: impl PgExecutor<'e>,
    id: ParticipantId,
) -> Result<Option<Participant>, RepositoryError> {
    let row = sqlx::query_as::<_, ParticipantRow>(
        "SELECT id, did, legal_name, key_stored, own_did_solution, created_at
         FROM participants WHERE id = $1",
    )
    .bind(id.as_uuid())
    .fetch_optional(exec)
    .await?;
    row.map(ParticipantRow::into_record).transpose()
}

/// Fetch a participant by DID.
pub async fn get_by_did<'e>(
    exec: impl PgExecutor<'e>,
    did: &Did,
) -> Result<Option<Participant>, RepositoryError> {
    let row = sqlx::query_as::<_, ParticipantRow>(
        "SELECT id, did, legal_name, key_stored, own_did_solution, created_at
         FROM participants WHERE did = $1",
    )
    .bind(did.as_str())
    .fetch_optional(exec)
    .await?;
    row.map(ParticipantRow::into_record).transpose()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ParticipantRow {
    id: Uuid,
    did: String,
    legal_name: String,
    key_stored: bool,
    own_did_solution: bool,
    created_at: DateTime<Utc>,
}

impl ParticipantRow {
    fn into_record(self) -> Result<Participant, RepositoryError> {
        let did = Did::new(self.did).map_err(|e| RepositoryError::CorruptRow {
            table: "participants",
            reason: e.to_string(),
        })?;
        Ok(Participant {
            id: ParticipantId::from_uuid(self.id),
            did,
            legal_name: self.legal_name,
            key_stored: self.key_stored,
            own_did_solution: self.own_did_solution,
            created_at: self.created_at,
        })
    }
}
