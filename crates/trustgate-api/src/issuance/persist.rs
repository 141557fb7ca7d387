//! Credential records for issued artifacts.
//!
//! Records are append-only: each call builds a new record with a fresh id
//! and stages it in the request's [`IssuanceBatch`]. Nothing is written
//! until the batch commits.

use serde_json::Value;
use trustgate_core::{CredentialRecord, CredentialType, ParticipantId};

use super::IssuanceError;
use crate::repository::IssuanceBatch;

/// Stage a credential record for `document` hosted at `vc_url`.
pub fn persist(
    batch: &mut IssuanceBatch,
    document: &Value,
    vc_url: &str,
    credential_type: CredentialType,
    participant_id: ParticipantId,
) -> Result<CredentialRecord, IssuanceError> {
    let raw = serde_json::to_string(document).map_err(|e| {
        IssuanceError::Invariant(format!("{credential_type} document is not serializable: {e}"))
    })?;
    let record = CredentialRecord::new(vc_url, raw, credential_type, participant_id);
    batch.stage_credential(record.clone());
    tracing::debug!(%vc_url, %credential_type, "credential staged");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_call_stages_a_new_record() {
        let mut batch = IssuanceBatch::new();
        let pid = ParticipantId::new();
        let doc = json!({"v": 1});
        let url = "https://h/a.json";
        let a = persist(&mut batch, &doc, url, CredentialType::ServiceOffer, pid).unwrap();
        let b = persist(&mut batch, &doc, url, CredentialType::ServiceOffer, pid).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(batch.credentials.len(), 2);
        assert_eq!(a.vc_json, r#"{"v":1}"#);
    }
}
