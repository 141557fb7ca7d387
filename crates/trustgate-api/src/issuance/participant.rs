//! Participant and signing-key resolution for an issuance request.
//!
//! A request names its participant either by id (registered participants)
//! or by the URL of a legal-participant self-description. In the second
//! case the participant is looked up by DID and registered on first use.
//! The signing key comes from the secret store when one is stored there,
//! otherwise from the request, which may ask for it to be stored.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use trustgate_client::{DocumentFetcher, SecretStore, SigningContext, PRIVATE_KEY_ENTRY};
use trustgate_core::document::find_subject_of_type;
use trustgate_core::{
    vocab, CredentialType, Did, DocumentType, Participant, ParticipantId, SubjectKind,
};
use zeroize::Zeroizing;

use super::{persist, resolver, IssuanceError};
use crate::repository::{DynRepository, IssuanceBatch};

pub(crate) const PARTICIPANT_NOT_FOUND: &str = "participant.not.found";
pub(crate) const PARTICIPANT_URL_NOT_FOUND: &str = "participant.url.not.found";
pub(crate) const PRIVATE_KEY_NOT_FOUND: &str = "private.key.not.found";
pub(crate) const INVALID_DID: &str = "invalid.did";

/// Key material supplied with the request.
#[derive(Default)]
pub struct KeyMaterial {
    /// Verification method URI.
    pub verification_method: Option<String>,
    /// PKCS#8 private key.
    pub private_key: Option<Zeroizing<String>>,
    /// Store the key in the secret store for later requests.
    pub store_vault: bool,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("verification_method", &self.verification_method)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("store_vault", &self.store_vault)
            .finish()
    }
}

/// A registered participant, as found.
///
/// # Errors
///
/// [`IssuanceError::NotFound`] `participant.not.found` for an unknown id;
/// [`IssuanceError::BadData`] `participant.url.not.found` when its stored
/// self-description no longer resolves.
pub async fn registered(
    repository: &DynRepository,
    fetcher: &Arc<dyn DocumentFetcher>,
    participant_id: ParticipantId,
) -> Result<Participant, IssuanceError> {
    let participant = repository
        .participant(participant_id)
        .await?
        .ok_or_else(|| IssuanceError::NotFound(PARTICIPANT_NOT_FOUND.into()))?;

    let credential = repository
        .latest_credential(participant_id, CredentialType::LegalParticipant)
        .await?
        .ok_or_else(|| IssuanceError::BadData(PARTICIPANT_URL_NOT_FOUND.into()))?;
    resolver::resolve(
        fetcher,
        std::slice::from_ref(&credential.vc_url),
        PARTICIPANT_URL_NOT_FOUND,
        None,
    )
    .await?;

    Ok(participant)
}

/// The issuer DID of a legal-participant document: the credential
/// `issuer` (string or `{id}`), else the subject id.
fn issuer_did(document: &Value, subject: &Value) -> Option<String> {
    let from_issuer = trustgate_core::document::credentials(document)
        .into_iter()
        .find_map(|vc| match vc.get(vocab::ISSUER) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(o)) => o.get(vocab::ID).and_then(Value::as_str).map(str::to_string),
            _ => None,
        });
    from_issuer.or_else(|| {
        subject
            .get(vocab::ID)
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

/// The participant described at `participant_json_url`, registering it in
/// `batch` when it is new.
pub async fn from_document(
    repository: &DynRepository,
    fetcher: &Arc<dyn DocumentFetcher>,
    participant_json_url: Option<&str>,
    own_did_solution: bool,
    batch: &mut IssuanceBatch,
) -> Result<Participant, IssuanceError> {
    let url = participant_json_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| IssuanceError::BadData(PARTICIPANT_URL_NOT_FOUND.into()))?;

    let document = fetcher.fetch_json(url).await.map_err(|e| {
        tracing::warn!(%url, error = %e, "participant document did not resolve");
        IssuanceError::BadData(PARTICIPANT_URL_NOT_FOUND.into())
    })?;

    let subject = find_subject_of_type(&document, DocumentType::LegalParticipant)
        .ok_or_else(|| IssuanceError::BadData(PARTICIPANT_NOT_FOUND.into()))?;
    let legal_name = SubjectKind::Participant.name_of(subject).unwrap_or_default();
    let did = issuer_did(&document, subject)
        .ok_or_else(|| IssuanceError::BadData(INVALID_DID.into()))?;
    let did = Did::new(did).map_err(|_| IssuanceError::BadData(INVALID_DID.into()))?;

    if let Some(existing) = repository.participant_by_did(&did).await? {
        return Ok(existing);
    }

    let participant = Participant::new(did, legal_name, own_did_solution);
    persist::persist(
        batch,
        &document,
        url,
        CredentialType::LegalParticipant,
        participant.id,
    )?;
    batch.participant = Some(participant.clone());
    tracing::info!(
        participant_id = %participant.id,
        did = %participant.did,
        "participant registered"
    );
    Ok(participant)
}

/// Build the signing context, moving the key into the secret store when
/// requested. Marks the participant `key_stored` and stages it in `batch`
/// after an upload.
pub async fn signing_context(
    vault: &dyn SecretStore,
    participant: &mut Participant,
    keys: KeyMaterial,
    batch: &mut IssuanceBatch,
) -> Result<SigningContext, IssuanceError> {
    if participant.key_stored {
        let mut secrets = vault
            .get(participant.id)
            .await
            .map_err(|e| IssuanceError::upstream("secret store", e))?;
        let private_key = secrets
            .remove(PRIVATE_KEY_ENTRY)
            .ok_or_else(|| IssuanceError::BadData(PRIVATE_KEY_NOT_FOUND.into()))?;
        return Ok(SigningContext {
            participant_id: participant.id,
            did: participant.did.clone(),
            verification_method: participant.did.as_str().to_string(),
            private_key: Zeroizing::new(private_key),
        });
    }

    let private_key = keys
        .private_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| IssuanceError::BadData(PRIVATE_KEY_NOT_FOUND.into()))?;
    let verification_method = keys
        .verification_method
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| participant.did.as_str().to_string());

    if keys.store_vault {
        let entries = HashMap::from([(
            PRIVATE_KEY_ENTRY.to_string(),
            private_key.as_str().to_string(),
        )]);
        vault
            .put(participant.id, &entries)
            .await
            .map_err(|e| IssuanceError::upstream("secret store", e))?;
        participant.key_stored = true;
        batch.participant = Some(participant.clone());
    }

    Ok(SigningContext {
        participant_id: participant.id,
        did: participant.did.clone(),
        verification_method,
        private_key,
    })
}
