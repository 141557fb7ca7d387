//! Conformity label/level sub-credential.
//!
//! Runs only when the claim set carries `criteria`. The signer turns the
//! criteria into a label/level credential, which is hosted next to the
//! offering at `{participantId}/{offeringName}_labelLevel.json`.

use serde_json::Value;
use trustgate_client::{DocumentHost, Signer, SigningContext};
use trustgate_core::document::subjects;
use trustgate_core::{vocab, ParticipantId};

use super::IssuanceError;

/// A signed and hosted label/level credential.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLevelCredential {
    /// Public URL.
    pub vc_url: String,
    /// Signed document.
    pub vc_json: Value,
    /// Achieved level from `credentialSubject.gx:labelLevel`.
    pub level: Option<String>,
}

/// Host-relative path of an offering's label/level credential.
pub fn label_level_path(participant_id: ParticipantId, offering_name: &str) -> String {
    format!("{participant_id}/{offering_name}_labelLevel.json")
}

/// The `labelLevel` claim of the first subject that has one.
pub fn level_of(document: &Value) -> Option<String> {
    let direct = document
        .get(vocab::CREDENTIAL_SUBJECT)
        .and_then(|s| vocab::LABEL_LEVEL.get_in(s));
    direct
        .or_else(|| {
            subjects(document)
                .into_iter()
                .find_map(|s| vocab::LABEL_LEVEL.get_in(s))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Sign and host a label/level credential.
///
/// `Ok(None)` when the signer produced nothing; the caller decides whether
/// that is fatal.
pub async fn create_label_level(
    signer: &dyn Signer,
    host: &dyn DocumentHost,
    ctx: &SigningContext,
    criteria: &Value,
    offering_url: &str,
    offering_name: &str,
    public_host: &str,
) -> Result<Option<LabelLevelCredential>, IssuanceError> {
    let Some(vc_json) = signer
        .sign_label_level(ctx, criteria, offering_url)
        .await
        .map_err(|e| IssuanceError::upstream("signer", e))?
    else {
        return Ok(None);
    };

    let path = label_level_path(ctx.participant_id, offering_name);
    host.host(&path, &vc_json)
        .await
        .map_err(|e| IssuanceError::upstream("document host", e))?;

    let vc_url = format!("{public_host}{path}");
    let level = level_of(&vc_json);
    tracing::info!(
        participant_id = %ctx.participant_id,
        %vc_url,
        level = level.as_deref().unwrap_or("-"),
        "label level issued"
    );
    Ok(Some(LabelLevelCredential {
        vc_url,
        vc_json,
        level,
    }))
}
