//! # Credential Records
//!
//! A credential record wraps a signed artifact the issuer produced (service
//! offer, usage policy, label/level) or referenced (legal participant,
//! resource). Records are immutable: re-issuance appends a new record and
//! never overwrites an existing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{CredentialId, ParticipantId};

/// Closed set of credential kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialType {
    /// Participant self-description.
    LegalParticipant,
    /// Signed service-offering presentation.
    ServiceOffer,
    /// Generated usage policy.
    OdrlPolicy,
    /// Conformity label/level sub-credential.
    LabelLevel,
    /// Resource self-description.
    Resource,
}

impl CredentialType {
    /// Storage representation, e.g. `SERVICE_OFFER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegalParticipant => "LEGAL_PARTICIPANT",
            Self::ServiceOffer => "SERVICE_OFFER",
            Self::OdrlPolicy => "ODRL_POLICY",
            Self::LabelLevel => "LABEL_LEVEL",
            Self::Resource => "RESOURCE",
        }
    }

    /// Parse the storage representation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownCredentialType`] for unknown tags.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "LEGAL_PARTICIPANT" => Ok(Self::LegalParticipant),
            "SERVICE_OFFER" => Ok(Self::ServiceOffer),
            "ODRL_POLICY" => Ok(Self::OdrlPolicy),
            "LABEL_LEVEL" => Ok(Self::LabelLevel),
            "RESOURCE" => Ok(Self::Resource),
            other => Err(ValidationError::UnknownCredentialType(other.to_string())),
        }
    }
}

impl std::fmt::Display for CredentialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored signed document, addressable by its public URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Record identifier.
    pub id: CredentialId,
    /// Public location of the document.
    pub vc_url: String,
    /// Raw signed payload text.
    pub vc_json: String,
    /// Kind of credential.
    pub credential_type: CredentialType,
    /// Owning participant.
    pub participant_id: ParticipantId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Build a new record with a fresh id.
    pub fn new(
        vc_url: impl Into<String>,
        vc_json: impl Into<String>,
        credential_type: CredentialType,
        participant_id: ParticipantId,
    ) -> Self {
        Self {
            id: CredentialId::new(),
            vc_url: vc_url.into(),
            vc_json: vc_json.into(),
            credential_type,
            participant_id,
            created_at: Utc::now(),
        }
    }
}
