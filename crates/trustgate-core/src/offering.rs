//! Participant, service-offering and master-data records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::identity::{CredentialId, Did, OfferingId, ParticipantId};

/// A registered legal participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Decentralized identifier used as policy assigner.
    pub did: Did,
    /// Legal name from the participant self-description.
    pub legal_name: String,
    /// Whether the signing key is held in the secret store.
    pub key_stored: bool,
    /// Whether the participant hosts its own DID document.
    pub own_did_solution: bool,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// A fresh participant record.
    pub fn new(did: Did, legal_name: impl Into<String>, own_did_solution: bool) -> Self {
        Self {
            id: ParticipantId::new(),
            did,
            legal_name: legal_name.into(),
            key_stored: false,
            own_did_solution,
            created_at: Utc::now(),
        }
    }
}

/// The service-offering aggregate root.
///
/// Created once when issuance completes. The only later mutation is
/// attaching [`ServiceOffer::message_reference_id`] after a compliance
/// publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffer {
    /// Offering identifier.
    pub id: OfferingId,
    /// Caller-supplied offering name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Owning participant.
    pub participant_id: ParticipantId,
    /// Signed service-offer credential.
    pub credential_id: CredentialId,
    /// Public location of the signed offering.
    pub vc_url: String,
    /// Matched data-protection standards.
    pub standard_ids: Vec<Uuid>,
    /// Achieved conformity level, when a label/level was issued.
    pub label_level: Option<String>,
    /// Veracity data returned by the signer (carries `trustIndex`).
    pub veracity: Option<Value>,
    /// Broker reference of the compliance publish.
    pub message_reference_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Master row for a data-protection regime, e.g. `GDPR2016`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardType {
    /// Row identifier.
    pub id: Uuid,
    /// Regime name.
    pub type_name: String,
}

/// Join between an offering, its participant and a label/level credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelLevelLink {
    /// Offering identifier.
    pub offering_id: OfferingId,
    /// Owning participant.
    pub participant_id: ParticipantId,
    /// Label/level credential.
    pub credential_id: CredentialId,
}
