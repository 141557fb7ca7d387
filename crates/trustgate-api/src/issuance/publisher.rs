//! Compliance publish.
//!
//! After an offering commits, its compliance credential is posted to the
//! message broker. Only a `201 Created` answer counts; the last path segment
//! of its `Location` header is stored on the offering as the broker
//! reference. Publishing is best-effort: the issuer spawns it, then logs and
//! counts the outcome. It never changes the issuance result.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use trustgate_client::{ClientError, MessageBroker, PublishMessage};
use trustgate_core::{vocab, OfferingId};

use crate::repository::{DynRepository, RepositoryError};

/// Publish failures.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The signed offering has no `complianceCredential`.
    #[error("signed offering carries no complianceCredential")]
    MissingComplianceCredential,

    /// The broker could not be reached.
    #[error("broker unreachable: {0}")]
    Broker(#[from] ClientError),

    /// The broker answered with something other than `201 Created`.
    #[error("broker rejected publish with status {status}")]
    Rejected {
        /// Response status.
        status: u16,
    },

    /// The reference could not be stored.
    #[error("storing message reference failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Last non-empty path segment of a `Location` header value.
pub fn message_reference(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Posts compliance credentials and records the broker reference.
#[derive(Clone)]
pub struct CompliancePublisher {
    broker: Arc<dyn MessageBroker>,
    repository: DynRepository,
    source: String,
}

impl std::fmt::Debug for CompliancePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompliancePublisher")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl CompliancePublisher {
    /// `source` is this issuer's public base URL.
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        repository: DynRepository,
        source: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            repository,
            source: source.into(),
        }
    }

    /// Publish the compliance credential of `service_vc`.
    ///
    /// Returns the stored broker reference, or `None` when the broker
    /// accepted the message without a usable `Location`.
    pub async fn publish(
        &self,
        offering_id: OfferingId,
        service_vc: &Value,
    ) -> Result<Option<String>, PublishError> {
        let data = service_vc
            .get(vocab::COMPLIANCE_CREDENTIAL)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or(PublishError::MissingComplianceCredential)?;

        let receipt = self
            .broker
            .publish(&PublishMessage {
                source: self.source.clone(),
                data,
            })
            .await?;

        if receipt.status != 201 {
            return Err(PublishError::Rejected {
                status: receipt.status,
            });
        }

        let Some(reference) = receipt.location.as_deref().and_then(message_reference) else {
            tracing::warn!(%offering_id, "broker accepted publish without a Location header");
            return Ok(None);
        };

        if !self
            .repository
            .set_message_reference(offering_id, &reference)
            .await?
        {
            tracing::warn!(
                %offering_id,
                "offering vanished before its message reference was stored"
            );
        }
        Ok(Some(reference))
    }
}
