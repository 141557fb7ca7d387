//! # Service-Offering Issuance Pipeline
//!
//! [`ServiceOfferIssuer::issue`] turns a claim set into a signed, hosted and
//! persisted service offering:
//!
//! ```text
//! validate ─▶ resolve references ─▶ participant & key ─▶ allocate name
//!    ─▶ policy ─▶ terms hash ─▶ label/level ─▶ sign ─▶ host ─▶ commit
//!    ─▶ publish (spawned)
//! ```
//!
//! Every row the pipeline produces is staged in one [`IssuanceBatch`] and
//! committed once, after all external calls that can fail the request have
//! succeeded. Documents hosted before a later failure (the policy, the
//! label/level credential) stay hosted; re-hosting overwrites them.
//!
//! The compliance publish runs after the commit in its own task. Its outcome
//! is logged and counted but never changes the response.

pub mod label_level;
pub mod participant;
pub mod persist;
pub mod policy;
pub mod publisher;
pub mod query;
pub mod resolver;
pub mod signing;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use trustgate_client::{
    ClientConfig, ClientError, DocumentFetcher, DocumentHost, MessageBroker, SecretStore, Signer,
    TrustClient,
};
use trustgate_core::document::find_subject_of_type;
use trustgate_core::{
    sha256_hex, validate, validate_offering_name, vocab, ClaimError, ClaimSet, CredentialType,
    DocumentType, LabelLevelLink, NameGenerator, OfferingId, Participant, ParticipantId,
    ServiceOffer,
};
use zeroize::Zeroizing;

use crate::middleware::metrics::ApiMetrics;
use crate::repository::{DynRepository, IssuanceBatch, RepositoryError};
use participant::KeyMaterial;
use policy::PolicySpec;
use publisher::CompliancePublisher;

/// Attempts at drawing an offering name whose URL is not yet taken.
pub const MAX_NAME_ATTEMPTS: usize = 8;

const INVALID_TERMS_AND_CONDITIONS: &str = "invalid.terms.and.conditions";

// -- Errors -------------------------------------------------------------------

/// Issuance and query failures.
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// The request is structurally or referentially invalid. Carries a
    /// stable code such as `aggregation.of.not.found`.
    #[error("{0}")]
    BadData(String),

    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A collaborator failed.
    #[error("{service} failed: {reason}")]
    Upstream {
        /// Collaborator name.
        service: &'static str,
        /// Failure description.
        reason: String,
    },

    /// The pipeline reached a state it must never reach.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Persistence failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl IssuanceError {
    /// Wrap a collaborator error.
    pub fn upstream(service: &'static str, err: ClientError) -> Self {
        Self::Upstream {
            service,
            reason: err.to_string(),
        }
    }
}

impl From<RepositoryError> for IssuanceError {
    fn from(err: RepositoryError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ClaimError> for IssuanceError {
    fn from(err: ClaimError) -> Self {
        Self::BadData(err.code().to_string())
    }
}

// -- Wiring -------------------------------------------------------------------

/// The external collaborators, as trait objects.
#[derive(Clone)]
pub struct Collaborators {
    /// Remote document fetch.
    pub fetcher: Arc<dyn DocumentFetcher>,
    /// Signer.
    pub signer: Arc<dyn Signer>,
    /// Document host.
    pub host: Arc<dyn DocumentHost>,
    /// Message broker.
    pub broker: Arc<dyn MessageBroker>,
    /// Secret store.
    pub vault: Arc<dyn SecretStore>,
}

impl Collaborators {
    /// The HTTP clients of a [`TrustClient`].
    pub fn from_client(client: &TrustClient) -> Self {
        Self {
            fetcher: Arc::new(client.fetcher().clone()),
            signer: Arc::new(client.signer().clone()),
            host: Arc::new(client.host().clone()),
            broker: Arc::new(client.broker().clone()),
            vault: Arc::new(client.vault().clone()),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Issuer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Public base URL of hosted documents. Always ends with `/`.
    pub public_host_url: String,
    /// Service-endpoint type registered in DID documents.
    pub link_domain_type: String,
}

impl IssuerConfig {
    /// Settings from the collaborator configuration.
    pub fn from_client_config(config: &ClientConfig) -> Self {
        let mut public_host_url = config.public_host_url.to_string();
        if !public_host_url.ends_with('/') {
            public_host_url.push('/');
        }
        Self {
            public_host_url,
            link_domain_type: config.link_domain_type.clone(),
        }
    }

    /// Host-relative path of an offering.
    pub fn offering_path(participant_id: ParticipantId, offering_name: &str) -> String {
        format!("{participant_id}/{offering_name}.json")
    }

    /// Public URL of a host-relative path.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}{path}", self.public_host_url)
    }
}

// -- Request/Response types ---------------------------------------------------

/// Issuance request body.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Offering name.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Claim set.
    #[serde(default)]
    pub credential_subject: ClaimSet,
    /// Verification method URI; defaults to the participant DID.
    #[serde(default)]
    pub verification_method: Option<String>,
    /// PKCS#8 private key, unless one is stored for the participant.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Legal-participant self-description URL, for unregistered callers.
    #[serde(default)]
    pub participant_json_url: Option<String>,
    /// Store the private key for later requests.
    #[serde(default)]
    pub store_vault: bool,
    /// The participant hosts its own DID document.
    #[serde(default)]
    pub own_did_solution: bool,
}

impl std::fmt::Debug for IssueRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueRequest")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("claims", &self.credential_subject.len())
            .field("verification_method", &self.verification_method)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("participant_json_url", &self.participant_json_url)
            .field("store_vault", &self.store_vault)
            .field("own_did_solution", &self.own_did_solution)
            .finish()
    }
}

/// Issuance result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedOffering {
    /// Offering identifier.
    pub id: OfferingId,
    /// Public URL of the signed offering.
    pub vc_url: String,
    /// Caller-supplied name.
    pub name: String,
    /// Veracity data, when the signer returned any.
    pub veracity_data: Option<Value>,
    /// The signed presentation as a list of credentials.
    pub vc_json: Vec<Value>,
    /// Description.
    pub description: Option<String>,
}

// -- Issuer -------------------------------------------------------------------

/// Runs the issuance pipeline.
pub struct ServiceOfferIssuer {
    repository: DynRepository,
    collaborators: Collaborators,
    names: Arc<dyn NameGenerator>,
    config: IssuerConfig,
    publisher: CompliancePublisher,
    metrics: ApiMetrics,
}

impl std::fmt::Debug for ServiceOfferIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOfferIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Label/level output carried from linking to commit.
struct LinkedLabelLevel {
    credential_id: trustgate_core::CredentialId,
    level: Option<String>,
}

impl ServiceOfferIssuer {
    /// Wire an issuer. The compliance publisher posts to
    /// `collaborators.broker` with the public host URL as source.
    pub fn new(
        repository: DynRepository,
        collaborators: Collaborators,
        names: Arc<dyn NameGenerator>,
        config: IssuerConfig,
        metrics: ApiMetrics,
    ) -> Self {
        let publisher = CompliancePublisher::new(
            Arc::clone(&collaborators.broker),
            Arc::clone(&repository),
            config.public_host_url.clone(),
        );
        Self {
            repository,
            collaborators,
            names,
            config,
            publisher,
            metrics,
        }
    }

    /// Issue a service offering.
    ///
    /// `participant_id` names a registered participant; without it the
    /// participant is taken from `request.participant_json_url`.
    ///
    /// # Errors
    ///
    /// - [`IssuanceError::BadData`] for invalid claims, unresolvable
    ///   references, unknown participants or missing keys. Nothing is
    ///   persisted.
    /// - [`IssuanceError::Upstream`] when the signer, document host, secret
    ///   store or document fetch fails.
    /// - [`IssuanceError::Invariant`] and [`IssuanceError::Storage`] for
    ///   internal failures.
    pub async fn issue(
        &self,
        request: IssueRequest,
        participant_id: Option<ParticipantId>,
    ) -> Result<IssuedOffering, IssuanceError> {
        let result = self.run(request, participant_id).await;
        let outcome = match &result {
            Ok(_) => "issued",
            Err(IssuanceError::BadData(_) | IssuanceError::NotFound(_)) => "rejected",
            Err(_) => "failed",
        };
        self.metrics.record_issuance(outcome);
        if let Err(e) = &result {
            tracing::warn!(outcome, error = %e, "service offering not issued");
        }
        result
    }

    async fn run(
        &self,
        request: IssueRequest,
        participant_id: Option<ParticipantId>,
    ) -> Result<IssuedOffering, IssuanceError> {
        let IssueRequest {
            name,
            description,
            credential_subject: mut claims,
            verification_method,
            private_key,
            participant_json_url,
            store_vault,
            own_did_solution,
        } = request;

        // Pure checks first: nothing below runs for a malformed request.
        let name = validate_offering_name(name.as_deref())?.to_string();
        let references = validate(&claims)?;
        let policy_spec = PolicySpec::from_claim(claims.policy().unwrap_or(&Value::Null))?;

        let fetcher = &self.collaborators.fetcher;
        resolver::resolve(
            fetcher,
            &references.aggregation_ids,
            ClaimError::AggregationNotFound.code(),
            Some(&[resolver::HOLDER_SIGNATURE][..]),
        )
        .await?;
        resolver::resolve(
            fetcher,
            &references.depends_on_ids,
            ClaimError::DependsOnNotFound.code(),
            None,
        )
        .await?;

        let mut batch = IssuanceBatch::new();
        let mut participant = match participant_id {
            Some(id) => participant::registered(&self.repository, fetcher, id).await?,
            None => {
                participant::from_document(
                    &self.repository,
                    fetcher,
                    participant_json_url.as_deref(),
                    own_did_solution,
                    &mut batch,
                )
                .await?
            }
        };
        let keys = KeyMaterial {
            verification_method,
            private_key: private_key.map(Zeroizing::new),
            store_vault,
        };
        let ctx = participant::signing_context(
            self.collaborators.vault.as_ref(),
            &mut participant,
            keys,
            &mut batch,
        )
        .await?;

        let service_name = self.allocate_name(&participant).await?;
        let offering_path = IssuerConfig::offering_path(participant.id, &service_name);
        let offering_url = self.config.public_url(&offering_path);
        tracing::info!(
            participant_id = %participant.id,
            %service_name,
            %offering_url,
            "issuing service offering"
        );

        let policy_doc = policy::synthesize(
            &policy_spec,
            &participant.did,
            &offering_url,
            &service_name,
            participant.id,
            &self.config.public_host_url,
        );
        policy::host(self.collaborators.host.as_ref(), &policy_doc).await?;
        persist::persist(
            &mut batch,
            &policy_doc.document,
            &policy_doc.url,
            CredentialType::OdrlPolicy,
            participant.id,
        )?;
        claims.insert(vocab::POLICY, policy_spec.claim_value(&policy_doc.url));

        self.hash_terms_and_conditions(&mut claims).await?;

        let label_level = match claims.remove(vocab::CRITERIA) {
            Some(criteria) => Some(
                self.link_label_level(
                    &ctx,
                    &criteria,
                    &mut claims,
                    &offering_url,
                    &service_name,
                    &mut batch,
                )
                .await?,
            ),
            None => None,
        };

        let signed = signing::sign(
            self.collaborators.signer.as_ref(),
            &ctx,
            &claims,
            &service_name,
            &offering_url,
        )
        .await?;
        self.collaborators
            .host
            .host(&offering_path, &signed.service_vc)
            .await
            .map_err(|e| IssuanceError::upstream("document host", e))?;
        let endpoint = signing::register_service_endpoint(
            self.collaborators.signer.as_ref(),
            &participant,
            &offering_url,
            &self.config.link_domain_type,
        )
        .await;

        let credential = persist::persist(
            &mut batch,
            &signed.service_vc,
            &offering_url,
            CredentialType::ServiceOffer,
            participant.id,
        )?;
        let regimes = protection_regimes(&signed.service_vc, &claims);
        let standard_ids = if regimes.is_empty() {
            Vec::new()
        } else {
            self.repository
                .standards_by_type(&regimes)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect()
        };

        let now = Utc::now();
        let offer = ServiceOffer {
            id: OfferingId::new(),
            name: name.clone(),
            description: description.clone(),
            participant_id: participant.id,
            credential_id: credential.id,
            vc_url: offering_url.clone(),
            standard_ids,
            label_level: label_level.as_ref().and_then(|l| l.level.clone()),
            veracity: signed.veracity.clone(),
            message_reference_id: None,
            created_at: now,
            updated_at: now,
        };
        let offering_id = offer.id;
        if let Some(linked) = &label_level {
            batch.label_level_link = Some(LabelLevelLink {
                offering_id,
                participant_id: participant.id,
                credential_id: linked.credential_id,
            });
        }
        batch.offering = Some(offer);

        self.repository.commit(batch).await?;
        tracing::info!(
            %offering_id,
            participant_id = %participant.id,
            %offering_url,
            service_endpoint = endpoint.as_str(),
            "service offering issued"
        );

        self.spawn_publish(offering_id, signed.service_vc.clone());

        Ok(IssuedOffering {
            id: offering_id,
            vc_url: offering_url,
            name,
            veracity_data: signed.veracity.clone(),
            vc_json: signed.vc_list(),
            description,
        })
    }

    /// Draw names until one maps to an unused URL.
    async fn allocate_name(&self, participant: &Participant) -> Result<String, IssuanceError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = self.names.service_name();
            let url = self
                .config
                .public_url(&IssuerConfig::offering_path(participant.id, &candidate));
            if !self.repository.credential_url_exists(&url).await? {
                return Ok(candidate);
            }
            tracing::debug!(%url, "offering name collision, drawing again");
        }
        Err(IssuanceError::Invariant(format!(
            "no free offering name after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }

    /// Add `hash` (SHA-256 of the fetched document) next to
    /// `termsAndConditions.URL`.
    async fn hash_terms_and_conditions(&self, claims: &mut ClaimSet) -> Result<(), IssuanceError> {
        let Some(url) = claims
            .terms_and_conditions()
            .and_then(|tnc| vocab::URL.get_in(tnc))
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            return Ok(());
        };

        let content = self
            .collaborators
            .fetcher
            .fetch_text(&url)
            .await
            .map_err(|e| {
                tracing::warn!(%url, error = %e, "terms and conditions did not resolve");
                IssuanceError::BadData(INVALID_TERMS_AND_CONDITIONS.into())
            })?;

        if let Some(tnc) = claims.terms_and_conditions_mut() {
            let key = vocab::HASH.key_in(tnc).unwrap_or_else(|| vocab::HASH.prefixed());
            tnc.insert(key, json!(sha256_hex(content)));
        }
        Ok(())
    }

    async fn link_label_level(
        &self,
        ctx: &trustgate_client::SigningContext,
        criteria: &Value,
        claims: &mut ClaimSet,
        offering_url: &str,
        service_name: &str,
        batch: &mut IssuanceBatch,
    ) -> Result<LinkedLabelLevel, IssuanceError> {
        let credential = label_level::create_label_level(
            self.collaborators.signer.as_ref(),
            self.collaborators.host.as_ref(),
            ctx,
            criteria,
            offering_url,
            service_name,
            &self.config.public_host_url,
        )
        .await?
        .ok_or_else(|| {
            IssuanceError::Invariant("criteria given but no label level was produced".into())
        })?;

        claims.insert(vocab::LABEL_LEVEL, json!(credential.vc_url));
        let record = persist::persist(
            batch,
            &credential.vc_json,
            &credential.vc_url,
            CredentialType::LabelLevel,
            ctx.participant_id,
        )?;
        Ok(LinkedLabelLevel {
            credential_id: record.id,
            level: credential.level,
        })
    }

    fn spawn_publish(&self, offering_id: OfferingId, service_vc: Value) {
        let publisher = self.publisher.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match publisher.publish(offering_id, &service_vc).await {
                Ok(reference) => {
                    metrics.record_publish("published");
                    tracing::info!(
                        %offering_id,
                        message_reference = reference.as_deref().unwrap_or("-"),
                        "compliance published"
                    );
                }
                Err(e) => {
                    metrics.record_publish("failed");
                    tracing::error!(%offering_id, error = %e, "compliance publish failed");
                }
            }
        });
    }
}

/// Data-protection regimes of the signed offering's subject, falling back
/// to the submitted claims.
fn protection_regimes(service_vc: &Value, claims: &ClaimSet) -> Vec<String> {
    let signed = find_subject_of_type(service_vc, DocumentType::ServiceOffering)
        .and_then(|s| vocab::DATA_PROTECTION_REGIME.get_in(s));
    query::string_list(signed.or_else(|| claims.get(vocab::DATA_PROTECTION_REGIME)))
}
