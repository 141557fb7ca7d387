//! Typed client for the external signer.
//!
//! The signer owns all cryptography: it turns a claim set into a signed
//! service-offering presentation (with its compliance credential and
//! veracity data), signs label/level sub-credentials, and registers service
//! endpoints in participant DID documents.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v1/service-offers/sign` | Sign a service offering |
//! | POST   | `/v1/label-levels/sign` | Sign a label/level credential |
//! | POST   | `/v1/participants/{id}/service-endpoints` | Register a service endpoint |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use trustgate_core::{Did, ParticipantId};
use zeroize::Zeroizing;

use crate::error::ClientError;

// -- Request/Response types ---------------------------------------------------

/// Who signs, and with which key.
#[derive(Clone)]
pub struct SigningContext {
    /// Signing participant.
    pub participant_id: ParticipantId,
    /// Participant DID.
    pub did: Did,
    /// Verification method URI inside the DID document.
    pub verification_method: String,
    /// PKCS#8 private key. Zeroized on drop.
    pub private_key: Zeroizing<String>,
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("participant_id", &self.participant_id)
            .field("did", &self.did)
            .field("verification_method", &self.verification_method)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl SigningContext {
    fn signer_fields(&self) -> serde_json::Map<String, Value> {
        let mut body = serde_json::Map::new();
        body.insert("participantId".into(), json!(self.participant_id));
        body.insert("did".into(), json!(self.did.as_str()));
        body.insert("verificationMethod".into(), json!(self.verification_method));
        body.insert("privateKey".into(), json!(self.private_key.as_str()));
        body
    }
}

/// A service offering to be signed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSignRequest {
    /// Generated offering name.
    pub name: String,
    /// Public URL the signed offering will be hosted at.
    pub url: String,
    /// The claim set, as the credential subject.
    pub credential_subject: Value,
}

/// Signer output for a service offering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedService {
    /// Signed presentation: `selfDescriptionCredential` plus
    /// `complianceCredential`.
    pub service_vc: Value,
    /// Veracity data (carries `trustIndex`), if the signer computed any.
    #[serde(default, alias = "veracity")]
    pub veracity_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelLevelResponse {
    #[serde(default)]
    label_level_vc: Option<Value>,
}

/// Some signers return the signed document as a JSON string.
fn normalize_document(value: Value) -> Value {
    match value {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    }
}

// -- Capability ---------------------------------------------------------------

/// Delegated signing.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign a service offering.
    async fn sign_service(
        &self,
        ctx: &SigningContext,
        request: &ServiceSignRequest,
    ) -> Result<SignedService, ClientError>;

    /// Sign a label/level credential for the offering at `offering_url`.
    /// `Ok(None)` means the signer produced no sub-credential.
    async fn sign_label_level(
        &self,
        ctx: &SigningContext,
        criteria: &Value,
        offering_url: &str,
    ) -> Result<Option<Value>, ClientError>;

    /// Register `target` as a service endpoint of `participant_id`.
    async fn add_service_endpoint(
        &self,
        participant_id: ParticipantId,
        url: &str,
        endpoint_type: &str,
        target: &str,
    ) -> Result<(), ClientError>;
}

// -- Client -------------------------------------------------------------------

/// [`Signer`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSigner {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpSigner {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl Signer for HttpSigner {
    async fn sign_service(
        &self,
        ctx: &SigningContext,
        request: &ServiceSignRequest,
    ) -> Result<SignedService, ClientError> {
        let endpoint = "POST /v1/service-offers/sign";
        let url = crate::endpoint_url(&self.base_url, "v1/service-offers/sign", endpoint)?;

        let mut body = ctx.signer_fields();
        body.insert("name".into(), json!(request.name));
        body.insert("url".into(), json!(request.url));
        body.insert("credentialSubject".into(), request.credential_subject.clone());

        let resp = crate::send_checked(endpoint, self.http.post(url).json(&body)).await?;
        let mut signed: SignedService = crate::decode_json(endpoint, resp).await?;
        signed.service_vc = normalize_document(signed.service_vc);
        signed.veracity_data = signed
            .veracity_data
            .map(normalize_document)
            .filter(|v| !v.is_null());
        tracing::debug!(
            participant_id = %ctx.participant_id,
            name = %request.name,
            "service offering signed"
        );
        Ok(signed)
    }

    async fn sign_label_level(
        &self,
        ctx: &SigningContext,
        criteria: &Value,
        offering_url: &str,
    ) -> Result<Option<Value>, ClientError> {
        let endpoint = "POST /v1/label-levels/sign";
        let url = crate::endpoint_url(&self.base_url, "v1/label-levels/sign", endpoint)?;

        let mut body = ctx.signer_fields();
        body.insert("url".into(), json!(offering_url));
        body.insert("criteria".into(), criteria.clone());

        let resp = crate::send_checked(endpoint, self.http.post(url).json(&body)).await?;
        let out: LabelLevelResponse = crate::decode_json(endpoint, resp).await?;
        Ok(out
            .label_level_vc
            .map(normalize_document)
            .filter(|v| !v.is_null()))
    }

    async fn add_service_endpoint(
        &self,
        participant_id: ParticipantId,
        url: &str,
        endpoint_type: &str,
        target: &str,
    ) -> Result<(), ClientError> {
        let endpoint = format!("POST /v1/participants/{participant_id}/service-endpoints");
        let request_url = crate::endpoint_url(
            &self.base_url,
            &format!("v1/participants/{participant_id}/service-endpoints"),
            &endpoint,
        )?;
        let body = json!({
            "id": url,
            "type": endpoint_type,
            "serviceEndpoint": target,
        });
        crate::send_checked(&endpoint, self.http.post(request_url).json(&body)).await?;
        Ok(())
    }
}
