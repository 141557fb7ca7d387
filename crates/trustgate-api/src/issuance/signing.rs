//! Signer delegation and service-endpoint registration.

use serde_json::Value;
use trustgate_client::{ServiceSignRequest, Signer, SigningContext};
use trustgate_core::{ClaimSet, Participant};

use super::IssuanceError;

/// Signer output for one offering.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedOffering {
    /// Signed presentation, including the compliance credential.
    pub service_vc: Value,
    /// Veracity data, when the signer computed any.
    pub veracity: Option<Value>,
}

impl SignedOffering {
    /// The presentation as a list of credentials; a single object becomes a
    /// one-element list.
    pub fn vc_list(&self) -> Vec<Value> {
        match &self.service_vc {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        }
    }
}

/// Sign the finalized claim set.
///
/// # Errors
///
/// [`IssuanceError::Upstream`] on any signer failure. Nothing has been
/// persisted at this point.
pub async fn sign(
    signer: &dyn Signer,
    ctx: &SigningContext,
    claims: &ClaimSet,
    offering_name: &str,
    offering_url: &str,
) -> Result<SignedOffering, IssuanceError> {
    let request = ServiceSignRequest {
        name: offering_name.to_string(),
        url: offering_url.to_string(),
        credential_subject: claims.clone().into_value(),
    };
    let signed = signer
        .sign_service(ctx, &request)
        .await
        .map_err(|e| IssuanceError::upstream("signer", e))?;
    Ok(SignedOffering {
        service_vc: signed.service_vc,
        veracity: signed.veracity_data,
    })
}

/// Outcome of [`register_service_endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRegistration {
    /// The signer added the endpoint.
    Registered,
    /// The participant runs its own DID solution.
    Skipped,
    /// The signer call failed; issuance continued.
    Failed,
}

impl EndpointRegistration {
    /// Log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Register the hosted offering in the participant's DID document.
///
/// Skipped for participants that run their own DID solution. A failure is
/// logged and reported as [`EndpointRegistration::Failed`]; it never fails
/// the issuance.
pub async fn register_service_endpoint(
    signer: &dyn Signer,
    participant: &Participant,
    offering_url: &str,
    link_domain_type: &str,
) -> EndpointRegistration {
    if participant.own_did_solution {
        tracing::debug!(participant_id = %participant.id, "own DID solution, endpoint not added");
        return EndpointRegistration::Skipped;
    }
    match signer
        .add_service_endpoint(participant.id, offering_url, link_domain_type, offering_url)
        .await
    {
        Ok(()) => EndpointRegistration::Registered,
        Err(e) => {
            tracing::warn!(
                participant_id = %participant.id,
                url = %offering_url,
                error = %e,
                "service endpoint registration failed"
            );
            EndpointRegistration::Failed
        }
    }
}
