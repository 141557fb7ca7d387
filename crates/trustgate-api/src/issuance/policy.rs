//! ODRL usage policy generation, hosting, and location lookup.
//!
//! The `policy` claim of an issuance request is a small spec:
//!
//! ```json
//! { "location": ["BE-BRU", "FR-75"], "customAttribute": "https://..." }
//! ```
//!
//! Both keys are vocabulary terms and may carry the `gx:` prefix.
//!
//! It is turned into an ODRL policy whose single permission lets anyone use
//! the offering inside the listed ISO 3166-2 subdivisions. The policy is
//! hosted at `{participantId}/{offeringName}_policy.json` and the claim is
//! replaced with the hosted URL (plus the custom attribute, when given).

use serde_json::{json, Value};
use trustgate_client::{DocumentFetcher, DocumentHost};
use trustgate_core::document::find_subject_of_type;
use trustgate_core::{vocab, ClaimError, Did, DocumentType, ParticipantId};

use super::IssuanceError;

/// ODRL JSON-LD context.
pub const ODRL_CONTEXT: &str = "http://www.w3.org/ns/odrl.jsonld";

/// Left operand of the location constraint.
pub const SPATIAL_LEFT_OPERAND: &str = "spatial";

/// Parsed `policy` claim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicySpec {
    /// Subdivision codes the offering may be used in. May be empty.
    pub location: Vec<String>,
    /// Extra policy reference kept next to the generated one.
    pub custom_attribute: Option<String>,
}

impl PolicySpec {
    /// Parse the claim value.
    ///
    /// # Errors
    ///
    /// `invalid.policy` when the value is not an object, `location` is not a
    /// list of strings, or `customAttribute` is not a string.
    /// Either key may be spelled with or without the `gx:` prefix.
    pub fn from_claim(value: &Value) -> Result<Self, IssuanceError> {
        let invalid = || IssuanceError::BadData(ClaimError::InvalidPolicy.code().to_string());
        let spec = value.as_object().ok_or_else(invalid)?;

        let location = match vocab::LOCATION.get(spec) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(codes)) => codes
                .iter()
                .map(|c| c.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(invalid)?,
            Some(_) => return Err(invalid()),
        };

        let custom_attribute = match vocab::CUSTOM_ATTRIBUTE.get(spec) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(invalid()),
        };

        Ok(Self {
            location,
            custom_attribute,
        })
    }

    /// Replacement value for the `policy` claim once the policy is hosted.
    pub fn claim_value(&self, policy_url: &str) -> Value {
        match &self.custom_attribute {
            Some(attr) => json!([policy_url, attr]),
            None => json!([policy_url]),
        }
    }
}

/// A generated policy and where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    /// Host-relative path.
    pub path: String,
    /// Public URL.
    pub url: String,
    /// ODRL document.
    pub document: Value,
}

/// Host-relative path of an offering's policy.
pub fn policy_path(participant_id: ParticipantId, offering_name: &str) -> String {
    format!("{participant_id}/{offering_name}_policy.json")
}

/// Build the ODRL policy for an offering.
pub fn synthesize(
    spec: &PolicySpec,
    assigner: &Did,
    offering_url: &str,
    offering_name: &str,
    participant_id: ParticipantId,
    public_host: &str,
) -> PolicyDocument {
    let path = policy_path(participant_id, offering_name);
    let url = format!("{public_host}{path}");
    let document = json!({
        "@context": ODRL_CONTEXT,
        "@type": "policy",
        "@id": url,
        "permission": [{
            "target": offering_url,
            "assigner": assigner.as_str(),
            "action": "use",
            "constraint": [{
                "leftOperand": SPATIAL_LEFT_OPERAND,
                "operator": "isAnyOf",
                "rightOperand": spec.location,
            }],
        }],
    });
    PolicyDocument {
        path,
        url,
        document,
    }
}

/// Publish a policy at its path. Re-hosting overwrites.
pub async fn host(host: &dyn DocumentHost, policy: &PolicyDocument) -> Result<(), IssuanceError> {
    host.host(&policy.path, &policy.document)
        .await
        .map_err(|e| IssuanceError::upstream("document host", e))?;
    tracing::debug!(url = %policy.url, "policy hosted");
    Ok(())
}

/// Subdivision codes of every spatial constraint in a policy document.
pub fn spatial_codes(policy: &Value) -> Vec<String> {
    let mut codes = Vec::new();
    let permissions = policy
        .get("permission")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for permission in permissions {
        let constraints = permission
            .get("constraint")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for constraint in constraints {
            let left = constraint.get("leftOperand").and_then(Value::as_str);
            if left != Some(SPATIAL_LEFT_OPERAND) {
                continue;
            }
            match constraint.get("rightOperand") {
                Some(Value::Array(items)) => {
                    codes.extend(items.iter().filter_map(Value::as_str).map(str::to_string))
                }
                Some(Value::String(code)) => codes.push(code.clone()),
                _ => {}
            }
        }
    }
    codes
}

/// First policy URL in a service-offering subject's `policy` claim.
fn policy_url(subject: &Value) -> Option<String> {
    match vocab::POLICY.get_in(subject)? {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Subdivision codes allowed by the policy of the offering hosted at
/// `offering_url`. Empty when the offering carries no policy.
pub async fn locations_for_offering(
    fetcher: &dyn DocumentFetcher,
    offering_url: &str,
) -> Result<Vec<String>, IssuanceError> {
    let offering = fetcher
        .fetch_json(offering_url)
        .await
        .map_err(|e| IssuanceError::upstream("document fetch", e))?;
    locations_in(fetcher, &offering).await
}

/// Subdivision codes allowed by the policy referenced from an already
/// fetched offering document.
pub async fn locations_in(
    fetcher: &dyn DocumentFetcher,
    offering: &Value,
) -> Result<Vec<String>, IssuanceError> {
    let subject = find_subject_of_type(offering, DocumentType::ServiceOffering);
    let Some(url) = subject.and_then(policy_url) else {
        return Ok(Vec::new());
    };

    let policy = fetcher
        .fetch_json(&url)
        .await
        .map_err(|e| IssuanceError::upstream("document fetch", e))?;
    Ok(spatial_codes(&policy))
}
