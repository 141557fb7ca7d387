//! # Trust-Framework Vocabulary
//!
//! Claim keys are namespaced vocabulary terms. Callers send them either
//! prefixed (`gx:policy`) or bare (`policy`); a [`Term`] looks up both
//! spellings, prefixed first, and writes new keys in prefixed form.
//!
//! Envelope keys of the signed document (`credentialSubject`, `type`, ...)
//! are not vocabulary terms and are plain string constants.

use serde_json::{Map, Value};

/// Namespace prefix of the trust-framework vocabulary.
pub const GX_PREFIX: &str = "gx:";

/// A vocabulary term that may appear with or without the `gx:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term(&'static str);

impl Term {
    /// Declare a term by its bare name.
    pub const fn new(bare: &'static str) -> Self {
        Self(bare)
    }

    /// The bare spelling, e.g. `policy`.
    pub fn bare(&self) -> &'static str {
        self.0
    }

    /// The prefixed spelling, e.g. `gx:policy`.
    pub fn prefixed(&self) -> String {
        format!("{GX_PREFIX}{}", self.0)
    }

    /// Find the key under which this term is stored in `map`, if any.
    pub fn key_in(&self, map: &Map<String, Value>) -> Option<String> {
        let prefixed = self.prefixed();
        if map.contains_key(&prefixed) {
            Some(prefixed)
        } else if map.contains_key(self.0) {
            Some(self.0.to_string())
        } else {
            None
        }
    }

    /// Look the term up in `map`.
    pub fn get<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a Value> {
        map.get(&self.prefixed()).or_else(|| map.get(self.0))
    }

    /// Look the term up in an arbitrary JSON value (non-objects yield `None`).
    pub fn get_in<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        value.as_object().and_then(|m| self.get(m))
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

// -- Claim terms --------------------------------------------------------------

/// Usage policy of the offering.
pub const POLICY: Term = Term::new("policy");
/// Resources the offering composes.
pub const AGGREGATION_OF: Term = Term::new("aggregationOf");
/// Services the offering requires.
pub const DEPENDS_ON: Term = Term::new("dependsOn");
/// Data-export terms.
pub const DATA_ACCOUNT_EXPORT: Term = Term::new("dataAccountExport");
/// `dataAccountExport.requestType`.
pub const REQUEST_TYPE: Term = Term::new("requestType");
/// `dataAccountExport.accessType`.
pub const ACCESS_TYPE: Term = Term::new("accessType");
/// `dataAccountExport.formatType`.
pub const FORMAT_TYPE: Term = Term::new("formatType");
/// Terms-and-conditions object (`URL` + `hash`).
pub const TERMS_AND_CONDITIONS: Term = Term::new("termsAndConditions");
/// Terms-and-conditions document location.
pub const URL: Term = Term::new("URL");
/// SHA-256 of the terms-and-conditions document.
pub const HASH: Term = Term::new("hash");
/// `policy.location`: allowed ISO 3166-2 subdivision codes.
pub const LOCATION: Term = Term::new("location");
/// `policy.customAttribute`: extra policy reference.
pub const CUSTOM_ATTRIBUTE: Term = Term::new("customAttribute");
/// Conformity-criteria answers.
pub const CRITERIA: Term = Term::new("criteria");
/// Label/level reference (claim) or achieved level (signed document).
pub const LABEL_LEVEL: Term = Term::new("labelLevel");
/// Data-protection regimes the offering satisfies.
pub const DATA_PROTECTION_REGIME: Term = Term::new("dataProtectionRegime");
/// Human-readable subject name.
pub const NAME: Term = Term::new("name");
/// Legal name of a participant subject.
pub const LEGAL_NAME: Term = Term::new("legalName");

// -- Envelope keys ------------------------------------------------------------

/// Reference identifier key inside aggregation/dependsOn items.
pub const ID: &str = "id";
/// Subject type key.
pub const TYPE: &str = "type";
/// JSON-LD alternative for the subject type key.
pub const AT_TYPE: &str = "@type";
/// Credential subject key.
pub const CREDENTIAL_SUBJECT: &str = "credentialSubject";
/// Self-description wrapper key in signer output.
pub const SELF_DESCRIPTION_CREDENTIAL: &str = "selfDescriptionCredential";
/// Verifiable-credential list key inside a presentation.
pub const VERIFIABLE_CREDENTIAL: &str = "verifiableCredential";
/// Compliance-credential key in signer output.
pub const COMPLIANCE_CREDENTIAL: &str = "complianceCredential";
/// Trust score key inside veracity data.
pub const TRUST_INDEX: &str = "trustIndex";
/// Issuer key of a verifiable credential.
pub const ISSUER: &str = "issuer";
