//! # Document-Type Dispatch
//!
//! Signed documents handed back by the signer, and the remote documents the
//! resolver fetches, are verifiable presentations or bare credentials. Each
//! credential subject declares its `type` tag; [`DocumentType`] is the closed
//! set of tags this issuer recognises and [`SubjectKind`] groups them into the
//! three extraction paths (service, resource, participant).
//!
//! Shapes accepted by [`credentials`]:
//!
//! ```text
//! { "selfDescriptionCredential": { "verifiableCredential": [ vc, ... ] }, ... }
//! { "verifiableCredential": [ vc, ... ] }
//! vc
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vocab;

/// Recognised credential-subject type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// `gx:ServiceOffering`
    #[serde(rename = "gx:ServiceOffering")]
    ServiceOffering,
    /// `gx:LegalParticipant`
    #[serde(rename = "gx:LegalParticipant")]
    LegalParticipant,
    /// `gx:PhysicalResource`
    #[serde(rename = "gx:PhysicalResource")]
    PhysicalResource,
    /// `gx:VirtualDataResource`
    #[serde(rename = "gx:VirtualDataResource")]
    VirtualDataResource,
    /// `gx:VirtualSoftwareResource`
    #[serde(rename = "gx:VirtualSoftwareResource")]
    VirtualSoftwareResource,
    /// `gx:InstantiatedVirtualResource`
    #[serde(rename = "gx:InstantiatedVirtualResource")]
    InstantiatedVirtualResource,
}

impl DocumentType {
    /// Every recognised type.
    pub const ALL: [DocumentType; 6] = [
        DocumentType::ServiceOffering,
        DocumentType::LegalParticipant,
        DocumentType::PhysicalResource,
        DocumentType::VirtualDataResource,
        DocumentType::VirtualSoftwareResource,
        DocumentType::InstantiatedVirtualResource,
    ];

    /// The declared tag, e.g. `gx:ServiceOffering`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ServiceOffering => "gx:ServiceOffering",
            Self::LegalParticipant => "gx:LegalParticipant",
            Self::PhysicalResource => "gx:PhysicalResource",
            Self::VirtualDataResource => "gx:VirtualDataResource",
            Self::VirtualSoftwareResource => "gx:VirtualSoftwareResource",
            Self::InstantiatedVirtualResource => "gx:InstantiatedVirtualResource",
        }
    }

    /// Parse a declared tag. The `gx:` prefix is optional.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let bare = tag.strip_prefix(vocab::GX_PREFIX).unwrap_or(tag);
        Self::ALL
            .into_iter()
            .find(|t| &t.tag()[vocab::GX_PREFIX.len()..] == bare)
    }

    /// Which extraction path handles this type.
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::ServiceOffering => SubjectKind::Service,
            Self::LegalParticipant => SubjectKind::Participant,
            Self::PhysicalResource
            | Self::VirtualDataResource
            | Self::VirtualSoftwareResource
            | Self::InstantiatedVirtualResource => SubjectKind::Resource,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Group of document types sharing an extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    /// Service offerings (dependsOn targets).
    Service,
    /// Physical and virtual resources (aggregationOf targets).
    Resource,
    /// Legal participants.
    Participant,
}

type NameExtractor = fn(&Value) -> Option<String>;

/// Name extraction per subject kind.
const NAME_EXTRACTORS: [(SubjectKind, NameExtractor); 3] = [
    (SubjectKind::Service, name_claim),
    (SubjectKind::Resource, name_claim),
    (SubjectKind::Participant, legal_name_claim),
];

impl SubjectKind {
    /// Whether a subject of type `doc_type` belongs to this kind.
    pub fn accepts(&self, doc_type: DocumentType) -> bool {
        doc_type.kind() == *self
    }

    /// Extract the human-readable name of a subject of this kind.
    pub fn name_of(&self, subject: &Value) -> Option<String> {
        NAME_EXTRACTORS
            .iter()
            .find(|(kind, _)| kind == self)
            .and_then(|(_, extract)| extract(subject))
    }
}

fn name_claim(subject: &Value) -> Option<String> {
    vocab::NAME
        .get_in(subject)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn legal_name_claim(subject: &Value) -> Option<String> {
    vocab::LEGAL_NAME
        .get_in(subject)
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| name_claim(subject))
}

// -- Traversal ----------------------------------------------------------------

/// The verifiable credentials carried by `doc`.
pub fn credentials(doc: &Value) -> Vec<&Value> {
    let wrapped = doc
        .get(vocab::SELF_DESCRIPTION_CREDENTIAL)
        .and_then(|sd| sd.get(vocab::VERIFIABLE_CREDENTIAL))
        .or_else(|| doc.get(vocab::VERIFIABLE_CREDENTIAL));
    match wrapped {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => vec![doc],
    }
}

/// Every credential subject carried by `doc`.
pub fn subjects(doc: &Value) -> Vec<&Value> {
    credentials(doc)
        .into_iter()
        .flat_map(|vc| match vc.get(vocab::CREDENTIAL_SUBJECT) {
            Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
            Some(subject @ Value::Object(_)) => vec![subject],
            _ => Vec::new(),
        })
        .collect()
}

/// The first recognised type tag declared by `subject` (`type` or `@type`,
/// scalar or list).
pub fn subject_type(subject: &Value) -> Option<DocumentType> {
    let declared = subject
        .get(vocab::TYPE)
        .or_else(|| subject.get(vocab::AT_TYPE))?;
    match declared {
        Value::String(tag) => DocumentType::from_tag(tag),
        Value::Array(tags) => tags
            .iter()
            .filter_map(Value::as_str)
            .find_map(DocumentType::from_tag),
        _ => None,
    }
}

/// The first subject in `doc` of the given kind.
pub fn find_subject(doc: &Value, kind: SubjectKind) -> Option<&Value> {
    subjects(doc)
        .into_iter()
        .find(|s| subject_type(s).is_some_and(|t| kind.accepts(t)))
}

/// The first subject in `doc` with exactly the given type.
pub fn find_subject_of_type(doc: &Value, doc_type: DocumentType) -> Option<&Value> {
    subjects(doc)
        .into_iter()
        .find(|s| subject_type(s) == Some(doc_type))
}

/// Name of the first subject of `kind` in `doc`.
pub fn subject_name(doc: &Value, kind: SubjectKind) -> Option<String> {
    find_subject(doc, kind).and_then(|s| kind.name_of(s))
}

/// Whether `key` occurs as an object key anywhere in the tree.
pub fn contains_key_anywhere(doc: &Value, key: &str) -> bool {
    match doc {
        Value::Object(map) => {
            map.contains_key(key) || map.values().any(|v| contains_key_anywhere(v, key))
        }
        Value::Array(items) => items.iter().any(|v| contains_key_anywhere(v, key)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn presentation() -> Value {
        json!({
            "selfDescriptionCredential": {
                "verifiableCredential": [
                    {
                        "credentialSubject": {
                            "type": "gx:LegalParticipant",
                            "gx:legalName": "Acme SA"
                        }
                    },
                    {
                        "credentialSubject": {
                            "type": "gx:ServiceOffering",
                            "gx:name": "Storage API",
                            "gx:dataProtectionRegime": ["GDPR2016"]
                        },
                        "proof": {"jws": "x"}
                    }
                ]
            },
            "complianceCredential": {"id": "https://compliance/1"}
        })
    }

    #[test]
    fn tag_round_trip_and_bare_tags() {
        for t in DocumentType::ALL {
            assert_eq!(DocumentType::from_tag(t.tag()), Some(t));
        }
        assert_eq!(
            DocumentType::from_tag("PhysicalResource"),
            Some(DocumentType::PhysicalResource)
        );
        assert_eq!(DocumentType::from_tag("gx:Unknown"), None);
    }

    #[test]
    fn kinds() {
        assert_eq!(DocumentType::ServiceOffering.kind(), SubjectKind::Service);
        assert_eq!(DocumentType::LegalParticipant.kind(), SubjectKind::Participant);
        assert_eq!(
            DocumentType::InstantiatedVirtualResource.kind(),
            SubjectKind::Resource
        );
    }

    #[test]
    fn finds_subjects_inside_presentation() {
        let doc = presentation();
        assert_eq!(subjects(&doc).len(), 2);
        assert_eq!(
            subject_name(&doc, SubjectKind::Service).as_deref(),
            Some("Storage API")
        );
        assert_eq!(
            subject_name(&doc, SubjectKind::Participant).as_deref(),
            Some("Acme SA")
        );
        assert!(find_subject(&doc, SubjectKind::Resource).is_none());
    }

    #[test]
    fn bare_credential_with_type_list() {
        let doc = json!({
            "credentialSubject": {
                "@type": ["Thing", "gx:VirtualDataResource"],
                "name": "Dataset"
            }
        });
        assert_eq!(
            subject_name(&doc, SubjectKind::Resource).as_deref(),
            Some("Dataset")
        );
    }

    #[test]
    fn key_search_descends_into_arrays() {
        let doc = json!({"a": [{"b": {"holderSignature": "sig"}}]});
        assert!(contains_key_anywhere(&doc, "holderSignature"));
        assert!(!contains_key_anywhere(&doc, "proof"));
    }
}
