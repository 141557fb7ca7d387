//! Offering query side: filtered listing, live detail, policy locations.
//!
//! Listings come from the repository alone. The detail view re-reads the
//! hosted offering document, so it reflects what verifiers actually see:
//! terms-and-conditions URL, data-protection regimes, export metadata,
//! policy locations and the names of aggregated resources and depended-on
//! services.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trustgate_client::DocumentFetcher;
use trustgate_core::claims::reference_ids;
use trustgate_core::document::find_subject_of_type;
use trustgate_core::{vocab, DocumentType, OfferingId, ParticipantId, ServiceOffer, SubjectKind};

use super::resolver::{self, ReferenceNode};
use super::{policy, IssuanceError};
use crate::repository::{
    DynRepository, FilterColumn, FilterCriterion, FilterOperator, OfferingFilter, Page,
    SortColumn, SortDirection,
};

/// Page size when the request names none.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size served.
pub const MAX_PAGE_SIZE: u32 = 100;

pub(crate) const SERVICE_OFFER_NOT_FOUND: &str = "service.offer.not.found";

// -- Request/Response types ---------------------------------------------------

/// Sort clause of a filter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    /// Column to sort by.
    pub column: SortColumn,
    /// Direction; descending when absent.
    #[serde(default)]
    pub sort_type: SortDirection,
}

/// Body of the filter endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    /// Criteria, conjoined.
    #[serde(default)]
    pub criteria: Vec<FilterCriterion>,
    /// Sort clause; newest first when absent.
    #[serde(default)]
    pub sort: Option<SortSpec>,
    /// Zero-based page index.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size, capped at [`MAX_PAGE_SIZE`].
    #[serde(default)]
    pub size: Option<u32>,
}

impl FilterRequest {
    /// Normalize into a repository filter, conjoining the participant
    /// criterion when one is given.
    pub fn into_filter(self, participant_id: Option<ParticipantId>) -> OfferingFilter {
        let mut criteria = self.criteria;
        if let Some(pid) = participant_id {
            criteria.push(FilterCriterion {
                column: FilterColumn::ParticipantId,
                operator: FilterOperator::Equals,
                values: vec![pid.to_string()],
            });
        }
        let sort = self.sort.unwrap_or(SortSpec {
            column: SortColumn::CreatedAt,
            sort_type: SortDirection::Desc,
        });
        OfferingFilter {
            criteria,
            sort_column: sort.column,
            sort_direction: sort.sort_type,
            page: self.page.unwrap_or(0),
            size: self
                .size
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingSummary {
    /// Offering identifier.
    pub id: OfferingId,
    /// Caller-supplied name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Owning participant.
    pub participant_id: ParticipantId,
    /// Public URL of the signed offering.
    pub vc_url: String,
    /// Achieved conformity level, if a label/level was issued.
    pub label_level: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
}

impl From<ServiceOffer> for OfferingSummary {
    fn from(o: ServiceOffer) -> Self {
        Self {
            id: o.id,
            name: o.name,
            description: o.description,
            participant_id: o.participant_id,
            vc_url: o.vc_url,
            label_level: o.label_level,
            created_at: o.created_at,
        }
    }
}

/// Data export terms of an offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAccountExport {
    /// How an export is requested, e.g. `API` or `email`.
    pub request_type: Option<String>,
    /// `digital` or `physical`.
    pub access_type: Option<String>,
    /// Formats; a scalar claim becomes a one-element set.
    pub format_type: BTreeSet<String>,
}

/// Full offering view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingDetail {
    /// Offering identifier.
    pub id: OfferingId,
    /// Caller-supplied name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Owning participant.
    pub participant_id: ParticipantId,
    /// Public URL of the signed offering.
    pub vc_url: String,
    /// Achieved conformity level, if a label/level was issued.
    pub label_level: Option<String>,
    /// `trustIndex` from the signer's veracity data.
    pub trust_index: Option<f64>,
    /// Broker reference of the compliance publish, once it succeeded.
    pub message_reference_id: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// Terms-and-conditions URL of the hosted offering.
    pub tnc_url: Option<String>,
    /// Data-protection regimes claimed by the offering.
    pub protection_regime: Vec<String>,
    /// Data export terms, when the hosted offering carries them.
    pub data_account_export: Option<DataAccountExport>,
    /// Subdivision codes allowed by the offering's policy. Empty when the
    /// policy cannot be read.
    pub locations: BTreeSet<String>,
    /// Aggregated resources with their resolved names.
    pub resources: Vec<ReferenceNode>,
    /// Services the offering depends on, with their resolved names.
    pub depended_services: Vec<ReferenceNode>,
}

// -- Extraction ---------------------------------------------------------------

/// `trustIndex` of stored veracity data. A bare number is taken as the index.
pub fn trust_index(veracity: Option<&Value>) -> Option<f64> {
    match veracity? {
        Value::Number(n) => n.as_f64(),
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|v| trust_index(Some(&v)))
            .or_else(|| raw.parse().ok()),
        other => other.get(vocab::TRUST_INDEX).and_then(|t| match t {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }),
    }
}

/// A scalar or list of strings, as a list.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn data_account_export(subject: &Value) -> Option<DataAccountExport> {
    let export = vocab::DATA_ACCOUNT_EXPORT.get_in(subject)?;
    let text = |term: trustgate_core::Term| {
        term.get_in(export)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    Some(DataAccountExport {
        request_type: text(vocab::REQUEST_TYPE),
        access_type: text(vocab::ACCESS_TYPE),
        format_type: string_list(vocab::FORMAT_TYPE.get_in(export))
            .into_iter()
            .collect(),
    })
}

fn tnc_url(subject: &Value) -> Option<String> {
    let tnc = vocab::TERMS_AND_CONDITIONS.get_in(subject)?;
    let tnc = match tnc {
        Value::Array(items) => items.first()?,
        other => other,
    };
    vocab::URL
        .get_in(tnc)
        .and_then(Value::as_str)
        .map(str::to_string)
}

// -- Service ------------------------------------------------------------------

/// Read side over the repository and hosted documents.
#[derive(Clone)]
pub struct OfferingQuery {
    repository: DynRepository,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl std::fmt::Debug for OfferingQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferingQuery").finish_non_exhaustive()
    }
}

impl OfferingQuery {
    pub fn new(repository: DynRepository, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            repository,
            fetcher,
        }
    }

    /// Filtered, sorted, paged listing, optionally scoped to one participant.
    pub async fn filter(
        &self,
        request: FilterRequest,
        participant_id: Option<ParticipantId>,
    ) -> Result<Page<OfferingSummary>, IssuanceError> {
        let filter = request.into_filter(participant_id);
        let page = self.repository.filter_offerings(&filter).await?;
        Ok(page.map(OfferingSummary::from))
    }

    /// Offering detail, re-read from its hosted document.
    ///
    /// # Errors
    ///
    /// `service.offer.not.found` when no offering has `id`; upstream when
    /// the hosted document cannot be fetched.
    pub async fn get_by_id(&self, id: OfferingId) -> Result<OfferingDetail, IssuanceError> {
        let offer = self
            .repository
            .offering(id)
            .await?
            .ok_or_else(|| IssuanceError::NotFound(SERVICE_OFFER_NOT_FOUND.into()))?;

        let document = self
            .fetcher
            .fetch_json(&offer.vc_url)
            .await
            .map_err(|e| IssuanceError::upstream("document fetch", e))?;
        let subject = find_subject_of_type(&document, DocumentType::ServiceOffering);
        if subject.is_none() {
            tracing::warn!(
                offering_id = %id,
                url = %offer.vc_url,
                "hosted offering has no service-offering subject"
            );
        }

        let locations = match policy::locations_in(self.fetcher.as_ref(), &document).await {
            Ok(codes) => codes.into_iter().collect(),
            Err(e) => {
                tracing::warn!(offering_id = %id, error = %e, "policy locations unavailable");
                BTreeSet::new()
            }
        };

        let (resources, depended_services) = match subject {
            Some(s) => {
                let aggregation = vocab::AGGREGATION_OF
                    .get_in(s)
                    .map(reference_ids)
                    .unwrap_or_default();
                let depends_on = vocab::DEPENDS_ON
                    .get_in(s)
                    .map(reference_ids)
                    .unwrap_or_default();
                tokio::join!(
                    resolver::resolve_named(&self.fetcher, &aggregation, SubjectKind::Resource),
                    resolver::resolve_named(&self.fetcher, &depends_on, SubjectKind::Service),
                )
            }
            None => (Vec::new(), Vec::new()),
        };

        Ok(OfferingDetail {
            id: offer.id,
            name: offer.name,
            description: offer.description,
            participant_id: offer.participant_id,
            vc_url: offer.vc_url,
            label_level: offer.label_level,
            trust_index: trust_index(offer.veracity.as_ref()),
            message_reference_id: offer.message_reference_id,
            created_at: offer.created_at,
            tnc_url: subject.and_then(tnc_url),
            protection_regime: string_list(
                subject.and_then(|s| vocab::DATA_PROTECTION_REGIME.get_in(s)),
            ),
            data_account_export: subject.and_then(data_account_export),
            locations,
            resources,
            depended_services,
        })
    }

    /// Subdivision names allowed by the policy of the offering hosted at
    /// `offering_url`.
    pub async fn locations(&self, offering_url: &str) -> Result<Vec<String>, IssuanceError> {
        let codes = policy::locations_for_offering(self.fetcher.as_ref(), offering_url).await?;
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repository.subdivision_names(&codes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_request_defaults() {
        let f = FilterRequest::default().into_filter(None);
        assert_eq!(f.page, 0);
        assert_eq!(f.size, DEFAULT_PAGE_SIZE);
        assert_eq!(f.sort_column, SortColumn::CreatedAt);
        assert_eq!(f.sort_direction, SortDirection::Desc);
        assert!(f.criteria.is_empty());
    }

    #[test]
    fn page_size_is_capped() {
        let f = FilterRequest {
            size: Some(10_000),
            ..Default::default()
        }
        .into_filter(None);
        assert_eq!(f.size, MAX_PAGE_SIZE);
    }

    #[test]
    fn participant_criterion_is_conjoined() {
        let pid = ParticipantId::new();
        let req: FilterRequest = serde_json::from_value(json!({
            "criteria": [{"column": "name", "operator": "CONTAIN", "values": ["api"]}],
            "sort": {"column": "name", "sortType": "ASC"},
            "page": 2,
            "size": 5
        }))
        .unwrap();
        let f = req.into_filter(Some(pid));
        assert_eq!(f.criteria.len(), 2);
        assert_eq!(f.criteria[1].column, FilterColumn::ParticipantId);
        assert_eq!(f.criteria[1].values, vec![pid.to_string()]);
        assert_eq!(f.sort_column, SortColumn::Name);
        assert_eq!(f.sort_direction, SortDirection::Asc);
        assert_eq!((f.page, f.size), (2, 5));
    }

    #[test]
    fn trust_index_shapes() {
        assert_eq!(trust_index(Some(&json!({"trustIndex": 0.87}))), Some(0.87));
        assert_eq!(trust_index(Some(&json!({"trustIndex": "0.5"}))), Some(0.5));
        assert_eq!(trust_index(Some(&json!(0.7))), Some(0.7));
        assert_eq!(trust_index(Some(&json!(r#"{"trustIndex":0.9}"#))), Some(0.9));
        assert_eq!(trust_index(None), None);
    }

    #[test]
    fn export_format_scalar_becomes_singleton_set() {
        let subject = json!({"gx:dataAccountExport": {
            "gx:requestType": "API",
            "gx:accessType": "digital",
            "gx:formatType": "application/json"
        }});
        let export = data_account_export(&subject).unwrap();
        assert_eq!(export.request_type.as_deref(), Some("API"));
        assert_eq!(export.format_type.len(), 1);
    }

    #[test]
    fn tnc_url_from_object_or_list() {
        let s = json!({"gx:termsAndConditions": {"gx:URL": "https://t/c"}});
        assert_eq!(tnc_url(&s).as_deref(), Some("https://t/c"));
        let s = json!({"gx:termsAndConditions": [{"gx:URL": "https://t/d"}]});
        assert_eq!(tnc_url(&s).as_deref(), Some("https://t/d"));
    }
}
