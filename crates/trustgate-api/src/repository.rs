//! # Offering Repository
//!
//! Persistence contract for participants, credentials, offerings,
//! label/level links and master data, with two implementations:
//!
//! - [`MemoryRepository`]: a single `parking_lot::RwLock` over all tables,
//!   for development and tests.
//! - [`crate::db::PgRepository`]: Postgres via sqlx.
//!
//! ## Unit of work
//!
//! The issuance pipeline never writes piecemeal. Every row it produces is
//! staged in an [`IssuanceBatch`] and written by one [`OfferingRepository::commit`]
//! call: one SQL transaction, or one write-lock section in memory. Either the
//! offering and all its credentials persist, or none of them do.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trustgate_core::{
    CredentialId, CredentialRecord, CredentialType, Did, LabelLevelLink, OfferingId, Participant,
    ParticipantId, ServiceOffer, StandardType,
};
use uuid::Uuid;

/// Repository failures.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back to a domain record.
    #[error("corrupt row in {table}: {reason}")]
    CorruptRow {
        /// Source table.
        table: &'static str,
        /// Mapping failure.
        reason: String,
    },
}

// -- Unit of work -------------------------------------------------------------

/// Rows produced by one issuance request, written atomically.
#[derive(Debug, Clone, Default)]
pub struct IssuanceBatch {
    /// Participant to insert or update (new registration, key stored).
    pub participant: Option<Participant>,
    /// New credential records. Never upserted.
    pub credentials: Vec<CredentialRecord>,
    /// The offering aggregate.
    pub offering: Option<ServiceOffer>,
    /// Label/level join row.
    pub label_level_link: Option<LabelLevelLink>,
}

impl IssuanceBatch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a credential and return its id.
    pub fn stage_credential(&mut self, record: CredentialRecord) -> CredentialId {
        let id = record.id;
        self.credentials.push(record);
        id
    }

    /// Whether nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.participant.is_none()
            && self.credentials.is_empty()
            && self.offering.is_none()
            && self.label_level_link.is_none()
    }
}

// -- Filtering ----------------------------------------------------------------

/// Filterable offering columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterColumn {
    /// `name`
    Name,
    /// `description`
    Description,
    /// `participantId`
    ParticipantId,
    /// `labelLevel`
    LabelLevel,
}

/// Filter operators.
///
/// `EQUALS` and `IN` match when the column equals any of the values;
/// `CONTAIN` matches a case-insensitive substring of any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    /// Exact match.
    Equals,
    /// Case-insensitive substring match.
    Contain,
    /// Membership.
    In,
}

/// One filter criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriterion {
    /// Column to test.
    pub column: FilterColumn,
    /// Operator.
    pub operator: FilterOperator,
    /// Operand values.
    pub values: Vec<String>,
}

/// Sortable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    /// `name`
    Name,
    /// `createdAt`
    CreatedAt,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// A normalized offering query. All criteria are conjoined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferingFilter {
    /// Criteria, conjoined.
    pub criteria: Vec<FilterCriterion>,
    /// Sort column.
    pub sort_column: SortColumn,
    /// Sort direction.
    pub sort_direction: SortDirection,
    /// Zero-based page index.
    pub page: u32,
    /// Page size, already clamped.
    pub size: u32,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows on this page.
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Total matching rows.
    pub total_elements: u64,
    /// Total pages.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assemble a page from its rows and the total match count.
    pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            u32::try_from(total_elements.div_ceil(u64::from(size))).unwrap_or(u32::MAX)
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    /// Map the rows, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

// -- Contract -----------------------------------------------------------------

/// Storage capability used by the pipeline and the query side.
#[async_trait]
pub trait OfferingRepository: Send + Sync {
    /// Participant by id.
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, RepositoryError>;

    /// Participant by DID.
    async fn participant_by_did(&self, did: &Did) -> Result<Option<Participant>, RepositoryError>;

    /// Most recent credential of `credential_type` owned by `participant_id`.
    async fn latest_credential(
        &self,
        participant_id: ParticipantId,
        credential_type: CredentialType,
    ) -> Result<Option<CredentialRecord>, RepositoryError>;

    /// Credential by id.
    async fn credential(
        &self,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, RepositoryError>;

    /// Every credential owned by `participant_id`, oldest first.
    async fn credentials_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<CredentialRecord>, RepositoryError>;

    /// Whether any credential is already addressed by `vc_url`.
    async fn credential_url_exists(&self, vc_url: &str) -> Result<bool, RepositoryError>;

    /// Write a batch atomically.
    async fn commit(&self, batch: IssuanceBatch) -> Result<(), RepositoryError>;

    /// Offering by id.
    async fn offering(&self, id: OfferingId) -> Result<Option<ServiceOffer>, RepositoryError>;

    /// Attach the broker reference to an offering. Returns whether a row
    /// was updated.
    async fn set_message_reference(
        &self,
        id: OfferingId,
        reference: &str,
    ) -> Result<bool, RepositoryError>;

    /// Filtered, sorted, paged offerings.
    async fn filter_offerings(
        &self,
        filter: &OfferingFilter,
    ) -> Result<Page<ServiceOffer>, RepositoryError>;

    /// Label/level link of an offering.
    async fn label_level_link(
        &self,
        offering_id: OfferingId,
    ) -> Result<Option<LabelLevelLink>, RepositoryError>;

    /// Standard master rows whose type name is in `names`.
    async fn standards_by_type(
        &self,
        names: &[String],
    ) -> Result<Vec<StandardType>, RepositoryError>;

    /// Subdivision names for ISO 3166-2 `codes`, in code order; unknown
    /// codes are skipped.
    async fn subdivision_names(&self, codes: &[String]) -> Result<Vec<String>, RepositoryError>;
}

/// Shared handle to a repository implementation.
pub type DynRepository = Arc<dyn OfferingRepository>;

// -- In-memory implementation -------------------------------------------------

#[derive(Debug, Default)]
struct Tables {
    participants: HashMap<Uuid, Participant>,
    credentials: HashMap<Uuid, CredentialRecord>,
    offerings: HashMap<Uuid, ServiceOffer>,
    label_level_links: HashMap<Uuid, LabelLevelLink>,
    standards: Vec<StandardType>,
    subdivisions: HashMap<String, String>,
}

/// In-memory [`OfferingRepository`].
///
/// All tables sit behind one `RwLock` so a batch commit is a single write
/// section. The lock is never held across `.await`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed data-protection standards by type name.
    pub fn with_standards<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut t = self.tables.write();
            for name in names {
                t.standards.push(StandardType {
                    id: Uuid::new_v4(),
                    type_name: name.into(),
                });
            }
        }
        self
    }

    /// Seed subdivision code → name rows.
    pub fn with_subdivisions<I, C, N>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        {
            let mut t = self.tables.write();
            for (code, name) in rows {
                t.subdivisions.insert(code.into(), name.into());
            }
        }
        self
    }

    /// Register a participant directly.
    pub fn insert_participant(&self, participant: Participant) {
        self.tables
            .write()
            .participants
            .insert(*participant.id.as_uuid(), participant);
    }

    /// Store a credential directly.
    pub fn insert_credential(&self, record: CredentialRecord) {
        self.tables
            .write()
            .credentials
            .insert(*record.id.as_uuid(), record);
    }

    /// Number of stored offerings.
    pub fn offering_count(&self) -> usize {
        self.tables.read().offerings.len()
    }

    /// Number of stored credentials.
    pub fn credential_count(&self) -> usize {
        self.tables.read().credentials.len()
    }
}

fn column_value(offer: &ServiceOffer, column: FilterColumn) -> Option<String> {
    match column {
        FilterColumn::Name => Some(offer.name.clone()),
        FilterColumn::Description => offer.description.clone(),
        FilterColumn::ParticipantId => Some(offer.participant_id.to_string()),
        FilterColumn::LabelLevel => offer.label_level.clone(),
    }
}

fn matches(offer: &ServiceOffer, criterion: &FilterCriterion) -> bool {
    let Some(actual) = column_value(offer, criterion.column) else {
        return false;
    };
    match criterion.operator {
        FilterOperator::Equals | FilterOperator::In => {
            criterion.values.iter().any(|v| *v == actual)
        }
        FilterOperator::Contain => {
            let haystack = actual.to_lowercase();
            criterion
                .values
                .iter()
                .any(|v| haystack.contains(&v.to_lowercase()))
        }
    }
}

#[async_trait]
impl OfferingRepository for MemoryRepository {
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, RepositoryError> {
        Ok(self.tables.read().participants.get(id.as_uuid()).cloned())
    }

    async fn participant_by_did(&self, did: &Did) -> Result<Option<Participant>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .participants
            .values()
            .find(|p| p.did == *did)
            .cloned())
    }

    async fn latest_credential(
        &self,
        participant_id: ParticipantId,
        credential_type: CredentialType,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .credentials
            .values()
            .filter(|c| c.participant_id == participant_id && c.credential_type == credential_type)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn credential(
        &self,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        Ok(self.tables.read().credentials.get(id.as_uuid()).cloned())
    }

    async fn credentials_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<CredentialRecord>, RepositoryError> {
        let mut rows: Vec<CredentialRecord> = self
            .tables
            .read()
            .credentials
            .values()
            .filter(|c| c.participant_id == participant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn credential_url_exists(&self, vc_url: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .read()
            .credentials
            .values()
            .any(|c| c.vc_url == vc_url))
    }

    async fn commit(&self, batch: IssuanceBatch) -> Result<(), RepositoryError> {
        let mut t = self.tables.write();
        if let Some(p) = batch.participant {
            t.participants.insert(*p.id.as_uuid(), p);
        }
        for c in batch.credentials {
            t.credentials.insert(*c.id.as_uuid(), c);
        }
        if let Some(o) = batch.offering {
            t.offerings.insert(*o.id.as_uuid(), o);
        }
        if let Some(link) = batch.label_level_link {
            t.label_level_links.insert(*link.offering_id.as_uuid(), link);
        }
        Ok(())
    }

    async fn offering(&self, id: OfferingId) -> Result<Option<ServiceOffer>, RepositoryError> {
        Ok(self.tables.read().offerings.get(id.as_uuid()).cloned())
    }

    async fn set_message_reference(
        &self,
        id: OfferingId,
        reference: &str,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write();
        match t.offerings.get_mut(id.as_uuid()) {
            Some(offer) => {
                offer.message_reference_id = Some(reference.to_string());
                offer.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn filter_offerings(
        &self,
        filter: &OfferingFilter,
    ) -> Result<Page<ServiceOffer>, RepositoryError> {
        let mut rows: Vec<ServiceOffer> = self
            .tables
            .read()
            .offerings
            .values()
            .filter(|o| filter.criteria.iter().all(|c| matches(o, c)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ord = match filter.sort_column {
                SortColumn::Name => a.name.cmp(&b.name),
                SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            match filter.sort_direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = rows.len() as u64;
        let start = (filter.page as usize).saturating_mul(filter.size as usize);
        let content = rows
            .into_iter()
            .skip(start)
            .take(filter.size as usize)
            .collect();
        Ok(Page::new(content, filter.page, filter.size, total))
    }

    async fn label_level_link(
        &self,
        offering_id: OfferingId,
    ) -> Result<Option<LabelLevelLink>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .label_level_links
            .get(offering_id.as_uuid())
            .cloned())
    }

    async fn standards_by_type(
        &self,
        names: &[String],
    ) -> Result<Vec<StandardType>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .standards
            .iter()
            .filter(|s| names.contains(&s.type_name))
            .cloned()
            .collect())
    }

    async fn subdivision_names(&self, codes: &[String]) -> Result<Vec<String>, RepositoryError> {
        let t = self.tables.read();
        Ok(codes
            .iter()
            .filter_map(|c| t.subdivisions.get(c).cloned())
            .collect())
    }
}
