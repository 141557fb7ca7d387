//! Service-offering persistence operations.
//!
//! Matched standards live in `service_offer_standards` and are folded back
//! into [`ServiceOffer::standard_ids`] with an `array_agg` subquery.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use trustgate_core::{CredentialId, LabelLevelLink, OfferingId, ParticipantId, ServiceOffer};
use uuid::Uuid;

use crate::repository::{
    FilterColumn, FilterCriterion, FilterOperator, OfferingFilter, Page, SortColumn, SortDirection,
};

const SELECT: &str = "SELECT o.id, o.name, o.description, o.participant_id, o.credential_id,
        o.vc_url, o.label_level, o.veracity, o.message_reference_id, o.created_at, o.updated_at,
        COALESCE((SELECT array_agg(s.standard_id) FROM service_offer_standards s
                  WHERE s.offer_id = o.id), '{}') AS standard_ids
     FROM service_offers o";

/// Insert an offering row.
pub async fn insert<'e>(exec: impl PgExecutor<'e>, o: &ServiceOffer) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO service_offers (id, name, description, participant_id, credential_id, vc_url,
         label_level, veracity, message_reference_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(o.id.as_uuid())
    .bind(&o.name)
    .bind(&o.description)
    .bind(o.participant_id.as_uuid())
    .bind(o.credential_id.as_uuid())
    .bind(&o.vc_url)
    .bind(&o.label_level)
    .bind(&o.veracity)
    .bind(&o.message_reference_id)
    .bind(o.created_at)
    .bind(o.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

/// Link an offering to a matched standard.
pub async fn insert_standard<'e>(
    exec: impl PgExecutor<'e>,
    offer_id: OfferingId,
    standard_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO service_offer_standards (offer_id, standard_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(offer_id.as_uuid())
    .bind(standard_id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Insert the label/level join row.
pub async fn insert_label_level_link<'e>(
    exec: impl PgExecutor<'e>,
    link: &LabelLevelLink,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO service_label_levels (offer_id, participant_id, credential_id)
         VALUES ($1, $2, $3)",
    )
    .bind(link.offering_id.as_uuid())
    .bind(link.participant_id.as_uuid())
    .bind(link.credential_id.as_uuid())
    .execute(exec)
    .await?;
    Ok(())
}

/// Label/level join row of an offering.
pub async fn get_label_level_link<'e>(
    exec: impl PgExecutor<'e>,
    offer_id: OfferingId,
) -> Result<Option<LabelLevelLink>, sqlx::Error> {
    let row: Option<(Uuid, Uuid, Uuid)> = sqlx::query_as(
        "SELECT offer_id, participant_id, credential_id \
         FROM service_label_levels WHERE offer_id = $1",
    )
    .bind(offer_id.as_uuid())
    .fetch_optional(exec)
    .await?;
    Ok(row.map(|(o, p, c)| LabelLevelLink {
        offering_id: OfferingId::from_uuid(o),
        participant_id: ParticipantId::from_uuid(p),
        credential_id: CredentialId::from_uuid(c),
    }))
}

/// Fetch an offering by id.
pub async fn get_by_id<'e>(
    exec: impl PgExecutor<'e>,
    id: OfferingId,
) -> Result<Option<ServiceOffer>, sqlx::Error> {
    let row = sqlx::query_as::<_, OfferingRow>(&format!("{SELECT} WHERE o.id = $1"))
        .bind(id.as_uuid())
        .fetch_optional(exec)
        .await?;
    Ok(row.map(OfferingRow::into_record))
}

/// Attach the broker reference id.
pub async fn update_message_reference<'e>(
    exec: impl PgExecutor<'e>,
    id: OfferingId,
    reference: &str,
    updated_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE service_offers SET message_reference_id = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(reference)
    .bind(updated_at)
    .bind(id.as_uuid())
    .execute(exec)
    .await?;
    Ok(result.rows_affected() > 0)
}

fn column_sql(column: FilterColumn) -> &'static str {
    match column {
        FilterColumn::Name => "o.name",
        FilterColumn::Description => "o.description",
        FilterColumn::ParticipantId => "o.participant_id::text",
        FilterColumn::LabelLevel => "o.label_level",
    }
}

fn escape_like(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_criteria(qb: &mut QueryBuilder<'_, Postgres>, criteria: &[FilterCriterion]) {
    for (i, c) in criteria.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(column_sql(c.column));
        match c.operator {
            FilterOperator::Equals | FilterOperator::In => {
                qb.push(" = ANY(");
                qb.push_bind(c.values.clone());
                qb.push(")");
            }
            FilterOperator::Contain => {
                let patterns: Vec<String> = c.values.iter().map(|v| escape_like(v)).collect();
                qb.push(" ILIKE ANY(");
                qb.push_bind(patterns);
                qb.push(")");
            }
        }
    }
}

/// Filtered, sorted, paged offerings.
pub async fn filter<'e>(
    exec: impl PgExecutor<'e> + Copy,
    f: &OfferingFilter,
) -> Result<Page<ServiceOffer>, sqlx::Error> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM service_offers o");
    push_criteria(&mut count, &f.criteria);
    let (total,): (i64,) = count.build_query_as().fetch_one(exec).await?;

    let mut qb = QueryBuilder::<Postgres>::new(SELECT);
    push_criteria(&mut qb, &f.criteria);
    qb.push(match f.sort_column {
        SortColumn::Name => " ORDER BY o.name",
        SortColumn::CreatedAt => " ORDER BY o.created_at",
    });
    qb.push(match f.sort_direction {
        SortDirection::Asc => " ASC",
        SortDirection::Desc => " DESC",
    });
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(f.size));
    qb.push(" OFFSET ");
    qb.push_bind(i64::from(f.page) * i64::from(f.size));

    let rows: Vec<OfferingRow> = qb.build_query_as().fetch_all(exec).await?;
    let content = rows.into_iter().map(OfferingRow::into_record).collect();
    Ok(Page::new(content, f.page, f.size, total.max(0) as u64))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct OfferingRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    participant_id: Uuid,
    credential_id: Uuid,
    vc_url: String,
    label_level: Option<String>,
    veracity: Option<serde_json::Value>,
    message_reference_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    standard_ids: Vec<Uuid>,
}

impl OfferingRow {
    fn into_record(self) -> ServiceOffer {
        ServiceOffer {
            id: OfferingId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            participant_id: ParticipantId::from_uuid(self.participant_id),
            credential_id: CredentialId::from_uuid(self.credential_id),
            vc_url: self.vc_url,
            standard_ids: self.standard_ids,
            label_level: self.label_level,
            veracity: self.veracity,
            message_reference_id: self.message_reference_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(escape_like("a%b_c"), "%a\\%b\\_c%");
        assert_eq!(escape_like("api"), "%api%");
    }

    #[test]
    fn criteria_render_in_order() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM service_offers o");
        push_criteria(
            &mut qb,
            &[
                FilterCriterion {
                    column: FilterColumn::Name,
                    operator: FilterOperator::Contain,
                    values: vec!["x".into()],
                },
                FilterCriterion {
                    column: FilterColumn::ParticipantId,
                    operator: FilterOperator::Equals,
                    values: vec!["p".into()],
                },
            ],
        );
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM service_offers o \
             WHERE o.name ILIKE ANY($1) AND o.participant_id::text = ANY($2)"
        );
    }
}
