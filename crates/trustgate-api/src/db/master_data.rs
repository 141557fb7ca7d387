//! Master-data lookups: data-protection standards and subdivision codes.

use sqlx::PgExecutor;
use trustgate_core::StandardType;
use uuid::Uuid;

/// Standards whose type name is in `names`.
pub async fn standards_by_type<'e>(
    exec: impl PgExecutor<'e>,
    names: &[String],
) -> Result<Vec<StandardType>, sqlx::Error> {
    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, type_name FROM standard_types WHERE type_name = ANY($1)")
            .bind(names)
            .fetch_all(exec)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, type_name)| StandardType { id, type_name })
        .collect())
}

/// Names of the given subdivision codes, in the order the codes were given.
pub async fn subdivision_names<'e>(
    exec: impl PgExecutor<'e>,
    codes: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT s.name FROM unnest($1::text[]) WITH ORDINALITY AS c(code, ord)
         JOIN subdivision_codes s ON s.code = c.code
         ORDER BY c.ord",
    )
    .bind(codes)
    .fetch_all(exec)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
