//! Reference resolution for `aggregationOf` and `dependsOn` claims.
//!
//! Two modes:
//!
//! - [`resolve`] is a validation gate. Every reference must be fetchable and
//!   parse as JSON (and carry any required field), or the whole request
//!   fails with the caller's error code.
//! - [`resolve_named`] enriches read views. Failures are logged and the
//!   reference keeps the name `"unknown"`, so the output has one node per
//!   input id.
//!
//! Both fetch every id of one call concurrently.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinSet;
use trustgate_client::{ClientError, DocumentFetcher};
use trustgate_core::document::{contains_key_anywhere, subject_name};
use trustgate_core::SubjectKind;

use super::IssuanceError;

/// Name given to references whose document could not be read.
pub const UNKNOWN_NAME: &str = "unknown";

/// Field every aggregated resource document must carry.
pub const HOLDER_SIGNATURE: &str = "holderSignature";

/// A referenced credential subject and its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceNode {
    /// Credential-subject URL.
    #[serde(rename = "credentialSubjectId")]
    pub id: String,
    /// Subject name, or `"unknown"`.
    pub name: String,
}

fn spawn_fetches(
    fetcher: &Arc<dyn DocumentFetcher>,
    ids: &[String],
) -> JoinSet<(usize, Result<Value, ClientError>)> {
    let mut set = JoinSet::new();
    for (idx, id) in ids.iter().enumerate() {
        let fetcher = Arc::clone(fetcher);
        let id = id.clone();
        set.spawn(async move { (idx, fetcher.fetch_json(&id).await) });
    }
    set
}

/// Require every id to resolve.
///
/// # Errors
///
/// [`IssuanceError::BadData`] with `error_code` on the first failure: fetch
/// error, non-2xx status, unparsable body, or a missing required field.
pub async fn resolve(
    fetcher: &Arc<dyn DocumentFetcher>,
    ids: &[String],
    error_code: &str,
    required_fields: Option<&[&str]>,
) -> Result<(), IssuanceError> {
    let mut set = spawn_fetches(fetcher, ids);

    while let Some(joined) = set.join_next().await {
        let (idx, result) =
            joined.map_err(|e| IssuanceError::Invariant(format!("resolver task failed: {e}")))?;
        let url = ids.get(idx).map(String::as_str).unwrap_or_default();

        let doc = match result {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(%url, error = %e, code = error_code, "reference did not resolve");
                return Err(IssuanceError::BadData(error_code.to_string()));
            }
        };

        if let Some(missing) = required_fields
            .unwrap_or_default()
            .iter()
            .find(|field| !contains_key_anywhere(&doc, field))
        {
            tracing::warn!(
                %url,
                field = %missing,
                code = error_code,
                "reference lacks required field"
            );
            return Err(IssuanceError::BadData(error_code.to_string()));
        }
    }
    Ok(())
}

/// Resolve display names, tolerating failures.
pub async fn resolve_named(
    fetcher: &Arc<dyn DocumentFetcher>,
    ids: &[String],
    kind: SubjectKind,
) -> Vec<ReferenceNode> {
    let mut nodes: Vec<ReferenceNode> = ids
        .iter()
        .map(|id| ReferenceNode {
            id: id.clone(),
            name: UNKNOWN_NAME.to_string(),
        })
        .collect();

    let mut set = spawn_fetches(fetcher, ids);
    while let Some(joined) = set.join_next().await {
        let (idx, result) = match joined {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "name resolution task failed");
                continue;
            }
        };
        let Some(node) = nodes.get_mut(idx) else {
            continue;
        };
        match result {
            Ok(doc) => match subject_name(&doc, kind) {
                Some(name) => node.name = name,
                None => tracing::warn!(
                    url = %node.id,
                    ?kind,
                    "referenced document has no named subject"
                ),
            },
            Err(e) => tracing::warn!(url = %node.id, error = %e, "reference name lookup failed"),
        }
    }
    nodes
}
