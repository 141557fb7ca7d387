//! Document host.
//!
//! Writes a generated document so that it becomes publicly retrievable at
//! `{public_host_url}{path}`. Writes are idempotent overwrites.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | PUT    | `/{path}` | Store or replace a document |

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

/// Publishes documents at deterministic paths.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Store `document` at `path` (relative, e.g. `{pid}/service_ab12.json`).
    async fn host(&self, path: &str, document: &Value) -> Result<(), ClientError>;
}

/// [`DocumentHost`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentHost {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpDocumentHost {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl DocumentHost for HttpDocumentHost {
    async fn host(&self, path: &str, document: &Value) -> Result<(), ClientError> {
        let endpoint = format!("PUT /{path}");
        let url = crate::endpoint_url(&self.base_url, path, &endpoint)?;
        crate::send_checked(&endpoint, self.http.put(url).json(document)).await?;
        tracing::debug!(path, "document hosted");
        Ok(())
    }
}
