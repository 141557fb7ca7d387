//! Remote document fetch.
//!
//! Plain `GET` of an absolute URL. Used to resolve aggregation/dependsOn
//! references, to re-read hosted offerings and policies, and to hash the
//! terms-and-conditions document.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

/// Fetches remote documents by URL.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// `GET url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value, ClientError>;

    /// `GET url` and return the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, ClientError>;
}

/// [`DocumentFetcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    http: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub(crate) fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, ClientError> {
        let endpoint = format!("GET {url}");
        let resp = crate::send_checked(&endpoint, self.http.get(url)).await?;
        crate::decode_json(&endpoint, resp).await
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ClientError> {
        let endpoint = format!("GET {url}");
        let resp = crate::send_checked(&endpoint, self.http.get(url)).await?;
        resp.text().await.map_err(|e| ClientError::Deserialization {
            endpoint,
            source: e,
        })
    }
}
