//! Message broker client.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v1/publish/service-offer` | Publish a compliance credential |
//!
//! The broker answers `201 Created` with a `Location` header naming the
//! stored message. Any status is returned to the caller as a
//! [`PublishReceipt`]; interpreting it is the publisher's job.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;

/// Message published for a newly issued offering.
#[derive(Debug, Clone, Serialize)]
pub struct PublishMessage {
    /// Public base URL of this issuer.
    pub source: String,
    /// The compliance credential.
    pub data: Value,
}

/// Broker response status and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, if present.
    pub location: Option<String>,
}

/// Asynchronous messaging.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish `message`.
    async fn publish(&self, message: &PublishMessage) -> Result<PublishReceipt, ClientError>;
}

/// [`MessageBroker`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMessageBroker {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpMessageBroker {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl MessageBroker for HttpMessageBroker {
    async fn publish(&self, message: &PublishMessage) -> Result<PublishReceipt, ClientError> {
        let endpoint = "POST /v1/publish/service-offer";
        let url = crate::endpoint_url(&self.base_url, "v1/publish/service-offer", endpoint)?;

        let resp = self
            .http
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(PublishReceipt {
            status: resp.status().as_u16(),
            location,
        })
    }
}
