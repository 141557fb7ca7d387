//! # trustgate-client: Typed clients for the issuer's collaborators
//!
//! Every external call the issuance pipeline makes goes through this crate:
//!
//! - **Remote document fetch** ([`fetch`]): credential subjects referenced by
//!   URL, hosted offerings, terms-and-conditions documents
//! - **Signer** ([`signer`]): service-offer and label/level signing, service
//!   endpoint registration
//! - **Document host** ([`hosting`]): publishes generated documents at their
//!   public URL
//! - **Message broker** ([`broker`]): compliance publish
//! - **Secret store** ([`vault`]): per-participant signing keys
//!
//! Each collaborator is an object-safe trait with one reqwest-backed
//! implementation, so the pipeline can be driven against any backend.
//!
//! ## Failure model
//!
//! No call retries. Timeouts come from the shared `reqwest::Client`
//! (`HTTP_TIMEOUT_SECS`). Non-2xx responses surface as
//! [`ClientError::Status`] except for the broker, whose status the caller
//! interprets.

pub mod broker;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hosting;
pub mod signer;
pub mod vault;

pub use broker::{HttpMessageBroker, MessageBroker, PublishMessage, PublishReceipt};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use fetch::{DocumentFetcher, HttpDocumentFetcher};
pub use hosting::{DocumentHost, HttpDocumentHost};
pub use signer::{HttpSigner, ServiceSignRequest, SignedService, Signer, SigningContext};
pub use vault::{HttpSecretStore, SecretStore, PRIVATE_KEY_ENTRY};

use std::time::Duration;

/// Top-level collaborator client. Holds one sub-client per collaborator.
#[derive(Debug, Clone)]
pub struct TrustClient {
    fetcher: HttpDocumentFetcher,
    signer: HttpSigner,
    host: HttpDocumentHost,
    broker: HttpMessageBroker,
    vault: HttpSecretStore,
}

impl TrustClient {
    /// Create the clients from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            fetcher: HttpDocumentFetcher::new(http.clone()),
            signer: HttpSigner::new(http.clone(), config.signer_url),
            host: HttpDocumentHost::new(http.clone(), config.hosting_url),
            broker: HttpMessageBroker::new(http.clone(), config.broker_url),
            vault: HttpSecretStore::new(http, config.vault_url, config.vault_token),
        })
    }

    /// Remote document fetch client.
    pub fn fetcher(&self) -> &HttpDocumentFetcher {
        &self.fetcher
    }

    /// Signer client.
    pub fn signer(&self) -> &HttpSigner {
        &self.signer
    }

    /// Document host client.
    pub fn host(&self) -> &HttpDocumentHost {
        &self.host
    }

    /// Message broker client.
    pub fn broker(&self) -> &HttpMessageBroker {
        &self.broker
    }

    /// Secret store client.
    pub fn vault(&self) -> &HttpSecretStore {
        &self.vault
    }
}

// -- Shared request plumbing --------------------------------------------------

/// Send `req` and reject non-2xx responses.
pub(crate) async fn send_checked(
    endpoint: &str,
    req: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ClientError> {
    let resp = req.send().await.map_err(|e| ClientError::Http {
        endpoint: endpoint.into(),
        source: e,
    })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            endpoint: endpoint.into(),
            status,
            body,
        });
    }
    Ok(resp)
}

/// Decode a JSON response body.
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    resp.json().await.map_err(|e| ClientError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}

/// Resolve `path` against `base`, tolerating a missing trailing slash on
/// the base.
pub(crate) fn endpoint_url(
    base: &url::Url,
    path: &str,
    endpoint: &str,
) -> Result<url::Url, ClientError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ClientError::InvalidUrl {
            endpoint: endpoint.into(),
            reason: e.to_string(),
        })
}
