//! Secret store client.
//!
//! Per-participant key/value secrets. The issuer only uses the
//! [`PRIVATE_KEY_ENTRY`] entry.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/v1/secret/{participantId}` | Read all entries (404 = none) |
//! | POST   | `/v1/secret/{participantId}` | Merge entries |

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trustgate_core::ParticipantId;
use zeroize::Zeroizing;

use crate::error::ClientError;

/// Entry holding a participant's PKCS#8 signing key.
pub const PRIVATE_KEY_ENTRY: &str = "pkcs8.key";

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Key/value secret storage scoped by participant.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Every entry stored for `participant_id`; empty when none exist.
    async fn get(&self, participant_id: ParticipantId)
        -> Result<HashMap<String, String>, ClientError>;

    /// Merge `entries` into the participant's secrets.
    async fn put(
        &self,
        participant_id: ParticipantId,
        entries: &HashMap<String, String>,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SecretEnvelope {
    #[serde(default)]
    data: HashMap<String, String>,
}

/// [`SecretStore`] over HTTP.
#[derive(Clone)]
pub struct HttpSecretStore {
    http: reqwest::Client,
    base_url: url::Url,
    token: Zeroizing<String>,
}

impl std::fmt::Debug for HttpSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSecretStore")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HttpSecretStore {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, token: Zeroizing<String>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }
}

#[async_trait]
impl SecretStore for HttpSecretStore {
    async fn get(
        &self,
        participant_id: ParticipantId,
    ) -> Result<HashMap<String, String>, ClientError> {
        let endpoint = format!("GET /v1/secret/{participant_id}");
        let url = crate::endpoint_url(
            &self.base_url,
            &format!("v1/secret/{participant_id}"),
            &endpoint,
        )?;

        let resp = self
            .http
            .get(url)
            .header(TOKEN_HEADER, self.token.as_str())
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(HashMap::new());
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                endpoint,
                status,
                body,
            });
        }

        let envelope: SecretEnvelope = crate::decode_json(&endpoint, resp).await?;
        Ok(envelope.data)
    }

    async fn put(
        &self,
        participant_id: ParticipantId,
        entries: &HashMap<String, String>,
    ) -> Result<(), ClientError> {
        let endpoint = format!("POST /v1/secret/{participant_id}");
        let url = crate::endpoint_url(
            &self.base_url,
            &format!("v1/secret/{participant_id}"),
            &endpoint,
        )?;
        let body = SecretEnvelope {
            data: entries.clone(),
        };
        crate::send_checked(
            &endpoint,
            self.http
                .post(url)
                .header(TOKEN_HEADER, self.token.as_str())
                .json(&body),
        )
        .await?;
        tracing::info!(%participant_id, "secret entries stored");
        Ok(())
    }
}
