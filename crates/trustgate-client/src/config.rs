//! Collaborator client configuration.
//!
//! Base URLs for every external service the issuer talks to. Loaded from the
//! environment in production; [`ClientConfig::local_mock`] points everything
//! at localhost for tests.

use url::Url;
use zeroize::Zeroizing;

/// Default service-endpoint type registered for hosted offerings.
pub const DEFAULT_LINK_DOMAIN_TYPE: &str = "LinkedDomains";

/// Configuration for the collaborator clients.
///
/// Custom `Debug` implementation redacts the `vault_token` field to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Public base URL under which hosted documents are served
    /// (`{public_host_url}{participantId}/{name}.json`).
    pub public_host_url: Url,
    /// Base URL of the signer service.
    pub signer_url: Url,
    /// Base URL of the document host (write side of `public_host_url`).
    pub hosting_url: Url,
    /// Base URL of the message broker.
    pub broker_url: Url,
    /// Base URL of the secret store.
    pub vault_url: Url,
    /// Secret-store token. Zeroized on drop.
    pub vault_token: Zeroizing<String>,
    /// Service-endpoint type registered after signing.
    pub link_domain_type: String,
    /// Request timeout in seconds, applied to every outbound call.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("public_host_url", &self.public_host_url)
            .field("signer_url", &self.signer_url)
            .field("hosting_url", &self.hosting_url)
            .field("broker_url", &self.broker_url)
            .field("vault_url", &self.vault_url)
            .field("vault_token", &"[REDACTED]")
            .field("link_domain_type", &self.link_domain_type)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PUBLIC_HOST_URL` (default: `http://localhost:8080/hosted/`)
    /// - `SIGNER_URL` (default: `http://localhost:8081`)
    /// - `HOSTING_URL` (default: `http://localhost:8082`)
    /// - `BROKER_URL` (default: `http://localhost:8083`)
    /// - `VAULT_URL` (default: `http://localhost:8200`)
    /// - `VAULT_TOKEN` (required)
    /// - `LINK_DOMAIN_TYPE` (default: `LinkedDomains`)
    /// - `HTTP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let vault_token = std::env::var("VAULT_TOKEN").map_err(|_| ConfigError::MissingToken)?;

        Ok(Self {
            public_host_url: env_url("PUBLIC_HOST_URL", "http://localhost:8080/hosted/")?,
            signer_url: env_url("SIGNER_URL", "http://localhost:8081")?,
            hosting_url: env_url("HOSTING_URL", "http://localhost:8082")?,
            broker_url: env_url("BROKER_URL", "http://localhost:8083")?,
            vault_url: env_url("VAULT_URL", "http://localhost:8200")?,
            vault_token: Zeroizing::new(vault_token),
            link_domain_type: std::env::var("LINK_DOMAIN_TYPE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LINK_DOMAIN_TYPE.to_string()),
            timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Point every collaborator at one local base URL (for testing against a
    /// single mock server).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base` cannot be parsed.
    pub fn local_mock(base: &str, token: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base)
            .map_err(|e| ConfigError::InvalidUrl("local_mock".to_string(), e.to_string()))?;
        let public_host_url = base_url
            .join("hosted/")
            .map_err(|e| ConfigError::InvalidUrl("local_mock".to_string(), e.to_string()))?;
        Ok(Self {
            public_host_url,
            signer_url: base_url.clone(),
            hosting_url: base_url.clone(),
            broker_url: base_url.clone(),
            vault_url: base_url,
            vault_token: Zeroizing::new(token.to_string()),
            link_domain_type: DEFAULT_LINK_DOMAIN_TYPE.to_string(),
            timeout_secs: 5,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `VAULT_TOKEN` is unset.
    #[error("VAULT_TOKEN environment variable is required")]
    MissingToken,
    /// A URL variable failed to parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
