//! Collaborator client error types.

/// Errors from outbound collaborator calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Endpoint label, e.g. `POST /v1/service-offers/sign`.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The collaborator returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// Endpoint label.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint label.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },
    /// A URL could not be built from the configured base.
    #[error("invalid URL for {endpoint}: {reason}")]
    InvalidUrl {
        /// Endpoint label.
        endpoint: String,
        /// Parse failure.
        reason: String,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl ClientError {
    /// Endpoint label of the failed call, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Http { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Deserialization { endpoint, .. }
            | Self::InvalidUrl { endpoint, .. } => Some(endpoint),
            Self::Config(_) => None,
        }
    }
}
