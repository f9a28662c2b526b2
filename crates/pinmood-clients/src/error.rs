//! Vendor client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("{service} credentials rejected: {source}")]
    Auth {
        service: &'static str,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(service: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: msg.into(),
        }
    }

    /// Wrap a failure to obtain credentials for `service`.
    pub fn auth(service: &'static str, source: ClientError) -> Self {
        Self::Auth {
            service,
            source: Box::new(source),
        }
    }

    /// True when the failure was obtaining credentials rather than the call itself.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Error detail suitable for an API error body.
    ///
    /// Vendor bodies are passed through as JSON when they parse, otherwise
    /// as a string.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            Self::Upstream { body, .. } => serde_json::from_str(body)
                .unwrap_or_else(|_| serde_json::Value::String(body.clone())),
            Self::Auth { source, .. } => source.detail(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}
