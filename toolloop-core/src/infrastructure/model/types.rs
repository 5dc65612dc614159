//! Model error type

use reqwest::StatusCode;
use thiserror::Error;

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
    #[error("generator '{provider}' failed: {message}")]
    Generator { provider: String, message: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn generator(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generator {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::MissingApiKey { .. } => "missing_api_key",
            ModelError::Network { .. } => "network",
            ModelError::InvalidResponse { .. } => "invalid_response",
            ModelError::Generator { .. } => "generator",
        }
    }

    /// Short human-readable explanation for failure reports
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' needs an API key. Check the configured env var.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to '{provider}' timed out.")
                } else if let Some(status) = source.status() {
                    match status {
                        StatusCode::NOT_FOUND => format!("Endpoint for '{provider}' not found."),
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            format!("Provider '{provider}' rejected the API key.")
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            format!("Provider '{provider}' is currently unavailable.")
                        }
                        _ => format!("Request to '{provider}' failed: {}", status.as_u16()),
                    }
                } else {
                    format!("Network error talking to '{provider}'.")
                }
            }
            ModelError::InvalidResponse { provider, reason } => {
                format!("Response from '{provider}' was not usable: {reason}")
            }
            ModelError::Generator { provider, message } => {
                format!("Generator '{provider}' failed: {message}")
            }
        }
    }
}
