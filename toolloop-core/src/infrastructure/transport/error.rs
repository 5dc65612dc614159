use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' HTTP request failed: {source}")]
    Http {
        server: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("tool server '{server}' answered with HTTP status {status}")]
    Status { server: String, status: u16 },
    #[error("tool server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool server '{server}' sent a malformed message: {message}")]
    Protocol { server: String, message: String },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' did not answer '{method}' within {after:?}")]
    Timeout {
        server: String,
        method: String,
        after: Duration,
    },
    #[error("tool server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("tool server '{server}' request cancelled")]
    Cancelled { server: String },
}

impl TransportError {
    pub fn transport(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn protocol(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            server: server.into(),
            message: message.into(),
        }
    }

    /// True when the failure means the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            TransportError::Spawn { .. } | TransportError::Terminated { .. } => true,
            TransportError::Http { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }
}
