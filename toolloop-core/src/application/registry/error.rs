use thiserror::Error;

use crate::infrastructure::transport::TransportError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool registry '{registry}' is unreachable: {reason}")]
    Connectivity { registry: String, reason: String },
    #[error("tool '{tool}' is not offered by the registry")]
    UnknownTool { tool: String },
    #[error("tool '{tool}' failed: {message}")]
    Invocation { tool: String, message: String },
    #[error("registry listed tool '{tool}' more than once")]
    DuplicateTool { tool: String },
    #[error("registry request failed: {0}")]
    Transport(#[from] TransportError),
}

impl RegistryError {
    pub fn invocation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Stable identifier used in history lines and failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Connectivity { .. } => "ConnectivityError",
            RegistryError::UnknownTool { .. } => "UnknownToolError",
            RegistryError::Invocation { .. }
            | RegistryError::DuplicateTool { .. }
            | RegistryError::Transport(_) => "InvocationError",
        }
    }
}
