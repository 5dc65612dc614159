use thiserror::Error;

use super::parser::ParseError;
use crate::application::gateway::GatewayFailure;
use crate::application::registry::RegistryError;

/// Fatal outcomes of one orchestration run.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Gateway(#[from] GatewayFailure),
    #[error(transparent)]
    Protocol(#[from] ParseError),
    #[error("no final answer after {limit} tool calls")]
    StepLimitExceeded { limit: usize },
}

impl AgentError {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Registry(err) => err.kind(),
            AgentError::Gateway(err) => err.kind(),
            AgentError::Protocol(err) => err.kind(),
            AgentError::StepLimitExceeded { .. } => "StepLimitExceeded",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AgentError::Registry(RegistryError::Connectivity { registry, .. }) => {
                format!("Tool registry '{registry}' cannot be reached. Is the server running?")
            }
            AgentError::Registry(err) => format!("Tool registry failed: {err}"),
            AgentError::Gateway(GatewayFailure::Timeout { after }) => {
                format!("The model did not answer within {}s.", after.as_secs_f32())
            }
            AgentError::Gateway(GatewayFailure::Model { message }) => message.clone(),
            AgentError::Protocol(ParseError::MalformedCall { reason }) => {
                format!("The model asked for a tool in a broken format ({reason}).")
            }
            AgentError::Protocol(ParseError::Unrecognized { .. }) => {
                "The model answered outside the tool protocol. Try rephrasing the question."
                    .to_string()
            }
            AgentError::StepLimitExceeded { limit } => {
                format!("Gave up after {limit} tool calls without a final answer.")
            }
        }
    }
}
