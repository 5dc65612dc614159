use crate::config::AgentSettings;
use crate::constants::DEFAULT_MAX_STEPS;
use crate::domain::types::ToolExchange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub max_steps: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl From<&AgentSettings> for AgentOptions {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            max_steps: settings.max_steps,
        }
    }
}

/// Successful end of a run: the answer plus every tool exchange, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub answer: String,
    pub steps: Vec<ToolExchange>,
}
