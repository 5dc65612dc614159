use crate::domain::types::ToolInvocationRequest;

/// What a single model output asks the loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDirective {
    CallTool(ToolInvocationRequest),
    Final { answer: String },
}
