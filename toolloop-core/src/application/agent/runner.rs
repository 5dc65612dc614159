use std::sync::Arc;
use tracing::{info, warn};

use super::directive::AgentDirective;
use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome};
use super::parser::parse_output;
use crate::application::gateway::ModelGateway;
use crate::application::prompt::PromptCompiler;
use crate::application::registry::ToolRegistryClient;
use crate::config::AppConfig;
use crate::domain::types::{
    ToolDescriptor, ToolExchange, ToolInvocationRequest, ToolInvocationResult,
};
use crate::infrastructure::model::ProviderFactory;

/// Where a run currently stands.
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    Dispatching(ToolInvocationRequest),
    Done(String),
}

/// Drives one question from prompt to final answer.
///
/// Every run lists tools afresh and owns its conversation history; nothing is
/// carried over between runs.
pub struct Orchestrator {
    registry: Arc<ToolRegistryClient>,
    gateway: ModelGateway,
    compiler: PromptCompiler,
    options: AgentOptions,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ToolRegistryClient>,
        gateway: ModelGateway,
        compiler: PromptCompiler,
        options: AgentOptions,
    ) -> Self {
        Self {
            registry,
            gateway,
            compiler,
            options,
        }
    }

    /// Wires the configured model provider, registry transport and prompt.
    pub fn from_config(config: &AppConfig) -> Result<Self, AgentError> {
        let registry = ToolRegistryClient::from_settings(&config.registry)?;
        let gateway = ModelGateway::new(
            ProviderFactory::create(&config.model),
            config.model.timeout,
        );
        Ok(Self::new(
            Arc::new(registry),
            gateway,
            PromptCompiler::new(config.prompt.clone()),
            AgentOptions::from(&config.agent),
        ))
    }

    pub fn registry(&self) -> &ToolRegistryClient {
        &self.registry
    }

    pub fn compiler(&self) -> &PromptCompiler {
        &self.compiler
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Connects the registry and checks it answers a ping.
    pub async fn connect(&self) -> Result<(), AgentError> {
        self.registry.connect().await.map_err(AgentError::from)
    }

    /// Lists tools and renders the first prompt without calling the model.
    pub async fn initial_prompt(&self, question: &str) -> Result<String, AgentError> {
        let tools = self.registry.list_tools().await?;
        Ok(self.compiler.compile(&tools, &[], question))
    }

    pub async fn run(&self, question: &str) -> Result<AgentOutcome, AgentError> {
        let tools = self.registry.list_tools().await?;
        info!(
            registry = %self.registry.name(),
            tools = tools.len(),
            max_steps = self.options.max_steps,
            "Starting tool loop"
        );

        let mut history: Vec<ToolExchange> = Vec::new();
        let mut state = LoopState::AwaitingModel;
        loop {
            state = match state {
                LoopState::AwaitingModel => self.await_model(&tools, &history, question).await?,
                LoopState::Dispatching(request) => {
                    if history.len() >= self.options.max_steps {
                        warn!(
                            limit = self.options.max_steps,
                            tool = %request.tool_name,
                            "Step limit reached before a final answer"
                        );
                        return Err(AgentError::StepLimitExceeded {
                            limit: self.options.max_steps,
                        });
                    }
                    let exchange = self.dispatch(request, history.len() + 1).await;
                    history.push(exchange);
                    LoopState::AwaitingModel
                }
                LoopState::Done(answer) => {
                    info!(steps = history.len(), "Tool loop finished");
                    return Ok(AgentOutcome {
                        answer,
                        steps: history,
                    });
                }
            };
        }
    }

    async fn await_model(
        &self,
        tools: &[ToolDescriptor],
        history: &[ToolExchange],
        question: &str,
    ) -> Result<LoopState, AgentError> {
        let prompt = self.compiler.compile(tools, history, question);
        let output = self.gateway.generate(&prompt).await?;
        match parse_output(&output)? {
            AgentDirective::CallTool(request) => {
                info!(tool = %request.tool_name, "Model requested a tool");
                Ok(LoopState::Dispatching(request))
            }
            AgentDirective::Final { answer } => Ok(LoopState::Done(answer)),
        }
    }

    /// Invokes the tool and folds any registry failure into the exchange.
    async fn dispatch(&self, request: ToolInvocationRequest, step: usize) -> ToolExchange {
        let result = match self
            .registry
            .invoke(&request.tool_name, &request.arguments)
            .await
        {
            Ok(payload) => {
                info!(step, tool = %request.tool_name, "Tool call succeeded");
                ToolInvocationResult::Success(payload)
            }
            Err(err) => {
                warn!(
                    step,
                    tool = %request.tool_name,
                    kind = err.kind(),
                    %err,
                    "Tool call failed, reporting it to the model"
                );
                ToolInvocationResult::from(&err)
            }
        };
        ToolExchange { request, result }
    }
}
