//! # toolloop-core
//!
//! A small orchestration loop that lets a text-generation model call tools
//! from an MCP registry through a line-oriented protocol:
//!
//! ```text
//! FUNCTION_CALL: obtain_product_from_db|product_id=2
//! FINAL_ANSWER: Product 2 is a Coffee Mug
//! ```
//!
//! ## Layout
//!
//! - [`application::registry`] lists and invokes tools
//! - [`application::prompt`] compiles the instruction prompt
//! - [`application::gateway`] bounds each model call with a timeout
//! - [`application::agent`] parses model output and drives the loop
//! - [`infrastructure`] holds model clients and MCP transports
//! - [`config`] loads `config/toolloop.toml`

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::agent::{
    AgentDirective, AgentError, AgentOptions, AgentOutcome, Orchestrator, ParseError,
    parse_output, parse_text,
};
pub use application::gateway::{GatewayFailure, ModelGateway};
pub use application::prompt::{PromptCompiler, compile};
pub use application::registry::{LocalProvider, RegistryError, ToolRegistryClient};
pub use config::{AppConfig, ConfigError};
pub use domain::types::{
    Argument, Arguments, ModelOutput, ToolDescriptor, ToolExchange, ToolInvocationRequest,
    ToolInvocationResult, ToolParameter,
};
pub use infrastructure::model::{ModelClient, ModelError, ProviderFactory};
pub use infrastructure::transport::{RemoteTool, ToolProvider, TransportError};
