mod directive;
mod errors;
mod models;
pub mod parser;
mod runner;

pub use directive::AgentDirective;
pub use errors::AgentError;
pub use models::{AgentOptions, AgentOutcome};
pub use parser::{ParseError, parse_output, parse_text};
pub use runner::Orchestrator;
