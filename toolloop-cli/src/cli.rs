use clap::{Parser, ValueEnum};
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::time::Duration;
use toolloop_core::config::{AppConfig, ConfigError, TransportKind};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "toolloop",
    version,
    about = "Answer a question by letting a model call MCP tools"
)]
pub struct Cli {
    /// Path to toolloop.toml (defaults to config/toolloop.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = RunMode::Ask)]
    pub mode: RunMode,
    /// Model identifier override
    #[arg(long)]
    pub model: Option<String>,
    /// Per-call model timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Maximum number of tool calls per question
    #[arg(long)]
    pub max_steps: Option<usize>,
    /// Registry transport: http, stdio or builtin
    #[arg(long)]
    pub registry: Option<String>,
    /// Streamable-HTTP registry URL
    #[arg(long)]
    pub url: Option<String>,
    /// Read the question from a file
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
    pub question: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Run the tool loop and print the final answer
    Ask,
    /// Print the compiled tool block
    Tools,
    /// Print the first prompt without calling the model
    Prompt,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        if let Some(model) = self.model.as_deref().map(str::trim) {
            if model.is_empty() {
                return Err(ConfigError::MissingModel);
            }
            config.model.model = model.to_string();
        }
        if let Some(ms) = self.timeout_ms {
            if ms == 0 {
                return Err(ConfigError::ZeroValue {
                    field: "--timeout-ms",
                });
            }
            config.model.timeout = Duration::from_millis(ms);
        }
        if let Some(max_steps) = self.max_steps {
            if max_steps == 0 {
                return Err(ConfigError::ZeroValue {
                    field: "--max-steps",
                });
            }
            config.agent.max_steps = max_steps;
        }
        if let Some(name) = &self.registry {
            config.registry.transport =
                TransportKind::parse(name).ok_or_else(|| ConfigError::UnsupportedTransport {
                    transport: name.clone(),
                })?;
        }
        if let Some(url) = &self.url {
            config.registry.url = Some(url.clone());
        }
        config.registry.validate()
    }

    /// Question from `--prompt-file`, positional words, or piped stdin.
    pub fn load_question(&self) -> Result<String, Box<dyn Error>> {
        if let Some(path) = &self.prompt_file {
            info!(path = %path.display(), "Loading question from file");
            let content = fs::read_to_string(path)?;
            return non_empty(content);
        }

        if !self.question.is_empty() {
            return non_empty(self.question.join(" "));
        }

        if !io::stdin().is_terminal() {
            info!("Reading question from standard input");
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            return non_empty(buffer);
        }

        warn!("Question not provided via arguments, file, or stdin");
        Err("question required via arguments, --prompt-file, or stdin".into())
    }
}

fn non_empty(question: String) -> Result<String, Box<dyn Error>> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err("question is empty".into());
    }
    Ok(trimmed.to_string())
}
