mod cli;

use clap::Parser;
use cli::{Cli, RunMode};
use std::error::Error;
use std::process::ExitCode;
use toolloop_core::application::prompt::tool_block;
use toolloop_core::{AgentError, AppConfig, Orchestrator};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    debug!(mode = ?cli.mode, config = ?cli.config, "CLI arguments parsed");

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config)?;
    info!(
        provider = config.model.provider.as_str(),
        model = %config.model.model,
        registry = %config.registry.display_name(),
        transport = %config.registry.transport,
        "Configuration ready"
    );

    let orchestrator = Orchestrator::from_config(&config)?;
    let outcome = execute(&cli, &orchestrator).await;
    orchestrator.registry().shutdown().await;
    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(Failure::Agent(err)) => {
            eprintln!("error [{}]: {}", err.kind(), err.user_message());
            debug!(%err, "Run failed");
            Ok(ExitCode::FAILURE)
        }
        Err(Failure::Other(err)) => Err(err),
    }
}

enum Failure {
    Agent(AgentError),
    Other(Box<dyn Error>),
}

impl From<AgentError> for Failure {
    fn from(err: AgentError) -> Self {
        Failure::Agent(err)
    }
}

async fn execute(cli: &Cli, orchestrator: &Orchestrator) -> Result<(), Failure> {
    orchestrator.connect().await?;

    match cli.mode {
        RunMode::Tools => {
            let tools = orchestrator
                .registry()
                .list_tools()
                .await
                .map_err(AgentError::from)?;
            println!("{}", tool_block(&tools));
        }
        RunMode::Prompt => {
            let question = cli.load_question().map_err(Failure::Other)?;
            println!("{}", orchestrator.initial_prompt(&question).await?);
        }
        RunMode::Ask => {
            let question = cli.load_question().map_err(Failure::Other)?;
            let outcome = orchestrator.run(&question).await?;
            info!(steps = outcome.steps.len(), "Answer ready");
            println!("{}", outcome.answer);
        }
    }
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
