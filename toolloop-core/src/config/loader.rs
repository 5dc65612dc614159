use super::app::{AgentSettings, AppConfig, PromptSettings, RawAgent, RawPrompt};
use super::error::ConfigError;
use super::model::RawModel;
use super::registry::RawRegistry;
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    model: RawModel,
    #[serde(default)]
    registry: RawRegistry,
    #[serde(default)]
    agent: RawAgent,
    #[serde(default)]
    prompt: RawPrompt,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
        let _ = dotenvy::dotenv();
    });
}

/// Load and validate configuration.
///
/// An explicit path must exist. Without one, the default path is read when
/// present and built-in defaults are used otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    match path {
        Some(path) => read_config(path),
        None => {
            let default_path = Path::new(CONFIG_PATH);
            if default_path.exists() {
                read_config(default_path)
            } else {
                debug!(
                    path = %default_path.display(),
                    "No configuration file found, using defaults"
                );
                validate_and_build(RawConfig::default())
            }
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading toolloop configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

pub(super) fn parse_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = parsed.model.build()?;
    let registry = parsed.registry.build()?;

    let mut agent = AgentSettings::default();
    if let Some(max_steps) = parsed.agent.max_steps {
        if max_steps == 0 {
            return Err(ConfigError::ZeroValue {
                field: "agent.max_steps",
            });
        }
        agent.max_steps = max_steps;
    }

    let mut prompt = PromptSettings::default();
    if let Some(role) = parsed.prompt.role.filter(|text| !text.trim().is_empty()) {
        prompt.role = role.trim().to_string();
    }
    if let Some(few_shot) = parsed.prompt.few_shot.filter(|text| !text.trim().is_empty()) {
        prompt.few_shot = few_shot.trim().to_string();
    }

    Ok(AppConfig {
        model,
        registry,
        agent,
        prompt,
    })
}
