use serde::Deserialize;
use std::path::Path;

use super::error::ConfigError;
use super::model::ModelSettings;
use super::registry::RegistrySettings;
use crate::application::prompt::{DEFAULT_FEW_SHOT, DEFAULT_ROLE};
use crate::constants::DEFAULT_MAX_STEPS;

/// Application configuration loaded from toolloop.toml.
///
/// Built once at startup and handed to the orchestrator by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub model: ModelSettings,
    pub registry: RegistrySettings,
    pub agent: AgentSettings,
    pub prompt: PromptSettings,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text without touching the filesystem
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        super::loader::parse_config(content, Path::new("<inline>"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    /// Maximum number of tool dispatches before the loop gives up.
    pub max_steps: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub role: String,
    pub few_shot: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            role: DEFAULT_ROLE.to_string(),
            few_shot: DEFAULT_FEW_SHOT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawAgent {
    #[serde(default)]
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPrompt {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub few_shot: Option<String>,
}
