//! # Model Configuration
//!
//! Describes which text-generation backend the gateway talks to.
//!
//! | Type | Description | API Key Required |
//! |------|-------------|-----------------|
//! | `gemini` / `google` | Google Gemini API | Yes |
//! | `ollama` | Local Ollama server | No |
//!
//! ```toml
//! [model]
//! provider = "gemini"
//! model = "gemini-2.0-flash"
//! api_key = "GOOGLE_API_KEY"
//! timeout_secs = 10
//! ```

use serde::Deserialize;
use std::env;
use std::time::Duration;

use super::error::ConfigError;
use crate::constants::{
    DEFAULT_GEMINI_API_KEY_ENV, DEFAULT_GEMINI_ENDPOINT, DEFAULT_MODEL,
    DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_PROVIDER, MODEL_NAME_ENV,
};

/// Backend families understood by the provider factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gemini" | "google" | "google-ai" => Some(ProviderKind::Gemini),
            "ollama" | "localai" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub endpoint: String,
    /// Name of the environment variable that holds the API key.
    pub api_key: Option<String>,
    pub api_path: Option<String>,
    /// Hard bound applied by the gateway to each generation.
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: Some(DEFAULT_GEMINI_API_KEY_ENV.to_string()),
            api_path: None,
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawModel {
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    api_path: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl RawModel {
    pub(crate) fn build(self) -> Result<ModelSettings, ConfigError> {
        let provider_name = self.provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let provider = ProviderKind::parse(&provider_name).ok_or(
            ConfigError::UnsupportedProvider {
                provider: provider_name,
            },
        )?;

        // A blank `model` counts as unset, so `MODEL_NAME` can fill it in.
        let model = non_blank(self.model)
            .or_else(|| non_blank(env::var(MODEL_NAME_ENV).ok()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let endpoint = self.endpoint.unwrap_or_else(|| match provider {
            ProviderKind::Gemini => DEFAULT_GEMINI_ENDPOINT.to_string(),
            ProviderKind::Ollama => DEFAULT_OLLAMA_ENDPOINT.to_string(),
        });

        let api_key = match (self.api_key, provider) {
            (Some(name), _) => Some(name),
            (None, ProviderKind::Gemini) => Some(DEFAULT_GEMINI_API_KEY_ENV.to_string()),
            (None, ProviderKind::Ollama) => None,
        };

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "model.timeout_secs",
            });
        }

        Ok(ModelSettings {
            provider,
            model: model.trim().to_string(),
            endpoint,
            api_key,
            api_path: self.api_path,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
