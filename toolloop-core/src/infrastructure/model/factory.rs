//! Provider factory - creates clients from settings

use super::clients::{GeminiClient, OllamaClient};
use super::traits::ModelClient;
use crate::config::{ModelSettings, ProviderKind};
use std::env;
use std::sync::Arc;
use tracing::warn;

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, env_var: Option<&str>) -> Option<String> {
    let raw = env_var.map(str::trim)?;
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model clients from model settings.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a model client for the configured provider.
    ///
    /// The client is shared because the gateway hands it to a spawned task.
    pub fn create(settings: &ModelSettings) -> Arc<dyn ModelClient> {
        match settings.provider {
            ProviderKind::Gemini => Arc::new(GeminiClient::from_settings(settings)),
            ProviderKind::Ollama => Arc::new(OllamaClient::from_settings(settings)),
        }
    }
}
