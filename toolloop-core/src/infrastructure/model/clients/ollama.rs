//! Ollama client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelSettings;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::ModelError;

/// Ollama client for local LLM
#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
    model: String,
}

impl OllamaClient {
    /// Creates client from model settings.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            base: HttpClientBase::new(
                settings.provider.as_str().to_string(),
                settings.endpoint.clone(),
                None,
            ),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn generate_content(&self, prompt: String) -> Result<String, ModelError> {
        let url = self.base.build_url("/api/generate");

        info!(
            provider = self.base.id.as_str(),
            model = self.model.as_str(),
            prompt_chars = prompt.len(),
            "Sending request to Ollama"
        );

        let payload = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response: OllamaResponse = self.base.post_no_auth(&url, &payload).await?;
        debug!("Received response from Ollama");

        response
            .response
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing response"))
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}
