//! Gemini client implementation

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelSettings;
use crate::constants::DEFAULT_GEMINI_API_PATH;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::ModelError;

/// Gemini client for Google AI
#[derive(Clone)]
pub struct GeminiClient {
    base: HttpClientBase,
    model: String,
    api_path: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let id = settings.provider.as_str();
        let api_key = resolve_api_key(id, settings.api_key.as_deref());
        Self {
            base: HttpClientBase::new(id.to_string(), settings.endpoint.clone(), api_key),
            model: settings.model.clone(),
            api_path: settings
                .api_path
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_API_PATH.to_string()),
        }
    }

    fn build_model_url(&self) -> String {
        let path = format!(
            "{}/{}:generateContent",
            self.api_path.trim_matches('/'),
            self.model
        );
        self.base.build_url(&path)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn generate_content(&self, prompt: String) -> Result<String, ModelError> {
        let url = self.build_model_url();
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }]
        });

        info!(
            provider = self.base.id.as_str(),
            model = self.model.as_str(),
            prompt_chars = prompt.len(),
            "Sending request to Gemini"
        );

        let response: GeminiResponse = self.base.post_with_query_key(&url, &payload).await?;
        debug!("Received response from Gemini");

        extract_text(response)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing text"))
    }
}

fn extract_text(response: GeminiResponse) -> Option<String> {
    let parts: Vec<String> = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
