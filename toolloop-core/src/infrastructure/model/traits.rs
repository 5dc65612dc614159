//! Model traits

use super::types::ModelError;
use async_trait::async_trait;

/// Opaque text-generation backend.
///
/// Implementations perform exactly one generation per call and never retry.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Get the client ID
    fn id(&self) -> &str;

    /// Generate a completion for the full prompt text
    async fn generate_content(&self, prompt: String) -> Result<String, ModelError>;
}
