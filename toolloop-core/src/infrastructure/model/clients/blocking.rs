//! Adapter for synchronous generators

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task;

use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::ModelError;

type Generator = dyn Fn(&str) -> Result<String, String> + Send + Sync;

/// Runs a blocking `prompt -> text` function on tokio's blocking pool.
///
/// Useful for SDK bindings that expose no async API. A call abandoned by the
/// gateway keeps its blocking thread until the function returns.
#[derive(Clone)]
pub struct BlockingModelClient {
    id: String,
    generator: Arc<Generator>,
}

impl BlockingModelClient {
    pub fn new<F>(id: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            generator: Arc::new(generator),
        }
    }
}

#[async_trait]
impl ModelClient for BlockingModelClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate_content(&self, prompt: String) -> Result<String, ModelError> {
        let generator = Arc::clone(&self.generator);
        let outcome = task::spawn_blocking(move || generator(&prompt))
            .await
            .map_err(|err| ModelError::generator(&self.id, err.to_string()))?;
        outcome.map_err(|message| ModelError::generator(&self.id, message))
    }
}
