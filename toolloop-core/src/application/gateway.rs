//! Model Gateway
//!
//! One bounded generation per call. The generation runs on its own task and
//! the caller waits on it with `tokio::time::timeout`; when the wait expires
//! the task is left running detached and whatever it returns later is dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::types::ModelOutput;
use crate::infrastructure::model::ModelClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayFailure {
    #[error("model did not answer within {after:?}")]
    Timeout { after: Duration },
    #[error("model call failed: {message}")]
    Model { message: String },
}

impl GatewayFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayFailure::Timeout { .. } => "Timeout",
            GatewayFailure::Model { .. } => "ModelError",
        }
    }
}

#[derive(Clone)]
pub struct ModelGateway {
    client: Arc<dyn ModelClient>,
    timeout: Duration,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Generates with the gateway's configured timeout.
    pub async fn generate(&self, prompt: &str) -> Result<ModelOutput, GatewayFailure> {
        self.generate_with_timeout(prompt, self.timeout).await
    }

    pub async fn generate_with_timeout(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<ModelOutput, GatewayFailure> {
        let client = Arc::clone(&self.client);
        let prompt = prompt.to_string();
        let started = Instant::now();
        debug!(model = client.id(), %prompt, "Prompt sent to model");

        let handle = tokio::spawn(async move { client.generate_content(prompt).await });

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(text))) => {
                info!(
                    model = self.client.id(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Model answered"
                );
                debug!(raw = %text, "Raw model output");
                Ok(ModelOutput::new(text))
            }
            Ok(Ok(Err(err))) => {
                warn!(
                    model = self.client.id(),
                    kind = err.kind(),
                    %err,
                    "Model call failed"
                );
                Err(GatewayFailure::Model {
                    message: err.user_message(),
                })
            }
            Ok(Err(join_err)) => {
                warn!(model = self.client.id(), %join_err, "Model task aborted");
                Err(GatewayFailure::Model {
                    message: format!("generation task failed: {join_err}"),
                })
            }
            Err(_) => {
                warn!(
                    model = self.client.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Model call timed out, abandoning it"
                );
                Err(GatewayFailure::Timeout { after: timeout })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::model::ModelError;
    use crate::infrastructure::model::clients::BlockingModelClient;
    use async_trait::async_trait;

    struct SleepyModel {
        delay: Duration,
    }

    #[async_trait]
    impl ModelClient for SleepyModel {
        fn id(&self) -> &str {
            "sleepy"
        }

        async fn generate_content(&self, _prompt: String) -> Result<String, ModelError> {
            tokio::time::sleep(self.delay).await;
            Ok("FINAL_ANSWER: late".into())
        }
    }

    struct PanickingModel;

    #[async_trait]
    impl ModelClient for PanickingModel {
        fn id(&self) -> &str {
            "panicky"
        }

        async fn generate_content(&self, _prompt: String) -> Result<String, ModelError> {
            panic!("generator exploded")
        }
    }

    #[tokio::test]
    async fn slow_model_times_out_without_late_result() {
        let gateway = ModelGateway::new(
            Arc::new(SleepyModel {
                delay: Duration::from_secs(1),
            }),
            Duration::from_millis(10),
        );
        let started = Instant::now();
        let failure = gateway.generate("q").await.expect_err("timeout");
        assert_eq!(
            failure,
            GatewayFailure::Timeout {
                after: Duration::from_millis(10)
            }
        );
        assert_eq!(failure.kind(), "Timeout");
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn blocking_generator_is_bounded_too() {
        let client = BlockingModelClient::new("sync", |_: &str| {
            std::thread::sleep(Duration::from_secs(1));
            Ok("FINAL_ANSWER: late".to_string())
        });
        let gateway = ModelGateway::new(Arc::new(client), Duration::from_millis(10));
        let failure = gateway.generate("q").await.expect_err("timeout");
        assert_eq!(failure.kind(), "Timeout");
    }

    #[tokio::test]
    async fn fast_model_output_is_returned_verbatim() {
        let gateway = ModelGateway::new(
            Arc::new(SleepyModel {
                delay: Duration::ZERO,
            }),
            Duration::from_secs(1),
        );
        let output = gateway.generate("q").await.expect("output");
        assert_eq!(output.raw_text, "FINAL_ANSWER: late");
    }

    #[tokio::test]
    async fn model_errors_become_model_failures() {
        let client = BlockingModelClient::new("broken", |_: &str| Err("quota exhausted".into()));
        let gateway = ModelGateway::new(Arc::new(client), Duration::from_secs(1));
        let failure = gateway.generate("q").await.expect_err("model failure");
        assert_eq!(failure.kind(), "ModelError");
        assert!(failure.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn panicking_generator_is_contained() {
        let gateway = ModelGateway::new(Arc::new(PanickingModel), Duration::from_secs(1));
        let failure = gateway.generate("q").await.expect_err("model failure");
        assert!(matches!(failure, GatewayFailure::Model { .. }));
    }
}
