//! Tool Registry Client
//!
//! Wraps a [`ToolProvider`] with the semantics the orchestration loop relies
//! on: a bounded liveness check on connect, listings reduced to
//! [`ToolDescriptor`]s, and invocation restricted to tools from the most
//! recent listing.

pub mod builtin;
pub mod error;
pub mod local;
pub mod schema;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use builtin::{Catalog, builtin_provider};
pub use error::RegistryError;
pub use local::LocalProvider;

use crate::config::{RegistrySettings, TransportKind};
use crate::domain::types::{Arguments, ToolDescriptor, ToolInvocationResult};
use crate::infrastructure::transport::{HttpProvider, RemoteTool, StdioProvider, ToolProvider};

const NO_DESCRIPTION: &str = "No description.";

pub struct ToolRegistryClient {
    provider: Arc<dyn ToolProvider>,
    connect_timeout: Duration,
    snapshot: RwLock<Vec<ToolDescriptor>>,
}

impl ToolRegistryClient {
    pub fn new(provider: Arc<dyn ToolProvider>, connect_timeout: Duration) -> Self {
        Self {
            provider,
            connect_timeout,
            snapshot: RwLock::new(Vec::new()),
        }
    }

    /// Builds the provider named by the registry settings.
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self, RegistryError> {
        let provider: Arc<dyn ToolProvider> = match settings.transport {
            TransportKind::Http => Arc::new(HttpProvider::new(settings)?),
            TransportKind::Stdio => Arc::new(StdioProvider::new(settings)?),
            TransportKind::Builtin => Arc::new(builtin_provider()),
        };
        Ok(Self::new(provider, settings.connect_timeout))
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Establishes the session and checks liveness within the connect timeout.
    pub async fn connect(&self) -> Result<(), RegistryError> {
        let registry = self.name().to_string();
        let handshake = async {
            self.provider.connect().await?;
            self.provider.ping().await
        };
        match tokio::time::timeout(self.connect_timeout, handshake).await {
            Ok(Ok(())) => {
                info!(registry = %registry, "Tool registry is reachable");
                Ok(())
            }
            Ok(Err(err)) => {
                let reason = if err.is_unreachable() {
                    format!("not reachable: {err}")
                } else {
                    format!("handshake failed: {err}")
                };
                Err(RegistryError::Connectivity { registry, reason })
            }
            Err(_) => Err(RegistryError::Connectivity {
                registry,
                reason: format!("no answer to ping within {:?}", self.connect_timeout),
            }),
        }
    }

    /// Releases the provider session, if it holds one.
    pub async fn shutdown(&self) {
        self.provider.shutdown().await;
    }

    /// Lists tools in provider order and replaces the snapshot.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError> {
        let remote = self.provider.list_tools().await?;
        let mut descriptors: Vec<ToolDescriptor> = Vec::with_capacity(remote.len());
        for tool in remote {
            if descriptors.iter().any(|known| known.name == tool.name) {
                return Err(RegistryError::DuplicateTool { tool: tool.name });
            }
            descriptors.push(describe(tool));
        }

        debug!(
            registry = %self.name(),
            tools = descriptors.len(),
            "Refreshed tool snapshot"
        );
        *self.snapshot.write().await = descriptors.clone();
        Ok(descriptors)
    }

    /// Invokes a tool from the last listing and returns its payload unchanged.
    pub async fn invoke(
        &self,
        tool_name: &str,
        arguments: &Arguments,
    ) -> Result<Value, RegistryError> {
        let schema = {
            let snapshot = self.snapshot.read().await;
            let Some(descriptor) = snapshot.iter().find(|tool| tool.name == tool_name) else {
                return Err(RegistryError::UnknownTool {
                    tool: tool_name.to_string(),
                });
            };
            descriptor.input_schema.clone()
        };

        let payload = schema::align_arguments(arguments, &schema);
        info!(tool = tool_name, arguments = payload.len(), "Invoking tool");

        let result = self
            .provider
            .call_tool(tool_name, payload)
            .await
            .map_err(|err| {
                warn!(tool = tool_name, %err, "Tool call failed");
                RegistryError::invocation(tool_name, err.to_string())
            })?;

        if !result.is_object() {
            return Err(RegistryError::invocation(
                tool_name,
                "provider returned a non-object result",
            ));
        }
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            let message = text_content(&result).unwrap_or_else(|| "tool reported an error".into());
            return Err(RegistryError::invocation(tool_name, message));
        }
        Ok(result)
    }
}

impl From<&RegistryError> for ToolInvocationResult {
    fn from(err: &RegistryError) -> Self {
        ToolInvocationResult::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

fn describe(tool: RemoteTool) -> ToolDescriptor {
    let short_description = tool
        .description
        .as_deref()
        .and_then(|text| text.trim().lines().next())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();
    ToolDescriptor {
        parameters: schema::describe_parameters(&tool.input_schema),
        name: tool.name,
        short_description,
        input_schema: tool.input_schema,
    }
}

/// Concatenated `text` blocks of an MCP content array, if any.
pub(crate) fn text_content(result: &Value) -> Option<String> {
    let texts: Vec<&str> = result
        .get("content")?
        .as_array()?
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}
