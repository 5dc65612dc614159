//! In-process tool provider backed by a name to closure capability table.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::infrastructure::transport::{RemoteTool, ToolProvider, TransportError};

/// Future returned by a local tool handler.
pub type ToolFuture = BoxFuture<'static, Result<Value, String>>;

type Handler = Arc<dyn Fn(Map<String, Value>) -> ToolFuture + Send + Sync>;

struct Capability {
    tool: RemoteTool,
    handler: Handler,
}

/// Serves tools from closures registered at construction time.
///
/// Handler errors are reported like an MCP server reports them: a result with
/// `isError: true` and the message as text content.
pub struct LocalProvider {
    name: String,
    capabilities: Vec<Capability>,
}

impl LocalProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
        }
    }

    /// Adds a tool. A later registration under the same name replaces the
    /// earlier one and keeps its position.
    pub fn register<F, Fut>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let tool = RemoteTool {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        };
        let handler: Handler = Arc::new(move |arguments| handler(arguments).boxed());
        let capability = Capability { tool, handler };

        match self
            .capabilities
            .iter_mut()
            .find(|existing| existing.tool.name == capability.tool.name)
        {
            Some(existing) => *existing = capability,
            None => self.capabilities.push(capability),
        }
        self
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.capabilities
            .iter()
            .map(|capability| capability.tool.name.as_str())
    }
}

#[async_trait]
impl ToolProvider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<RemoteTool>, TransportError> {
        Ok(self
            .capabilities
            .iter()
            .map(|capability| capability.tool.clone())
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, TransportError> {
        let Some(capability) = self
            .capabilities
            .iter()
            .find(|capability| capability.tool.name == name)
        else {
            return Err(TransportError::Rpc {
                server: self.name.clone(),
                code: -32602,
                message: format!("Unknown tool: {name}"),
            });
        };

        debug!(provider = %self.name, tool = name, "Running local tool");
        let handler = Arc::clone(&capability.handler);
        Ok(match handler(arguments).await {
            Ok(value) => success_result(value),
            Err(message) => json!({
                "content": [{"type": "text", "text": message}],
                "isError": true,
            }),
        })
    }
}

fn success_result(value: Value) -> Value {
    let text = match &value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let structured = match value {
        Value::Object(_) => value,
        other => json!({ "result": other }),
    };
    json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": structured,
        "isError": false,
    })
}
