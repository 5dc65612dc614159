//! Tool provider transports
//!
//! The registry client talks to tools through [`ToolProvider`]. Two MCP
//! transports live here; the in-process capability table lives with the
//! registry itself.

pub mod error;
pub mod http;
pub mod stdio;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use error::TransportError;
pub use http::HttpProvider;
pub use stdio::StdioProvider;

/// A tool exactly as the provider advertised it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTool {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Registry protocol boundary: connect, ping, list, call.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Label used in logs and errors
    fn name(&self) -> &str;

    /// Establish the session (spawn, handshake). Idempotent.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Liveness check
    async fn ping(&self) -> Result<(), TransportError>;

    /// Every tool the provider currently offers, in provider order
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, TransportError>;

    /// Invoke a tool and return the raw `tools/call` result object
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, TransportError>;

    /// Release the session. Providers without one keep the default.
    async fn shutdown(&self) {}
}

/// Reads one `tools/list` result page, returning its tools and `nextCursor`.
pub(crate) fn parse_tool_page(
    server: &str,
    result: &Value,
) -> Result<(Vec<RemoteTool>, Option<String>), TransportError> {
    let entries = result
        .get("tools")
        .and_then(Value::as_array)
        .ok_or_else(|| TransportError::protocol(server, "tools/list result has no 'tools' array"))?;

    let mut tools = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| TransportError::protocol(server, "tool entry without a name"))?;
        tools.push(RemoteTool {
            name: name.to_string(),
            description: entry
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            input_schema: entry.get("inputSchema").cloned().unwrap_or(Value::Null),
        });
    }

    let cursor = result
        .get("nextCursor")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string);
    Ok((tools, cursor))
}

/// Most `tools/list` pages followed in one listing.
pub(crate) const MAX_TOOL_PAGES: usize = 100;

/// Tracks the `nextCursor` values of one paged listing.
#[derive(Debug, Default)]
pub(crate) struct ToolPager {
    seen: Vec<String>,
}

impl ToolPager {
    /// Accepts the next cursor. A cursor the server already handed out, or
    /// one past the page cap, ends the listing with a protocol error.
    pub(crate) fn advance(&mut self, server: &str, next: String) -> Result<String, TransportError> {
        if self.seen.contains(&next) {
            return Err(TransportError::protocol(
                server,
                format!("tools/list returned cursor '{next}' twice"),
            ));
        }
        if self.seen.len() + 1 >= MAX_TOOL_PAGES {
            return Err(TransportError::protocol(
                server,
                format!("tools/list did not finish within {MAX_TOOL_PAGES} pages"),
            ));
        }
        self.seen.push(next.clone());
        Ok(next)
    }
}

/// Params for a `tools/list` request, with the cursor when paging.
pub(crate) fn list_params(cursor: Option<&str>) -> Value {
    match cursor {
        Some(cursor) => serde_json::json!({ "cursor": cursor }),
        None => serde_json::json!({}),
    }
}

/// Turns a JSON-RPC response envelope into its `result` or an `Rpc` error.
pub(crate) fn unwrap_response(server: &str, envelope: Value) -> Result<Value, TransportError> {
    if let Some(error) = envelope.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(TransportError::Rpc {
            server: server.to_string(),
            code,
            message,
        });
    }
    Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
}
