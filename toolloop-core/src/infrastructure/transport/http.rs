//! MCP streamable-HTTP transport
//!
//! Every JSON-RPC message is POSTed to the registry URL. The server answers
//! with either a plain JSON body or a `text/event-stream` carrying the
//! response as a `data:` event. A session id handed out during `initialize`
//! is echoed on every later request.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use super::{
    RemoteTool, ToolPager, ToolProvider, TransportError, list_params, parse_tool_page,
    unwrap_response,
};
use crate::config::RegistrySettings;
use crate::constants::{MCP_PROTOCOL_VERSION, MCP_SESSION_HEADER};

const PROTOCOL_HEADER: &str = "mcp-protocol-version";

pub struct HttpProvider {
    url: String,
    http: Client,
    session: AsyncMutex<Option<String>>,
    initialized: AtomicBool,
    handshake: AsyncMutex<()>,
    id_counter: AtomicU64,
}

impl HttpProvider {
    pub fn new(settings: &RegistrySettings) -> Result<Self, TransportError> {
        let url = settings
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| TransportError::transport("http", "no registry url configured"))?;
        let http = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|source| TransportError::Http {
                server: url.clone(),
                source,
            })?;
        Ok(Self {
            url,
            http,
            session: AsyncMutex::new(None),
            initialized: AtomicBool::new(false),
            handshake: AsyncMutex::new(()),
            id_counter: AtomicU64::new(1),
        })
    }

    async fn ensure_initialized(&self) -> Result<(), TransportError> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let _guard = self.handshake.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        self.send_request("initialize", params).await?;
        self.post(&json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        }))
        .await?;

        self.initialized.store(true, Ordering::Release);
        info!(server = %self.url, "Connected to streamable-HTTP tool server");
        Ok(())
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = format!("req-{}", self.id_counter.fetch_add(1, Ordering::SeqCst));
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        let (content_type, body) = self.post(&payload).await?;

        let envelope = if content_type.starts_with("text/event-stream") {
            find_sse_response(&self.url, &body, &id)?
        } else {
            serde_json::from_str(&body).map_err(|source| TransportError::InvalidJson {
                server: self.url.clone(),
                source,
            })?
        };
        unwrap_response(&self.url, envelope)
    }

    /// POSTs one message and returns the response content type and body.
    async fn post(&self, payload: &Value) -> Result<(String, String), TransportError> {
        debug!(server = %self.url, %payload, "-> tool server");
        let mut request = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .header(PROTOCOL_HEADER, MCP_PROTOCOL_VERSION)
            .json(payload);
        if let Some(session) = self.session.lock().await.as_deref() {
            request = request.header(MCP_SESSION_HEADER, session);
        }

        let response = request.send().await.map_err(|source| TransportError::Http {
            server: self.url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                server: self.url.clone(),
                status: status.as_u16(),
            });
        }

        self.remember_session(response.headers()).await;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response.text().await.map_err(|source| TransportError::Http {
            server: self.url.clone(),
            source,
        })?;
        Ok((content_type, body))
    }

    async fn remember_session(&self, headers: &HeaderMap) {
        let Some(session) = headers
            .get(MCP_SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        else {
            return;
        };
        let mut current = self.session.lock().await;
        if current.as_deref() != Some(session) {
            debug!(server = %self.url, session, "Tool server assigned session");
            *current = Some(session.to_string());
        }
    }
}

#[async_trait]
impl ToolProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.ensure_initialized().await
    }

    async fn ping(&self) -> Result<(), TransportError> {
        self.ensure_initialized().await?;
        self.send_request("ping", json!({})).await.map(|_| ())
    }

    async fn list_tools(&self) -> Result<Vec<RemoteTool>, TransportError> {
        self.ensure_initialized().await?;
        let mut tools = Vec::new();
        let mut pager = ToolPager::default();
        let mut cursor: Option<String> = None;
        loop {
            let result = self
                .send_request("tools/list", list_params(cursor.as_deref()))
                .await?;
            let (page, next) = parse_tool_page(&self.url, &result)?;
            tools.extend(page);
            match next {
                Some(next) => cursor = Some(pager.advance(&self.url, next)?),
                None => break,
            }
        }
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, TransportError> {
        self.ensure_initialized().await?;
        let params = json!({
            "name": name,
            "arguments": Value::Object(arguments),
        });
        self.send_request("tools/call", params).await
    }
}

/// Picks the JSON-RPC response with the given id out of an SSE body.
fn find_sse_response(server: &str, body: &str, id: &str) -> Result<Value, TransportError> {
    for event in body.replace("\r\n", "\n").split("\n\n") {
        let data: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|line| line.strip_prefix(' ').unwrap_or(line))
            .collect();
        if data.is_empty() {
            continue;
        }
        let message: Value =
            serde_json::from_str(&data.join("\n")).map_err(|source| TransportError::InvalidJson {
                server: server.to_string(),
                source,
            })?;
        if message.get("id").and_then(Value::as_str) == Some(id) {
            return Ok(message);
        }
    }
    Err(TransportError::protocol(
        server,
        format!("event stream ended without a response to {id}"),
    ))
}
