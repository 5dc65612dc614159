use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

use super::{
    RemoteTool, ToolPager, ToolProvider, TransportError, list_params, parse_tool_page,
    unwrap_response,
};
use crate::config::RegistrySettings;
use crate::constants::MCP_PROTOCOL_VERSION;

/// MCP over newline-delimited JSON-RPC on a child process' stdio.
#[derive(Clone)]
pub struct StdioProvider {
    inner: Arc<StdioInner>,
}

struct StdioInner {
    name: String,
    command: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    workdir: Option<PathBuf>,
    request_timeout: Duration,
    startup: AsyncMutex<()>,
    state: AsyncMutex<Option<RunningState>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: AsyncMutex<HashMap<String, oneshot::Sender<Result<Value, TransportError>>>>,
    id_counter: AtomicU64,
    generation: AtomicU64,
}

/// The live server process. `generation` tells a stale reader task apart
/// from the one attached to this child.
struct RunningState {
    child: Child,
    generation: u64,
}

impl StdioProvider {
    pub fn new(settings: &RegistrySettings) -> Result<Self, TransportError> {
        let command = settings.command.clone().ok_or_else(|| {
            TransportError::transport(settings.display_name(), "no server command configured")
        })?;
        Ok(Self {
            inner: Arc::new(StdioInner {
                name: settings.display_name(),
                command,
                args: settings.args.clone(),
                env: settings.env.clone(),
                workdir: settings.workdir.clone(),
                request_timeout: settings.request_timeout,
                startup: AsyncMutex::new(()),
                state: AsyncMutex::new(None),
                writer: AsyncMutex::new(None),
                pending: AsyncMutex::new(HashMap::new()),
                id_counter: AtomicU64::new(1),
                generation: AtomicU64::new(0),
            }),
        })
    }
}

#[async_trait]
impl ToolProvider for StdioProvider {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.inner.ensure_running().await
    }

    async fn ping(&self) -> Result<(), TransportError> {
        self.inner.ensure_running().await?;
        self.inner.send_request("ping", json!({})).await.map(|_| ())
    }

    async fn list_tools(&self) -> Result<Vec<RemoteTool>, TransportError> {
        self.inner.ensure_running().await?;
        let mut tools = Vec::new();
        let mut pager = ToolPager::default();
        let mut cursor: Option<String> = None;
        loop {
            let result = self
                .inner
                .send_request("tools/list", list_params(cursor.as_deref()))
                .await?;
            let (page, next) = parse_tool_page(&self.inner.name, &result)?;
            tools.extend(page);
            match next {
                Some(next) => cursor = Some(pager.advance(&self.inner.name, next)?),
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
        self.inner.ensure_running().await?;
        let params = json!({
            "name": name,
            "arguments": Value::Object(arguments),
        });
        self.inner.send_request("tools/call", params).await
    }

    /// Kills the server process and fails every in-flight request.
    async fn shutdown(&self) {
        self.inner.reset(None).await;
    }
}

impl StdioInner {
    async fn ensure_running(self: &Arc<Self>) -> Result<(), TransportError> {
        let _startup = self.startup.lock().await;
        if self.state.lock().await.is_some() {
            return Ok(());
        }

        let mut command = Command::new(&self.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| TransportError::Spawn {
            server: self.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::transport(&self.name, "failed to capture server stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            TransportError::transport(&self.name, "failed to capture server stdout")
        })?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.writer.lock().await = Some(BufWriter::new(stdin));
        *self.state.lock().await = Some(RunningState { child, generation });

        let reader_self = Arc::clone(self);
        tokio::spawn(async move {
            reader_self.reader_loop(stdout, generation).await;
        });

        match self.initialize_sequence().await {
            Ok(()) => {
                info!(server = %self.name, "Tool server process started");
                Ok(())
            }
            Err(err) => {
                self.reset(Some(generation)).await;
                Err(err)
            }
        }
    }

    async fn initialize_sequence(&self) -> Result<(), TransportError> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        if let Some(version) = init_result.get("protocolVersion").and_then(Value::as_str) {
            debug!(server = %self.name, version, "Negotiated MCP protocol version");
        }
        self.send_notification("notifications/initialized", json!({}))
            .await
    }

    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout, generation: u64) {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(raw)) = lines.next_line().await {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with('{') {
                debug!(
                    server = %self.name,
                    line = trimmed,
                    "skipping non-JSON line from tool server"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    if let Err(err) = self.process_inbound_message(value).await {
                        warn!(
                            server = %self.name,
                            %err,
                            "failed to process message from tool server"
                        );
                    }
                }
                Err(source) => {
                    warn!(
                        server = %self.name,
                        line = trimmed,
                        %source,
                        "received invalid JSON from tool server"
                    );
                }
            }
        }

        debug!(server = %self.name, generation, "Tool server closed its stdout");
        self.reset(Some(generation)).await;
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), TransportError> {
        match (value.get("id").cloned(), value.get("method").is_some()) {
            (Some(id), true) => self.handle_server_request(id, value).await,
            (Some(id), false) => {
                self.handle_response(id, value).await;
                Ok(())
            }
            (None, true) => {
                self.handle_notification(&value);
                Ok(())
            }
            (None, false) => Ok(()),
        }
    }

    async fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };
        let responder = self.pending.lock().await.remove(&key);
        match responder {
            Some(sender) => {
                let _ = sender.send(unwrap_response(&self.name, value));
            }
            None => debug!(
                server = %self.name,
                response_id = key,
                "received response for unknown request"
            ),
        }
    }

    async fn handle_server_request(&self, id: Value, value: Value) -> Result<(), TransportError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if method == "ping" {
            return self
                .write_message(&json!({ "jsonrpc": "2.0", "id": id, "result": {} }))
                .await;
        }
        warn!(
            server = %self.name,
            method,
            "server sent unsupported request"
        );
        let error = json!({
            "code": -32601,
            "message": format!("client does not implement method '{method}'"),
        });
        self.write_message(&json!({ "jsonrpc": "2.0", "id": id, "error": error }))
            .await
    }

    fn handle_notification(&self, value: &Value) {
        let Some(method) = value.get("method").and_then(Value::as_str) else {
            return;
        };
        if method == "notifications/tools/list_changed" {
            info!(server = %self.name, "Tool list changed, next listing picks it up");
        } else {
            debug!(server = %self.name, method, "received notification from server");
        }
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        if let Err(err) = self.write_message(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(TransportError::Cancelled {
                server: self.name.clone(),
            }),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(TransportError::Timeout {
                    server: self.name.clone(),
                    method: method.to_string(),
                    after: self.request_timeout,
                })
            }
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), TransportError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), TransportError> {
        let mut encoded =
            serde_json::to_string(message).map_err(|source| TransportError::InvalidJson {
                server: self.name.clone(),
                source,
            })?;
        encoded.push('\n');
        debug!(server = %self.name, line = encoded.trim_end(), "-> tool server");

        let mut writer = self.writer.lock().await;
        let stream = writer
            .as_mut()
            .ok_or_else(|| TransportError::transport(&self.name, "writer not initialised"))?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| TransportError::transport(&self.name, source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| TransportError::transport(&self.name, source.to_string()))
    }

    /// Tears down the running process. With a generation, only that process
    /// is torn down; a newer one started in the meantime is left alone.
    async fn reset(&self, generation: Option<u64>) {
        let running = {
            let mut state = self.state.lock().await;
            let current = state.as_ref().map(|running| running.generation);
            if current.is_none() || (generation.is_some() && generation != current) {
                return;
            }
            self.writer.lock().await.take();
            state.take()
        };
        if let Some(mut running) = running {
            if let Err(err) = running.child.kill().await {
                debug!(
                    server = %self.name,
                    %err,
                    "failed to kill tool server process (may have already exited)"
                );
            }
            let _ = running.child.wait().await;
        }

        let mut pending = self.pending.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(TransportError::Terminated {
                server: self.name.clone(),
            }));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}
