//! Child-process STDIO transport for MCP clients
//!
//! Unlike [`crate::stdio::StdioTransport`] (which binds to this process's own
//! stdin/stdout for when the current process *is* the MCP server), this
//! transport spawns an MCP server as a subprocess and speaks line-delimited
//! JSON-RPC over its pipes. This is the shape most local MCP clients use:
//! launch `npx some-mcp-server`, `python server.py`, etc. and talk to it over
//! stdio.

use std::collections::HashMap;
use std::process::Stdio as ProcessStdio;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcprt_core::protocol::jsonrpc::{classify_value, FrameKind};
use mcprt_core::protocol::JsonRpcMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, trace, warn};

use crate::{ConnectionState, Result, Transport, TransportError, TransportHealth};

/// Configuration for spawning an MCP server as a child process.
#[derive(Debug, Clone)]
pub struct ChildProcessConfig {
    /// Executable to run.
    pub command: String,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
    /// Environment variables merged on top of the inherited environment.
    pub env: HashMap<String, String>,
    /// Working directory for the child; defaults to the parent's cwd.
    pub working_dir: Option<std::path::PathBuf>,
    /// Per-request timeout enforced by callers (the transport itself does
    /// not time out reads; `mcprt-client` applies this to each call).
    pub request_timeout: Duration,
}

impl Default for ChildProcessConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ChildProcessConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// A monotonic id generator scoped to one transport instance.
///
/// Kept separate from any application-level id scheme so callers that want
/// the transport's own counter (rather than e.g. a UUID) have one available.
#[derive(Default)]
pub struct RequestIdGenerator(AtomicI64);

impl RequestIdGenerator {
    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Child-process-backed STDIO client transport (protocol core §4.7).
///
/// A dedicated writer task owns the child's stdin and serialises one frame
/// per line so concurrent callers never interleave partial writes. A
/// dedicated reader task owns stdout, classifies every line, and forwards
/// whatever it decodes (response, error, request, or notification) onto an
/// internal channel that `receive_message` drains; malformed lines are
/// logged and dropped rather than surfaced as transport errors. A third task
/// drains the child's stderr into the tracing log.
pub struct StdioClientTransport {
    config: ChildProcessConfig,
    child: Arc<Mutex<Child>>,
    stdin_tx: mpsc::UnboundedSender<String>,
    incoming_rx: Mutex<mpsc::UnboundedReceiver<JsonRpcMessage>>,
    reader_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    writer_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    stderr_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
    health: Arc<std::sync::RwLock<TransportHealth>>,
    ids: RequestIdGenerator,
    malformed_lines: Arc<AtomicU64>,
}

impl StdioClientTransport {
    /// Spawn `config.command` and wire up the reader/writer/stderr tasks.
    pub async fn spawn(config: ChildProcessConfig) -> Result<Self> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(ProcessStdio::piped())
            .stdout(ProcessStdio::piped())
            .stderr(ProcessStdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| TransportError::ConnectionError {
            message: format!("failed to spawn '{}': {}", config.command, e),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| TransportError::ConnectionError {
            message: "child process stdin was not piped".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| TransportError::ConnectionError {
            message: "child process stdout was not piped".to_string(),
        })?;
        let stderr = child.stderr.take();

        let health = Arc::new(std::sync::RwLock::new(TransportHealth {
            state: ConnectionState::Connected,
            ..Default::default()
        }));
        let state = Arc::new(std::sync::RwLock::new(ConnectionState::Connected));
        let malformed_lines = Arc::new(AtomicU64::new(0));

        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();
        let writer_health = health.clone();
        let writer_task = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(line) = stdin_rx.recv().await {
                if let Err(e) = stdin.write_all(line.as_bytes()).await {
                    error!("stdio client: write failed: {e}");
                    writer_health.write().unwrap().last_error = Some(format!("write failed: {e}"));
                    break;
                }
                if let Err(e) = stdin.write_all(b"\n").await {
                    error!("stdio client: newline write failed: {e}");
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    error!("stdio client: flush failed: {e}");
                    break;
                }
                writer_health.write().unwrap().messages_sent += 1;
            }
            debug!("stdio client: writer task exiting");
        });

        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel::<JsonRpcMessage>();
        let reader_health = health.clone();
        let reader_state = state.clone();
        let reader_malformed = malformed_lines.clone();
        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        let value: serde_json::Value = match serde_json::from_str(trimmed) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!("stdio client: dropping malformed line ({e}): {trimmed}");
                                reader_malformed.fetch_add(1, Ordering::SeqCst);
                                continue;
                            }
                        };
                        let message = match classify_value(value) {
                            FrameKind::Request(req) => JsonRpcMessage::Request(req),
                            FrameKind::Response(resp) => JsonRpcMessage::Response(resp),
                            FrameKind::Error(resp) => JsonRpcMessage::Response(resp),
                            FrameKind::Notification(req) => JsonRpcMessage::Notification(req),
                            FrameKind::Malformed(reason) => {
                                warn!("stdio client: dropping malformed frame ({reason}): {trimmed}");
                                reader_malformed.fetch_add(1, Ordering::SeqCst);
                                continue;
                            }
                        };
                        trace!("stdio client: received {trimmed}");
                        reader_health.write().unwrap().messages_received += 1;
                        if incoming_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdio client: child stdout closed (EOF)");
                        *reader_state.write().unwrap() =
                            ConnectionState::Failed("child process exited".to_string());
                        break;
                    }
                    Err(e) => {
                        error!("stdio client: stdout read error: {e}");
                        reader_health.write().unwrap().error_count += 1;
                        break;
                    }
                }
            }
        });

        let stderr_task = stderr.map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "mcprt::stdio_client::stderr", "{line}");
                }
            })
        });

        Ok(Self {
            config,
            child: Arc::new(Mutex::new(child)),
            stdin_tx,
            incoming_rx: Mutex::new(incoming_rx),
            reader_task: Mutex::new(Some(reader_task)),
            writer_task: Mutex::new(Some(writer_task)),
            stderr_task: Mutex::new(stderr_task),
            state,
            health,
            ids: RequestIdGenerator::default(),
            malformed_lines,
        })
    }

    /// Next request id from this transport's monotonic counter.
    pub fn next_request_id(&self) -> i64 {
        self.ids.next()
    }

    /// Count of stdout lines dropped for being malformed JSON-RPC.
    pub fn malformed_line_count(&self) -> u64 {
        self.malformed_lines.load(Ordering::SeqCst)
    }

    /// Probe whether the child process is still running.
    ///
    /// Uses `try_wait`, which is non-blocking: `Ok(None)` means still
    /// running, anything else means it has exited or errored.
    pub async fn is_process_running(&self) -> bool {
        let mut child = self.child.lock().await;
        matches!(child.try_wait(), Ok(None))
    }

    /// Kill the current child (if still running), respawn it from the same
    /// configuration, and restart the reader/writer/stderr tasks. Any
    /// waiters held by a higher layer (e.g. `mcprt-client`'s pending request
    /// map) are not resolved here — a dropped stdin sender or closed
    /// incoming channel is how they learn the transport reset.
    pub async fn restart(&mut self) -> Result<()> {
        {
            let mut child = self.child.lock().await;
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.writer_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.stderr_task.lock().await.take() {
            task.abort();
        }

        let fresh = Self::spawn(self.config.clone()).await?;

        // `fresh.child` is a freshly-minted `Arc` with no other holders (the
        // reader/writer/stderr tasks only capture the piped handles, never
        // the `Child` itself), so swapping the `Arc` in place is safe. The
        // new tasks captured `fresh.health`/`fresh.state`, so those `Arc`s
        // must replace ours too or health/state would go stale.
        self.child = fresh.child;
        self.stdin_tx = fresh.stdin_tx;
        self.incoming_rx = fresh.incoming_rx;
        self.reader_task = fresh.reader_task;
        self.writer_task = fresh.writer_task;
        self.stderr_task = fresh.stderr_task;
        self.state = fresh.state;
        self.health = fresh.health;

        debug!("stdio client: restarted child process '{}'", self.config.command);
        Ok(())
    }
}

#[async_trait]
impl Transport for StdioClientTransport {
    async fn send_message(&mut self, message: JsonRpcMessage) -> Result<()> {
        if !matches!(*self.state.read().unwrap(), ConnectionState::Connected) {
            return Err(TransportError::NotReady {
                state: self.state.read().unwrap().clone(),
            });
        }
        let json = serde_json::to_string(&message).map_err(|e| TransportError::SerializationError {
            message: format!("failed to serialize outbound frame: {e}"),
        })?;
        self.stdin_tx
            .send(json)
            .map_err(|_| TransportError::ProcessExited {
                message: "stdin writer task has stopped".to_string(),
            })
    }

    async fn receive_message(&mut self) -> Result<JsonRpcMessage> {
        let mut rx = self.incoming_rx.lock().await;
        match rx.recv().await {
            Some(message) => Ok(message),
            None => {
                *self.state.write().unwrap() =
                    ConnectionState::Failed("child process exited".to_string());
                Err(TransportError::ProcessExited {
                    message: "reader task closed; child process likely exited".to_string(),
                })
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        *self.state.write().unwrap() = ConnectionState::ShuttingDown;
        let mut child = self.child.lock().await;
        let _ = child.start_kill();
        let _ = child.wait().await;
        *self.state.write().unwrap() = ConnectionState::Disconnected;
        Ok(())
    }

    fn get_state(&self) -> ConnectionState {
        self.state.read().unwrap().clone()
    }

    fn get_health(&self) -> TransportHealth {
        self.health.read().unwrap().clone()
    }

    async fn shutdown(&mut self, config: crate::ShutdownConfig) -> Result<()> {
        *self.state.write().unwrap() = ConnectionState::ShuttingDown;
        let mut child = self.child.lock().await;
        let _ = child.start_kill();
        let _ = tokio::time::timeout(config.grace_period, child.wait()).await;
        drop(child);
        self.close().await
    }

    async fn force_shutdown(&mut self) -> Result<()> {
        let mut child = self.child.lock().await;
        let _ = child.start_kill();
        drop(child);
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        *self.health.write().unwrap() = TransportHealth {
            state: self.get_state(),
            ..Default::default()
        };
        Ok(())
    }
}
