use crate::error::McpError;
use crate::protocol::{Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

/// A byte-oriented request/response channel to one tool provider.
///
/// One request is in flight at a time per transport; callers get the raw
/// response bytes for the request they sent.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, raw: &[u8]) -> Result<Vec<u8>, McpError>;
}

/// Provider-side handler for in-process providers. Implementations route
/// methods (`tools/list`, `tools/call`, `resources/*`) themselves and must
/// answer unknown methods with a method-not-found error.
#[async_trait]
pub trait ToolServer: Send + Sync {
    fn label(&self) -> &str;
    async fn handle(&self, request: Request) -> Response;
}

// ── Process transport ──────────────────────────────────────────────────

struct ChildIo {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Spawns an external provider command and exchanges newline-delimited JSON
/// over its stdin/stdout. The subprocess persists across calls for the
/// transport's lifetime and is spawned lazily on the first call.
pub struct ProcessTransport {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    timeout: Duration,
    io: Mutex<Option<ChildIo>>,
}

impl ProcessTransport {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            env,
            timeout,
            io: Mutex::new(None),
        }
    }

    fn spawn(&self) -> Result<ChildIo, McpError> {
        debug!(command = %self.command, "Spawning provider process");
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::Transport(format!("failed to spawn '{}': {}", self.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("child stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("child stdout unavailable".into()))?;

        Ok(ChildIo {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn send(&self, raw: &[u8]) -> Result<Vec<u8>, McpError> {
        let mut guard = self.io.lock().await;
        if guard.is_none() {
            *guard = Some(self.spawn()?);
        }
        let Some(io) = guard.as_mut() else {
            return Err(McpError::Transport("provider process unavailable".into()));
        };

        let exchange = async {
            io.stdin.write_all(raw).await?;
            io.stdin.write_all(b"\n").await?;
            io.stdin.flush().await?;

            let mut line = String::new();
            let n = io.stdout.read_line(&mut line).await?;
            if n == 0 {
                return Err(McpError::Transport(
                    "provider closed its output stream".into(),
                ));
            }
            Ok(line.into_bytes())
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => {
                // The pipe state is unknown after a failure; discard the child.
                if let Some(mut io) = guard.take() {
                    let _ = io.child.start_kill();
                }
                Err(e)
            }
            Err(_) => {
                if let Some(mut io) = guard.take() {
                    let _ = io.child.start_kill();
                }
                Err(McpError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

// ── HTTP transport ─────────────────────────────────────────────────────

/// POSTs each request body to a provider URL and returns the response body.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, raw: &[u8]) -> Result<Vec<u8>, McpError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(raw.to_vec())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    McpError::Timeout(self.timeout.as_secs())
                } else {
                    McpError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(McpError::Transport(format!(
                "HTTP status {} from {}",
                status, self.url
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

// ── In-process transport ───────────────────────────────────────────────

/// Dispatches requests to a built-in provider living in this process. The
/// byte-level contract is identical to the other transports.
pub struct InProcessTransport {
    server: Arc<dyn ToolServer>,
}

impl InProcessTransport {
    pub fn new(server: Arc<dyn ToolServer>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn send(&self, raw: &[u8]) -> Result<Vec<u8>, McpError> {
        let request: Request = serde_json::from_slice(raw).map_err(|e| {
            McpError::Transport(format!(
                "invalid request for in-process provider '{}': {}",
                self.server.label(),
                e
            ))
        })?;
        let response = self.server.handle(request).await;
        serde_json::to_vec(&response).map_err(|e| McpError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoServer;

    #[async_trait]
    impl ToolServer for EchoServer {
        fn label(&self) -> &str {
            "echo"
        }

        async fn handle(&self, request: Request) -> Response {
            Response::success(request.id, request.params)
        }
    }

    #[tokio::test]
    async fn test_in_process_transport_roundtrip() {
        let transport = InProcessTransport::new(Arc::new(EchoServer));
        let request = Request::new("anything", json!({"k": "v"}));
        let raw = serde_json::to_vec(&request).unwrap();

        let bytes = transport.send(&raw).await.unwrap();
        let response: Response = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response.id, request.id);
        assert_eq!(response.result, Some(json!({"k": "v"})));
    }

    #[tokio::test]
    async fn test_in_process_transport_rejects_garbage_request() {
        let transport = InProcessTransport::new(Arc::new(EchoServer));
        let result = transport.send(b"not json").await;
        assert!(matches!(result, Err(McpError::Transport(_))));
    }

    #[tokio::test]
    async fn test_process_transport_spawn_failure() {
        let transport = ProcessTransport::new(
            "definitely-not-a-real-binary-xyz",
            vec![],
            HashMap::new(),
            Duration::from_secs(5),
        );
        let result = transport.send(b"{}").await;
        assert!(matches!(result, Err(McpError::Transport(_))));
    }

    #[tokio::test]
    async fn test_process_transport_child_persists_across_calls() {
        // `cat` echoes each request line back; the same child must serve
        // both calls.
        let transport =
            ProcessTransport::new("cat", vec![], HashMap::new(), Duration::from_secs(5));

        let first = transport.send(br#"{"id":"1"}"#).await.unwrap();
        assert_eq!(String::from_utf8(first).unwrap().trim(), r#"{"id":"1"}"#);

        let second = transport.send(br#"{"id":"2"}"#).await.unwrap();
        assert_eq!(String::from_utf8(second).unwrap().trim(), r#"{"id":"2"}"#);
    }

    #[tokio::test]
    async fn test_process_transport_closed_output_is_transport_error() {
        // `true` exits immediately without writing anything.
        let transport =
            ProcessTransport::new("true", vec![], HashMap::new(), Duration::from_secs(5));
        let result = transport.send(b"{}").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_process_transport_timeout() {
        // `sleep` never answers; the call must expire.
        let transport = ProcessTransport::new(
            "sleep",
            vec!["30".to_string()],
            HashMap::new(),
            Duration::from_millis(100),
        );
        let result = transport.send(b"{}").await;
        assert!(matches!(result, Err(McpError::Timeout(_))));
    }
}
