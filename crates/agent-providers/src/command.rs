use crate::server::{text_content, tool_error, ProviderHandler};
use agent_mcp::protocol::{RpcErrorBody, ToolDescriptor};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Built-in command-execution provider: exposes host-automation commands as
/// tools. Always part of the session registry.
pub struct CommandProvider {
    workspace_root: Option<PathBuf>,
    exec_timeout: Duration,
}

impl CommandProvider {
    pub fn new(workspace_root: Option<PathBuf>, exec_timeout: Duration) -> Self {
        Self {
            workspace_root,
            exec_timeout,
        }
    }

    async fn run_command(&self, command: &str) -> Result<Value, RpcErrorBody> {
        debug!(command, "Executing host command");
        let output = tokio::time::timeout(
            self.exec_timeout,
            Command::new("bash").arg("-c").arg(command).output(),
        )
        .await
        .map_err(|_| tool_error("command timed out"))?
        .map_err(|e| tool_error(format!("failed to spawn: {e}")))?;

        let mut sections = Vec::new();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.is_empty() {
            sections.push(format!("stdout:\n{stdout}"));
        }
        if !stderr.is_empty() {
            sections.push(format!("stderr:\n{stderr}"));
        }
        sections.push(format!("exit_code: {}", output.status.code().unwrap_or(-1)));

        Ok(text_content(sections.join("\n")))
    }

    async fn read_file(&self, path: &str) -> Result<Value, RpcErrorBody> {
        let validated = self.validate_path(path)?;
        let content = tokio::fs::read_to_string(&validated)
            .await
            .map_err(|e| tool_error(format!("failed to read {path}: {e}")))?;
        Ok(text_content(content))
    }

    async fn list_directory(&self, path: &str) -> Result<Value, RpcErrorBody> {
        let validated = self.validate_path(path)?;
        let mut entries = tokio::fs::read_dir(&validated)
            .await
            .map_err(|e| tool_error(format!("failed to read directory {path}: {e}")))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| tool_error(format!("failed to read entry: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry.metadata().await.map(|m| m.is_dir()).unwrap_or(false);
            if is_dir {
                names.push(format!("{name}/"));
            } else {
                names.push(name);
            }
        }
        names.sort();
        Ok(text_content(names.join("\n")))
    }

    /// Confine a path to the workspace root when one is configured.
    fn validate_path(&self, raw: &str) -> Result<PathBuf, RpcErrorBody> {
        let root = match &self.workspace_root {
            Some(root) => root,
            None => return Ok(PathBuf::from(raw)),
        };

        let abs = if Path::new(raw).is_absolute() {
            PathBuf::from(raw)
        } else {
            root.join(raw)
        };
        let canonical = abs
            .canonicalize()
            .map_err(|e| tool_error(format!("failed to canonicalize {raw}: {e}")))?;
        let canon_root = root
            .canonicalize()
            .map_err(|e| tool_error(format!("failed to canonicalize workspace root: {e}")))?;

        if !canonical.starts_with(&canon_root) {
            return Err(tool_error(format!(
                "path '{}' is outside the workspace root '{}'",
                canonical.display(),
                canon_root.display()
            )));
        }
        Ok(canonical)
    }
}

#[async_trait]
impl ProviderHandler for CommandProvider {
    fn label(&self) -> &str {
        "command"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: "run_command".into(),
                description: "Execute a shell command on the host and return its output. \
                              Use this for running system commands, checking system state, etc."
                    .into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "The shell command to execute"
                        }
                    },
                    "required": ["command"]
                }),
            },
            ToolDescriptor {
                name: "read_file".into(),
                description: "Read the contents of a file and return its text.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Absolute or workspace-relative path to the file"
                        }
                    },
                    "required": ["path"]
                }),
            },
            ToolDescriptor {
                name: "list_directory".into(),
                description: "List files and directories at a given path. \
                              Directory names carry a trailing slash."
                    .into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "The directory to list. Defaults to the workspace root."
                        }
                    },
                    "required": []
                }),
            },
        ]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, RpcErrorBody> {
        match name {
            "run_command" => {
                #[derive(Deserialize)]
                struct Args {
                    command: String,
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
                self.run_command(&args.command).await
            }
            "read_file" => {
                #[derive(Deserialize)]
                struct Args {
                    path: String,
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
                self.read_file(&args.path).await
            }
            "list_directory" => {
                #[derive(Deserialize)]
                struct Args {
                    #[serde(default = "default_path")]
                    path: String,
                }
                fn default_path() -> String {
                    ".".into()
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;
                self.list_directory(&args.path).await
            }
            other => Err(tool_error(format!("no such tool: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider(root: Option<PathBuf>) -> CommandProvider {
        CommandProvider::new(root, Duration::from_secs(10))
    }

    fn first_text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_run_command_captures_output() {
        let result = provider(None)
            .call_tool("run_command", json!({"command": "echo hello"}))
            .await
            .unwrap();
        let text = first_text(&result);
        assert!(text.contains("hello"));
        assert!(text.contains("exit_code: 0"));
    }

    #[tokio::test]
    async fn test_run_command_reports_exit_code() {
        let result = provider(None)
            .call_tool("run_command", json!({"command": "exit 3"}))
            .await
            .unwrap();
        assert!(first_text(&result).contains("exit_code: 3"));
    }

    #[tokio::test]
    async fn test_read_file_within_workspace() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("note.txt"), "contents here").unwrap();

        let result = provider(Some(tmp.path().to_path_buf()))
            .call_tool("read_file", json!({"path": "note.txt"}))
            .await
            .unwrap();
        assert_eq!(first_text(&result), "contents here");
    }

    #[tokio::test]
    async fn test_read_file_outside_workspace_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let result = provider(Some(tmp.path().to_path_buf()))
            .call_tool("read_file", json!({"path": "/etc/hostname"}))
            .await;
        let err = result.unwrap_err();
        assert!(err.message.contains("outside the workspace root"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn test_list_directory_marks_directories() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("a.txt"), "x").unwrap();

        let result = provider(Some(tmp.path().to_path_buf()))
            .call_tool("list_directory", json!({}))
            .await
            .unwrap();
        let text = first_text(&result);
        assert!(text.contains("a.txt"));
        assert!(text.contains("sub/"));
    }

    #[tokio::test]
    async fn test_unknown_tool_errors() {
        let result = provider(None).call_tool("nope", json!({})).await;
        assert!(result.is_err());
    }
}
