use crate::error::McpError;
use crate::protocol::{ListToolsResult, Request, Response, ToolDescriptor};
use crate::transport::Transport;
use serde_json::{json, Value};
use tracing::debug;

/// A live binding to one provider over one transport, used for all calls to
/// that provider during one invocation.
///
/// The session exclusively owns its transport and holds no state between
/// calls; each call is independent.
pub struct Session {
    label: String,
    transport: Box<dyn Transport>,
}

impl Session {
    pub fn new(label: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            label: label.into(),
            transport,
        }
    }

    /// Human-readable provider label, used for logging only.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The single low-level primitive: build a request with a fresh id,
    /// exchange it over the transport, and resolve the response.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let request = Request::new(method, params);
        debug!(provider = %self.label, method, id = %request.id, "RPC call");

        let raw = serde_json::to_vec(&request)
            .map_err(|e| McpError::MalformedResponse(e.to_string()))?;
        let raw_response = self.transport.send(&raw).await?;

        let response: Response = serde_json::from_slice(&raw_response)
            .map_err(|e| McpError::MalformedResponse(e.to_string()))?;
        response.into_result()
    }

    /// List the tools this provider advertises.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let result = self.call("tools/list", json!({})).await?;
        let parsed: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| McpError::MalformedResponse(e.to_string()))?;
        Ok(parsed.tools)
    }

    /// Invoke a named tool with the given arguments.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        self.call(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )
        .await
    }

    /// List the resources this provider exposes.
    pub async fn list_resources(&self) -> Result<Value, McpError> {
        self.call("resources/list", json!({})).await
    }

    /// Read a resource by uri.
    pub async fn read_resource(&self, uri: &str) -> Result<Value, McpError> {
        self.call("resources/read", json!({ "uri": uri })).await
    }
}
