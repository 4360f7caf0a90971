use crate::error::McpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes used by the built-in providers.
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// A JSON-RPC 2.0 request envelope.
///
/// The `id` only exists for request/response correlation; the protocol is
/// strictly request-then-response, never pipelined, so per-session uniqueness
/// is all that is required of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: String,
}

impl Request {
    /// Build a request with a fresh unique id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Uuid::new_v4().to_string(),
        }
    }
}

/// A JSON-RPC response: carries `result` or `error`, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(RpcErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn failure(id: impl Into<String>, error: RpcErrorBody) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// Resolve the response into its result, passing provider-reported
    /// errors through verbatim. The `result` field is never interpreted
    /// when an `error` object is present.
    pub fn into_result(self) -> Result<Value, McpError> {
        if let Some(err) = self.error {
            return Err(McpError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        match self.result {
            Some(result) => Ok(result),
            None => Err(McpError::MalformedResponse(
                "response carried neither result nor error".into(),
            )),
        }
    }
}

/// A tool advertised by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// Result shape of a `tools/list` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_roundtrip() {
        let request = Request::new("tools/call", json!({"name": "x", "arguments": {"a": 1}}));
        let bytes = serde_json::to_vec(&request).unwrap();
        let parsed: Request = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.jsonrpc, "2.0");
        assert_eq!(parsed.method, request.method);
        assert_eq!(parsed.params, request.params);
        assert_eq!(parsed.id, request.id);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = Request::new("tools/list", json!({}));
        let b = Request::new("tools/list", json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_success_response_resolves_to_result() {
        let response = Response::success("1", json!({"ok": true}));
        let result = response.into_result().unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[test]
    fn test_error_response_passes_code_and_message_verbatim() {
        let response = Response::error("1", -32601, "Method not found");
        match response.into_result() {
            Err(McpError::Rpc { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_takes_precedence_over_result() {
        // A malformed provider that sends both must not have its result read.
        let response: Response = serde_json::from_value(json!({
            "id": "1",
            "result": {"should": "be ignored"},
            "error": {"code": 1, "message": "boom"}
        }))
        .unwrap();
        assert!(matches!(response.into_result(), Err(McpError::Rpc { .. })));
    }

    #[test]
    fn test_neither_result_nor_error_is_malformed() {
        let response: Response = serde_json::from_value(json!({"id": "1"})).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(McpError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_success_serialization_omits_error_key() {
        let response = Response::success("1", json!(42));
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["result"], json!(42));
    }

    #[test]
    fn test_tool_descriptor_uses_wire_field_name() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({
            "name": "create_post",
            "description": "Create a post",
            "inputSchema": {"type": "object", "properties": {"title": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(descriptor.name, "create_post");
        assert_eq!(descriptor.input_schema["type"], "object");

        let value = serde_json::to_value(&descriptor).unwrap();
        assert!(value.get("inputSchema").is_some());
    }
}
