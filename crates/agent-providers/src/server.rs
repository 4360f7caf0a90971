use agent_mcp::protocol::{error_codes, Request, Response, RpcErrorBody, ToolDescriptor};
use agent_mcp::transport::ToolServer;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// What a built-in provider has to supply; the surrounding JSON-RPC method
/// routing is shared and lives in [`ProviderServer`].
#[async_trait]
pub trait ProviderHandler: Send + Sync {
    fn label(&self) -> &str;

    fn tools(&self) -> Vec<ToolDescriptor>;

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, RpcErrorBody>;

    async fn list_resources(&self) -> Result<Value, RpcErrorBody> {
        Ok(json!({ "resources": [] }))
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, RpcErrorBody> {
        Err(RpcErrorBody {
            code: error_codes::INVALID_PARAMS,
            message: format!("unknown resource: {uri}"),
        })
    }
}

/// Wraps a [`ProviderHandler`] as a [`ToolServer`], routing the wire-level
/// methods and answering anything else with method-not-found.
pub struct ProviderServer<H> {
    handler: H,
}

impl<H: ProviderHandler> ProviderServer<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct ReadParams {
    uri: String,
}

#[async_trait]
impl<H: ProviderHandler> ToolServer for ProviderServer<H> {
    fn label(&self) -> &str {
        self.handler.label()
    }

    async fn handle(&self, request: Request) -> Response {
        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            "tools/list" => Ok(json!({ "tools": self.handler.tools() })),
            "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
                Ok(params) => self.handler.call_tool(&params.name, params.arguments).await,
                Err(e) => Err(RpcErrorBody {
                    code: error_codes::INVALID_PARAMS,
                    message: format!("invalid tools/call params: {e}"),
                }),
            },
            "resources/list" => self.handler.list_resources().await,
            "resources/read" => match serde_json::from_value::<ReadParams>(request.params) {
                Ok(params) => self.handler.read_resource(&params.uri).await,
                Err(e) => Err(RpcErrorBody {
                    code: error_codes::INVALID_PARAMS,
                    message: format!("invalid resources/read params: {e}"),
                }),
            },
            other => Err(RpcErrorBody {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("method not found: {other}"),
            }),
        };

        match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        }
    }
}

/// Standard single-item text result for a tool call.
pub fn text_content(text: impl Into<String>) -> Value {
    json!({ "content": [{ "type": "text", "text": text.into() }] })
}

/// Shorthand for a tool-call failure.
pub fn tool_error(message: impl Into<String>) -> RpcErrorBody {
    RpcErrorBody {
        code: error_codes::INTERNAL_ERROR,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_mcp::protocol::Request;

    struct NullHandler;

    #[async_trait]
    impl ProviderHandler for NullHandler {
        fn label(&self) -> &str {
            "null"
        }

        fn tools(&self) -> Vec<ToolDescriptor> {
            vec![]
        }

        async fn call_tool(&self, name: &str, _args: Value) -> Result<Value, RpcErrorBody> {
            Err(tool_error(format!("no such tool: {name}")))
        }
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let server = ProviderServer::new(NullHandler);
        let response = server
            .handle(Request::new("bogus/method", json!({})))
            .await;
        let err = response.error.expect("expected error");
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list_wraps_tools_field() {
        let server = ProviderServer::new(NullHandler);
        let response = server.handle(Request::new("tools/list", json!({}))).await;
        let result = response.result.expect("expected result");
        assert_eq!(result["tools"], json!([]));
    }

    #[tokio::test]
    async fn test_tools_call_with_bad_params_is_invalid_params() {
        let server = ProviderServer::new(NullHandler);
        let response = server
            .handle(Request::new("tools/call", json!({"arguments": {}})))
            .await;
        let err = response.error.expect("expected error");
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_default_resources_list_is_empty() {
        let server = ProviderServer::new(NullHandler);
        let response = server
            .handle(Request::new("resources/list", json!({})))
            .await;
        let result = response.result.expect("expected result");
        assert_eq!(result["resources"], json!([]));
    }
}
