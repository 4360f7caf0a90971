use crate::model::ImageClient;
use agent_mcp::protocol::{RpcErrorBody, ToolDescriptor};
use agent_providers::server::{text_content, tool_error, ProviderHandler};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Built-in image-generation provider: exposes the model backend's image
/// capability as a `generate_image` tool, so the model can request images
/// through the same dispatch path as every other tool.
pub struct ImageProvider {
    client: Arc<dyn ImageClient>,
}

impl ImageProvider {
    pub fn new(client: Arc<dyn ImageClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderHandler for ImageProvider {
    fn label(&self) -> &str {
        "image"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "generate_image".into(),
            description: "Generate an image from a text prompt and return its URL.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Description of the image to generate"
                    }
                },
                "required": ["prompt"]
            }),
        }]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, RpcErrorBody> {
        match name {
            "generate_image" => {
                #[derive(Deserialize)]
                struct Args {
                    prompt: String,
                }
                let args: Args = serde_json::from_value(args)
                    .map_err(|e| tool_error(format!("invalid arguments: {e}")))?;

                debug!("Generating image");
                let url = self
                    .client
                    .generate_image(&args.prompt)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?;
                Ok(text_content(url))
            }
            other => Err(tool_error(format!("no such tool: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    /// Answers every prompt with a fixed URL and records the prompts seen.
    struct FixedImageClient {
        url: String,
        prompts: tokio::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageClient for FixedImageClient {
        async fn generate_image(&self, prompt: &str) -> Result<String, AgentError> {
            self.prompts.lock().await.push(prompt.to_string());
            Ok(self.url.clone())
        }
    }

    fn provider(url: &str) -> (Arc<FixedImageClient>, ImageProvider) {
        let client = Arc::new(FixedImageClient {
            url: url.into(),
            prompts: tokio::sync::Mutex::new(Vec::new()),
        });
        (client.clone(), ImageProvider::new(client))
    }

    #[tokio::test]
    async fn test_generate_image_returns_url_as_text_content() {
        let (client, provider) = provider("https://img.example/cat.png");
        let result = provider
            .call_tool("generate_image", json!({"prompt": "a cat"}))
            .await
            .unwrap();
        assert_eq!(
            result["content"][0]["text"],
            "https://img.example/cat.png"
        );
        assert_eq!(*client.prompts.lock().await, vec!["a cat".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_invalid_arguments() {
        let (_, provider) = provider("unused");
        let result = provider.call_tool("generate_image", json!({})).await;
        let err = result.unwrap_err();
        assert!(err.message.contains("invalid arguments"));
    }

    #[tokio::test]
    async fn test_unknown_tool_errors() {
        let (_, provider) = provider("unused");
        assert!(provider.call_tool("nope", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_client_failure_becomes_tool_error() {
        struct FailingClient;

        #[async_trait]
        impl ImageClient for FailingClient {
            async fn generate_image(&self, _prompt: &str) -> Result<String, AgentError> {
                Err(AgentError::ModelService("no image backend".into()))
            }
        }

        let provider = ImageProvider::new(Arc::new(FailingClient));
        let result = provider
            .call_tool("generate_image", json!({"prompt": "x"}))
            .await;
        let err = result.unwrap_err();
        assert!(err.message.contains("no image backend"));
    }
}
