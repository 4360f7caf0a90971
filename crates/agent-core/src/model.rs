use crate::config::AppConfig;
use crate::error::AgentError;
use crate::types::{Part, Role, Turn};
use agent_mcp::protocol::ToolDescriptor;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, CreateImageRequestArgs, FunctionObjectArgs, Image,
    ImageResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// The generate capability the agent loop consumes. Everything a call needs
/// is passed in or held by the client value; no process-wide state.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the conversation plus the tool catalog, read back one candidate
    /// reply as an ordered sequence of parts.
    async fn generate(
        &self,
        turns: &[Turn],
        tools: &[ToolDescriptor],
    ) -> Result<Vec<Part>, AgentError>;
}

/// The image-generation capability, kept separate from text generation so
/// each consumer receives exactly the capability it needs, scoped to the
/// single call.
#[async_trait]
pub trait ImageClient: Send + Sync {
    /// Generate one image for the prompt and return a URL for it (a remote
    /// URL or a base64 data URL, depending on what the backend produced).
    async fn generate_image(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Production model client over an OpenAI-compatible chat-completions API.
pub struct OpenAiModelClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: Option<String>,
}

impl OpenAiModelClient {
    pub fn new(config: &AppConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.provider.api_base)
            .with_api_key(
                config
                    .provider
                    .api_key
                    .clone()
                    .unwrap_or_else(|| "not-needed".to_string()),
            );

        Self {
            client: Client::with_config(openai_config),
            model: config.provider.model.clone(),
            max_tokens: config.provider.max_tokens,
            temperature: config.provider.temperature,
            system_prompt: config.system_prompt.clone(),
        }
    }

    /// Convert conversation turns to chat-completion messages. Text parts
    /// of a turn collapse into one message; each function response becomes
    /// its own tool message.
    fn build_messages(
        &self,
        turns: &[Turn],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let mut messages = Vec::new();

        if let Some(system_prompt) = &self.system_prompt {
            let m = ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.as_str())
                .build()
                .map_err(|e| AgentError::ModelService(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(m));
        }

        for turn in turns {
            match turn.role {
                Role::User => {
                    let texts: Vec<&str> = turn
                        .parts
                        .iter()
                        .filter_map(|p| match p {
                            Part::Text { text } => Some(text.as_str()),
                            _ => None,
                        })
                        .collect();
                    if !texts.is_empty() {
                        let m = ChatCompletionRequestUserMessageArgs::default()
                            .content(texts.join("\n\n"))
                            .build()
                            .map_err(|e| AgentError::ModelService(e.to_string()))?;
                        messages.push(ChatCompletionRequestMessage::User(m));
                    }

                    for part in &turn.parts {
                        if let Part::FunctionResponse {
                            call_id, result, ..
                        } = part
                        {
                            let m = ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(call_id.as_str())
                                .content(serde_json::to_string(result)?)
                                .build()
                                .map_err(|e| AgentError::ModelService(e.to_string()))?;
                            messages.push(ChatCompletionRequestMessage::Tool(m));
                        }
                    }
                }
                Role::Model => {
                    let text: Vec<&str> = turn
                        .parts
                        .iter()
                        .filter_map(|p| match p {
                            Part::Text { text } => Some(text.as_str()),
                            _ => None,
                        })
                        .collect();

                    let tool_calls: Vec<ChatCompletionMessageToolCall> = turn
                        .parts
                        .iter()
                        .filter_map(|p| match p {
                            Part::FunctionCall { id, name, args } => {
                                Some(ChatCompletionMessageToolCall {
                                    id: id.clone(),
                                    r#type: ChatCompletionToolType::Function,
                                    function: async_openai::types::FunctionCall {
                                        name: name.clone(),
                                        arguments: args.to_string(),
                                    },
                                })
                            }
                            _ => None,
                        })
                        .collect();

                    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                    builder.content(text.join("\n\n"));
                    if !tool_calls.is_empty() {
                        builder.tool_calls(tool_calls);
                    }
                    let m = builder
                        .build()
                        .map_err(|e| AgentError::ModelService(e.to_string()))?;
                    messages.push(ChatCompletionRequestMessage::Assistant(m));
                }
            }
        }

        Ok(messages)
    }

    fn build_tools(tools: &[ToolDescriptor]) -> Result<Vec<ChatCompletionTool>, AgentError> {
        tools
            .iter()
            .map(|t| {
                let func = FunctionObjectArgs::default()
                    .name(&t.name)
                    .description(&t.description)
                    .parameters(t.input_schema.clone())
                    .build()
                    .map_err(|e| {
                        AgentError::ModelService(format!("function '{}': {}", t.name, e))
                    })?;
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(func)
                    .build()
                    .map_err(|e| AgentError::ModelService(format!("tool '{}': {}", t.name, e)))
            })
            .collect()
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    async fn generate(
        &self,
        turns: &[Turn],
        tools: &[ToolDescriptor],
    ) -> Result<Vec<Part>, AgentError> {
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(self.build_messages(turns)?)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);

        if !tools.is_empty() {
            request_builder.tools(Self::build_tools(tools)?);
        }

        let request = request_builder
            .build()
            .map_err(|e| AgentError::ModelService(e.to_string()))?;

        debug!(model = %self.model, tools = tools.len(), "Requesting generation");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ModelService(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ModelService("no candidates in model response".into()))?;

        let mut parts = Vec::new();
        if let Some(content) = choice.message.content {
            if !content.is_empty() {
                parts.push(Part::Text { text: content });
            }
        }
        if let Some(tool_calls) = choice.message.tool_calls {
            for tc in tool_calls {
                let args: Value = if tc.function.arguments.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str(&tc.function.arguments)?
                };
                parts.push(Part::FunctionCall {
                    id: tc.id,
                    name: tc.function.name,
                    args,
                });
            }
        }

        Ok(parts)
    }
}

#[async_trait]
impl ImageClient for OpenAiModelClient {
    async fn generate_image(&self, prompt: &str) -> Result<String, AgentError> {
        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .n(1)
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| AgentError::ModelService(e.to_string()))?;

        debug!("Requesting image generation");
        let response = self
            .client
            .images()
            .create(request)
            .await
            .map_err(|e| AgentError::ModelService(e.to_string()))?;

        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ModelService("no image in model response".into()))?;

        match image.as_ref() {
            Image::Url { url, .. } => Ok(url.clone()),
            Image::B64Json { b64_json, .. } => Ok(format!("data:image/png;base64,{b64_json}")),
        }
    }
}
