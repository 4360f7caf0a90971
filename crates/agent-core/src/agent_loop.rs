use crate::catalog::ToolIndex;
use crate::error::AgentError;
use crate::model::ModelClient;
use crate::types::{wrap_function_result, Part, Turn};
use agent_mcp::protocol::ToolDescriptor;
use std::sync::Arc;
use tracing::{debug, info};

/// The generate/execute loop: send the conversation and the tool catalog to
/// the model, execute every function call it requests, feed the results
/// back, repeat. A reply with no function calls ends the loop.
///
/// The loop is bounded; a model that keeps requesting tools past the limit
/// gets cut off with an error rather than recursing forever.
pub struct AgentLoop {
    model: Arc<dyn ModelClient>,
    max_turns: u32,
}

impl AgentLoop {
    pub fn new(model: Arc<dyn ModelClient>, max_turns: u32) -> Self {
        Self { model, max_turns }
    }

    /// Run one prompt to completion. Returns the accumulated text of every
    /// model reply, in order, joined by blank lines.
    pub async fn run(&self, prompt: &str, index: &ToolIndex<'_>) -> Result<String, AgentError> {
        let mut conversation = vec![Turn::user_text(prompt)];
        let tools: Vec<ToolDescriptor> = index.descriptors().cloned().collect();
        let mut transcript: Vec<String> = Vec::new();

        for round in 0..self.max_turns {
            debug!(round, turns = conversation.len(), "Requesting model reply");
            let reply = self.model.generate(&conversation, &tools).await?;

            let texts: Vec<&str> = reply
                .iter()
                .filter_map(|p| match p {
                    Part::Text { text } if !text.is_empty() => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            if !texts.is_empty() {
                transcript.push(texts.join("\n\n"));
            }

            let calls: Vec<(String, String, serde_json::Value)> = reply
                .iter()
                .filter_map(|p| match p {
                    Part::FunctionCall { id, name, args } => {
                        Some((id.clone(), name.clone(), args.clone()))
                    }
                    _ => None,
                })
                .collect();

            if calls.is_empty() {
                return Ok(transcript.join("\n\n"));
            }

            conversation.push(Turn::model(reply));
            for (id, name, args) in calls {
                info!(tool = %name, "Executing tool call");
                let raw = index.dispatch(&name, args).await?;
                conversation.push(Turn::user_function_response(
                    id,
                    name,
                    wrap_function_result(raw),
                ));
            }
        }

        Err(AgentError::LoopLimit(self.max_turns))
    }
}
