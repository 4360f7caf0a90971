use crate::error::AgentError;
use agent_mcp::protocol::ToolDescriptor;
use agent_mcp::session::Session;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tools whose schemas are known to be incompatible with the
/// function-calling backend.
pub const TOOL_DENYLIST: &[&str] = &["edit_file", "search_files"];

struct IndexEntry {
    session_idx: usize,
    descriptor: ToolDescriptor,
}

/// The merged tool catalog plus the name → owning-session mapping, built
/// once per invocation and shared by catalog and dispatch so that the
/// shadowing precedence is identical for both.
///
/// On a name collision the later session's tool overwrites the earlier
/// one's entry; only the most-recently-registered version survives.
pub struct ToolIndex<'a> {
    sessions: &'a [Session],
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, usize>,
}

impl<'a> ToolIndex<'a> {
    /// Query every session for its tools, in registration order, and merge
    /// them into one namespace.
    pub async fn build(sessions: &'a [Session]) -> Result<ToolIndex<'a>, AgentError> {
        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for (session_idx, session) in sessions.iter().enumerate() {
            let tools = session.list_tools().await?;
            debug!(provider = %session.label(), count = tools.len(), "Advertised tools");

            for tool in tools {
                if TOOL_DENYLIST.contains(&tool.name.as_str()) {
                    warn!(tool = %tool.name, "Skipping denylisted tool");
                    continue;
                }

                let descriptor = ToolDescriptor {
                    name: tool.name,
                    description: tool.description,
                    input_schema: normalize_schema(tool.input_schema),
                };

                match by_name.get(&descriptor.name) {
                    Some(&slot) => {
                        warn!(
                            tool = %descriptor.name,
                            shadowed = %sessions[entries[slot].session_idx].label(),
                            winner = %session.label(),
                            "Tool name collision; later registration wins"
                        );
                        entries[slot] = IndexEntry {
                            session_idx,
                            descriptor,
                        };
                    }
                    None => {
                        by_name.insert(descriptor.name.clone(), entries.len());
                        entries.push(IndexEntry {
                            session_idx,
                            descriptor,
                        });
                    }
                }
            }
        }

        Ok(ToolIndex {
            sessions,
            entries,
            by_name,
        })
    }

    /// The merged catalog, for the model's function-calling schema.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route a model-issued function call to the session owning the tool.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<Value, AgentError> {
        let slot = self
            .by_name
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        let entry = &self.entries[*slot];
        let session = &self.sessions[entry.session_idx];

        debug!(tool = name, provider = %session.label(), "Dispatching tool call");
        let raw = session.call_tool(name, args).await?;
        Ok(unwrap_first_content(raw))
    }
}

/// Strip schema markers the function-calling backend does not understand,
/// and inject an inert placeholder property when the schema would otherwise
/// declare none (the backend rejects zero-property schemas).
fn normalize_schema(schema: Value) -> Value {
    let mut obj = match schema {
        Value::Object(obj) => obj,
        _ => serde_json::Map::new(),
    };

    obj.remove("additionalProperties");
    obj.remove("$schema");

    let has_properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| !props.is_empty())
        .unwrap_or(false);
    if !has_properties {
        obj.insert(
            "properties".into(),
            json!({ "dummy": { "type": "string" } }),
        );
    }

    Value::Object(obj)
}

/// Providers answer tool calls with `{content: [item, ...]}`; only the
/// first item is used. Multi-item results lose their tail here — a known
/// limitation, not a correctness guarantee.
fn unwrap_first_content(result: Value) -> Value {
    match result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
    {
        Some(first) => first.clone(),
        None => result,
    }
}
