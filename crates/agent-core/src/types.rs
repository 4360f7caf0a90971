use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One piece of a turn: plain text, a function call requested by the model,
/// or the result of executing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        id: String,
        name: String,
        args: Value,
    },
    FunctionResponse {
        call_id: String,
        name: String,
        result: Value,
    },
}

/// A role paired with an ordered sequence of parts. A conversation is an
/// append-only sequence of turns within one agent-loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    pub fn user_function_response(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: Value,
    ) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::FunctionResponse {
                call_id: call_id.into(),
                name: name.into(),
                result,
            }],
        }
    }
}

/// Normalize a raw tool result for embedding in a function response:
/// composite values (arrays and objects) pass through as-is, scalars are
/// first wrapped in a single-element array, then the whole thing in
/// `{"result": ...}`. The response-embedding contract requires this
/// uniform shape.
pub fn wrap_function_result(raw: Value) -> Value {
    let inner = match raw {
        Value::Array(_) | Value::Object(_) => raw,
        other => Value::Array(vec![other]),
    };
    json!({ "result": inner })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_scalar_result() {
        let wrapped = wrap_function_result(json!("done"));
        assert_eq!(wrapped, json!({"result": ["done"]}));
    }

    #[test]
    fn test_wrap_object_result_passes_through() {
        let wrapped = wrap_function_result(json!({"type": "text", "text": "hi"}));
        assert_eq!(wrapped, json!({"result": {"type": "text", "text": "hi"}}));
    }

    #[test]
    fn test_wrap_array_result_passes_through() {
        let wrapped = wrap_function_result(json!([1, 2]));
        assert_eq!(wrapped, json!({"result": [1, 2]}));
    }

    #[test]
    fn test_wrap_number_result() {
        let wrapped = wrap_function_result(json!(7));
        assert_eq!(wrapped, json!({"result": [7]}));
    }

    #[test]
    fn test_part_serialization_is_tagged() {
        let part = Part::FunctionCall {
            id: "call_1".into(),
            name: "run_command".into(),
            args: json!({"command": "ls"}),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "function_call");
        assert_eq!(value["name"], "run_command");
    }
}
