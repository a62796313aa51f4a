//! Response Interpreter
//!
//! Turns a raw [`ModelResponse`] into the agent's view of it: optional
//! private thoughts and an optional tool call. Two shapes are understood:
//!
//! - native function calls surfaced by the provider, and
//! - a JSON envelope in the text, optionally inside a markdown fence:
//!
//! ```text
//! {"thoughts": "...", "payload": {"function_call": {"name": "...", "arguments": {...}}}}
//! {"thoughts": "...", "payload": {"text": "final answer"}}
//! ```
//!
//! Argument synonyms are normalized here so nothing downstream sees them.

use serde_json::{Map, Value};

use crate::provider::ModelResponse;
use crate::tool::ToolCall;

/// Keys the model may use for a function call's arguments
const ARGUMENT_KEYS: [&str; 3] = ["arguments", "args", "parameters"];

/// What the model asked for in one response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interpretation {
    /// Private reasoning, for diagnostics only
    pub thoughts: Option<String>,
    pub function_call: Option<ToolCall>,
}

impl Interpretation {
    pub fn has_function_call(&self) -> bool {
        self.function_call.is_some()
    }
}

/// Interpret a model response. Native function calls win over text.
pub fn interpret(response: &ModelResponse) -> Interpretation {
    if let Some(native) = response.function_calls.first() {
        let call = ToolCall::new(native.name.clone(), normalize_arguments(&native.args))
            .with_id(uuid::Uuid::new_v4().to_string());
        return Interpretation {
            thoughts: None,
            function_call: Some(call),
        };
    }

    let Some(envelope) = parse_envelope(response) else {
        return Interpretation::default();
    };

    let thoughts = envelope
        .get("thoughts")
        .and_then(Value::as_str)
        .map(str::to_string);

    let function_call = envelope
        .get("payload")
        .and_then(|payload| payload.get("function_call"))
        .and_then(to_tool_call)
        .map(|call| call.with_id(uuid::Uuid::new_v4().to_string()));

    Interpretation {
        thoughts,
        function_call,
    }
}

/// Final answer text from a response, or an empty string.
///
/// Empty means the model gave nothing usable and the caller should try to
/// recover; it is never a valid answer on its own.
pub fn extract_final_text(response: &ModelResponse) -> String {
    let Some(envelope) = parse_envelope(response) else {
        return String::new();
    };

    envelope
        .get("payload")
        .and_then(|payload| payload.get("text"))
        .and_then(Value::as_str)
        .or_else(|| envelope.get("text").and_then(Value::as_str))
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Canonical argument map from whatever shape the model produced
pub fn normalize_arguments(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

fn to_tool_call(value: &Value) -> Option<ToolCall> {
    let value = match value {
        Value::String(raw) => serde_json::from_str::<Value>(raw).ok()?,
        other => other.clone(),
    };

    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())?;

    let arguments = ARGUMENT_KEYS
        .iter()
        .find_map(|key| value.get(*key).filter(|v| !v.is_null()))
        .map(normalize_arguments)
        .unwrap_or_default();

    Some(ToolCall::new(name, arguments))
}

fn parse_envelope(response: &ModelResponse) -> Option<Map<String, Value>> {
    let text = response.text.as_deref()?;
    let body = unwrap_fence(text);

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        return Some(map);
    }

    // Prose around a bare object
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&body[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Contents of the first fenced code block, or the trimmed text
fn unwrap_fence(text: &str) -> &str {
    const FENCE: &str = "```";

    let trimmed = text.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let after_open = &trimmed[open + FENCE.len()..];
    // Skip the language tag, if any
    let body_start = after_open.find('\n').map_or(0, |i| i + 1);
    let tag = after_open[..body_start].trim();
    let body = if tag.starts_with('{') { after_open } else { &after_open[body_start..] };

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FunctionCall;
    use serde_json::json;

    #[test]
    fn test_native_function_call_wins() {
        let mut response = ModelResponse::from_function_call(FunctionCall::new(
            "googleSearch",
            json!({"query": "weather Lusaka"}),
        ));
        response.text = Some(r#"{"payload": {"function_call": {"name": "other"}}}"#.into());

        let parsed = interpret(&response);
        let call = parsed.function_call.unwrap();
        assert_eq!(call.name, "googleSearch");
        assert_eq!(call.arguments.get("query"), Some(&json!("weather Lusaka")));
        assert!(call.id.is_some());
        assert!(parsed.thoughts.is_none());
    }

    #[test]
    fn test_fenced_envelope_with_args_synonym() {
        let response = ModelResponse::from_text(
            "```json\n{\"thoughts\": \"need data\", \"payload\": {\"function_call\": {\"name\": \"listModels\", \"args\": {\"limit\": 3}}}}\n```",
        );

        let parsed = interpret(&response);
        assert_eq!(parsed.thoughts.as_deref(), Some("need data"));
        let call = parsed.function_call.unwrap();
        assert_eq!(call.name, "listModels");
        assert_eq!(call.arguments.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn test_parameters_given_as_json_string() {
        let response = ModelResponse::from_text(
            r#"{"payload": {"function_call": {"name": "getModelSchema", "parameters": "{\"modelName\": \"orders\"}"}}}"#,
        );

        let call = interpret(&response).function_call.unwrap();
        assert_eq!(call.arguments.get("modelName"), Some(&json!("orders")));
    }

    #[test]
    fn test_unparseable_arguments_become_empty() {
        let response = ModelResponse::from_text(
            r#"{"payload": {"function_call": {"name": "listModels", "arguments": "not json"}}}"#,
        );
        let call = interpret(&response).function_call.unwrap();
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_function_call_without_name_is_ignored() {
        let response = ModelResponse::from_text(
            r#"{"thoughts": "hmm", "payload": {"function_call": {"arguments": {}}}}"#,
        );
        let parsed = interpret(&response);
        assert!(parsed.function_call.is_none());
        assert_eq!(parsed.thoughts.as_deref(), Some("hmm"));
    }

    #[test]
    fn test_garbage_is_exit_signal() {
        let parsed = interpret(&ModelResponse::from_text("I think the answer is 42."));
        assert_eq!(parsed, Interpretation::default());
        assert!(!interpret(&ModelResponse::empty()).has_function_call());
    }

    #[test]
    fn test_extract_final_text() {
        let fenced = ModelResponse::from_text(
            "Here you go:\n```json\n{\"payload\": {\"text\": \"It's 27°C and sunny in Lusaka.\"}}\n```",
        );
        assert_eq!(extract_final_text(&fenced), "It's 27°C and sunny in Lusaka.");

        let top_level = ModelResponse::from_text(r#"{"text": "secondary key"}"#);
        assert_eq!(extract_final_text(&top_level), "secondary key");

        let bare_fence = ModelResponse::from_text("```{\"payload\": {\"text\": \"inline\"}}```");
        assert_eq!(extract_final_text(&bare_fence), "inline");
    }

    #[test]
    fn test_extract_final_text_empty_cases() {
        assert_eq!(extract_final_text(&ModelResponse::from_text("plain prose")), "");
        assert_eq!(
            extract_final_text(&ModelResponse::from_text(r#"{"payload": {"function_call": {"name": "x"}}}"#)),
            ""
        );
        assert_eq!(extract_final_text(&ModelResponse::empty()), "");
    }
}
