//! Tool invocation context
//!
//! The event that triggered the orchestrator: an optional matcher plus the tool
//! input document. Hooks, the smart filter and the background queue each
//! receive a different projection of it.

use hookflow_core::{Error, Result};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

/// Tool name reported to the smart filter when nothing better is known
pub const UNKNOWN_TOOL: &str = "unknown";

/// Triggering tool event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolContext {
    matcher: Option<String>,
    input: Map<String, Value>,
}

impl ToolContext {
    /// Context with no matcher and an empty input
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from the raw CLI arguments
    ///
    /// An empty or missing input is treated as `{}`.
    pub fn from_args(matcher: Option<&str>, input_json: Option<&str>) -> Result<Self> {
        let input = match input_json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(Error::InvalidToolInput(format!(
                        "expected a JSON object, got {}",
                        json_kind(&other)
                    )));
                }
                Err(e) => return Err(Error::InvalidToolInput(e.to_string())),
            },
            None => Map::new(),
        };

        Ok(Self {
            matcher: matcher
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            input,
        })
    }

    /// Set the trigger matcher
    #[must_use]
    pub fn with_matcher(mut self, matcher: impl Into<String>) -> Self {
        let matcher = matcher.into();
        self.matcher = (!matcher.is_empty()).then_some(matcher);
        self
    }

    /// Set one top-level input field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input.insert(key.into(), value.into());
        self
    }

    /// The trigger matcher, if any
    pub fn matcher(&self) -> Option<&str> {
        self.matcher.as_deref()
    }

    /// The raw tool input
    pub fn input(&self) -> &Map<String, Value> {
        &self.input
    }

    /// Matcher, else the `tool` / `tool_name` field of the input
    pub fn tool_name(&self) -> Option<&str> {
        self.matcher
            .as_deref()
            .or_else(|| self.str_field("tool"))
            .or_else(|| self.str_field("tool_name"))
    }

    /// File path the tool acted on, at top level or inside `tool_input`
    pub fn file_path(&self) -> Option<PathBuf> {
        self.str_field("file_path")
            .or_else(|| {
                self.input
                    .get("tool_input")
                    .and_then(|t| t.get("file_path"))
                    .and_then(Value::as_str)
            })
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.input
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Serialized raw input, as passed to the smart filter and the queue
    pub fn input_json(&self) -> String {
        Value::Object(self.input.clone()).to_string()
    }

    /// Payload written to a hook's standard input
    ///
    /// `{"tool_name": ..., "tool_input": {...}}` where `tool_input` is, in order
    /// of preference: the input's own `tool_input` object; `{command, args}`
    /// built from an `args` array; the input without its tool name fields.
    pub fn hook_payload(&self) -> Value {
        let tool_input = if let Some(Value::Object(inner)) = self.input.get("tool_input") {
            Value::Object(inner.clone())
        } else if let Some(Value::Array(args)) = self.input.get("args") {
            let mut args = args.iter();
            match args.next() {
                Some(command) => json!({
                    "command": command,
                    "args": args.cloned().collect::<Vec<_>>(),
                }),
                None => json!({}),
            }
        } else {
            let mut rest = self.input.clone();
            rest.remove("tool");
            rest.remove("tool_name");
            Value::Object(rest)
        };

        json!({
            "tool_name": self.tool_name().unwrap_or_default(),
            "tool_input": tool_input,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_from_args_empty_input() {
        let ctx = ToolContext::from_args(None, None).unwrap();
        assert!(ctx.input().is_empty());
        assert!(ctx.tool_name().is_none());

        let ctx = ToolContext::from_args(Some("  "), Some("   ")).unwrap();
        assert!(ctx.matcher().is_none());
    }

    #[test]
    fn test_from_args_rejects_non_object() {
        let err = ToolContext::from_args(None, Some("[1,2]")).unwrap_err();
        assert!(err.to_string().contains("an array"));

        let err = ToolContext::from_args(None, Some("{oops")).unwrap_err();
        assert!(matches!(err, Error::InvalidToolInput(_)));
    }

    #[test]
    fn test_tool_name_resolution_order() {
        let ctx = ToolContext::from_args(Some("Write"), Some(r#"{"tool":"Bash"}"#)).unwrap();
        assert_eq!(ctx.tool_name(), Some("Write"));

        let ctx = ToolContext::from_args(None, Some(r#"{"tool":"Bash"}"#)).unwrap();
        assert_eq!(ctx.tool_name(), Some("Bash"));

        let ctx = ToolContext::from_args(None, Some(r#"{"tool_name":"Edit"}"#)).unwrap();
        assert_eq!(ctx.tool_name(), Some("Edit"));
    }

    #[test]
    fn test_file_path_lookup() {
        let ctx = ToolContext::new().with_field("file_path", "src/lib.rs");
        assert_eq!(ctx.file_path(), Some(PathBuf::from("src/lib.rs")));

        let ctx = ToolContext::new().with_field("tool_input", json!({"file_path": "a.txt"}));
        assert_eq!(ctx.file_path(), Some(PathBuf::from("a.txt")));

        let ctx = ToolContext::new().with_field("file_path", 3);
        assert!(ctx.file_path().is_none());
    }

    #[test]
    fn test_hook_payload_from_args_array() {
        let ctx = ToolContext::new()
            .with_field("tool", "Bash")
            .with_field("args", json!(["git", "commit", "-m", "msg"]));
        let payload = ctx.hook_payload();
        assert_eq!(payload["tool_name"], "Bash");
        assert_eq!(payload["tool_input"]["command"], "git");
        assert_eq!(payload["tool_input"]["args"], json!(["commit", "-m", "msg"]));
    }

    #[test]
    fn test_hook_payload_prefers_nested_tool_input() {
        let ctx = ToolContext::new()
            .with_matcher("Edit")
            .with_field("tool_input", json!({"file_path": "x.rs", "old": "a"}));
        let payload = ctx.hook_payload();
        assert_eq!(payload["tool_name"], "Edit");
        assert_eq!(payload["tool_input"], json!({"file_path": "x.rs", "old": "a"}));
    }

    #[test]
    fn test_hook_payload_strips_tool_fields() {
        let ctx = ToolContext::new()
            .with_field("tool", "Write")
            .with_field("file_path", "y.rs");
        let payload = ctx.hook_payload();
        assert_eq!(payload["tool_input"], json!({"file_path": "y.rs"}));
    }

    #[test]
    fn test_hook_payload_without_tool_name() {
        let payload = ToolContext::new().hook_payload();
        assert_eq!(payload, json!({"tool_name": "", "tool_input": {}}));
    }
}
