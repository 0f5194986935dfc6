//! Contract between relay and the upstream file/search MCP server.

use crate::ToolResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upstream tool names consumed by relay.
pub mod tools {
    pub const READ_FILE: &str = "get_file_text_by_path";
    pub const CREATE_FILE: &str = "create_new_file";
    pub const FIND_FILES_BY_GLOB: &str = "find_files_by_glob";
    pub const FIND_FILES_BY_NAME_KEYWORD: &str = "find_files_by_name_keyword";
    pub const SEARCH_IN_FILES_BY_TEXT: &str = "search_in_files_by_text";
    pub const SEARCH_IN_FILES_BY_REGEX: &str = "search_in_files_by_regex";
    pub const SEARCH_TEXT: &str = "search_text";
    pub const SEARCH_REGEX: &str = "search_regex";
    pub const SEARCH_FILE: &str = "search_file";
    pub const SEARCH_SYMBOL: &str = "search_symbol";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TruncateMode {
    /// Drop content beyond the line cap and append a truncation marker.
    Start,
    /// Return the whole document.
    None,
}

impl TruncateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::None => "NONE",
        }
    }
}

/// Async capability: call a named upstream tool with JSON arguments.
///
/// Implementations turn upstream `isError` replies and transport failures into
/// [`crate::ToolError::Transport`].
#[async_trait]
pub trait UpstreamCaller: Send + Sync {
    async fn call(&self, tool: &str, args: Value) -> ToolResult<UpstreamReply>;
}

/// Successful upstream reply, normalized across upstream versions.
///
/// Some upstream builds return `structuredContent`, others put a JSON document (or plain text)
/// into the first text block. Consumers go through the accessors here instead of inspecting
/// the raw shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamReply {
    pub structured: Option<Value>,
    pub text: String,
}

impl UpstreamReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            structured: None,
            text: text.into(),
        }
    }

    pub fn from_json(value: Value) -> Self {
        Self {
            structured: Some(value),
            text: String::new(),
        }
    }

    /// Structured payload: `structuredContent` first, then JSON parsed from the text block.
    pub fn json(&self) -> Option<Value> {
        if let Some(value) = &self.structured {
            return Some(value.clone());
        }
        let trimmed = self.text.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    /// Document text: a `text`/`content` string field of the structured payload, else the raw
    /// text block. The text block is never JSON-decoded here since files may hold JSON.
    pub fn document_text(&self) -> String {
        if let Some(Value::Object(map)) = &self.structured {
            for key in ["text", "content", "result"] {
                if let Some(Value::String(text)) = map.get(key) {
                    return text.clone();
                }
            }
        }
        if let Some(Value::String(text)) = &self.structured {
            return text.clone();
        }
        self.text.clone()
    }

    /// First array found under any of `keys` (or the payload itself when it is an array).
    pub fn array(&self, keys: &[&str]) -> Vec<Value> {
        match self.json() {
            Some(Value::Array(items)) => items,
            Some(Value::Object(mut map)) => keys
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// True when any of `keys` holds `true` in the structured payload.
    pub fn flag(&self, keys: &[&str]) -> bool {
        match self.json() {
            Some(Value::Object(map)) => keys
                .iter()
                .any(|key| map.get(*key).and_then(Value::as_bool) == Some(true)),
            _ => false,
        }
    }
}
