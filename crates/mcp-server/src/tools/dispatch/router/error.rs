use rmcp::model::{CallToolResult, Content};
use relay_protocol::{ErrorEnvelope, ToolError, ToolResult};
use serde_json::json;

fn render_envelope(error: &ErrorEnvelope) -> String {
    let mut lines = vec![format!("error: {}", error.code), error.message.clone()];
    if let Some(hint) = error.hint.as_deref() {
        if !hint.trim().is_empty() {
            lines.push(format!("hint: {hint}"));
        }
    }
    if let Some(details) = error.details.as_ref() {
        lines.push(format!("details: {details}"));
    }
    lines.join("\n")
}

pub(in crate::tools::dispatch) fn tool_error_envelope(error: ErrorEnvelope) -> CallToolResult {
    let mut result = CallToolResult::error(vec![Content::text(render_envelope(&error))]);
    result.structured_content = Some(json!({ "error": error }));
    result
}

pub(in crate::tools::dispatch) fn tool_error(error: &ToolError) -> CallToolResult {
    log::debug!("tool failed with {}: {error}", error.code());
    tool_error_envelope(error.envelope())
}

/// Text on success, the error envelope otherwise.
pub(in crate::tools::dispatch) fn respond(result: ToolResult<String>) -> CallToolResult {
    match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(err) => tool_error(&err),
    }
}
