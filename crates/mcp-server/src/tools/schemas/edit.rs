use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EditRequest {
    #[schemars(description = "File path (absolute or relative to the project root)")]
    pub file_path: String,

    #[schemars(description = "Exact text to replace; must be non-empty and unique unless replace_all is set")]
    pub old_string: String,

    #[schemars(description = "Replacement text; must differ from old_string")]
    pub new_string: String,

    /// Replace every occurrence (default: false)
    #[schemars(description = "Replace every occurrence of old_string (default: false)")]
    pub replace_all: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WriteRequest {
    #[schemars(description = "File path (absolute or relative to the project root)")]
    pub file_path: String,

    #[schemars(description = "Full file content; CRLF and CR line endings are stored as LF")]
    pub content: String,
}
