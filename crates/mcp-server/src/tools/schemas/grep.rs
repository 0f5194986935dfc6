use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GrepOutputMode {
    /// Matching lines as `path:line:text`
    Content,
    /// One path per matching file
    #[default]
    FilesWithMatches,
    /// `path:count` per matching file
    Count,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GrepRequest {
    #[schemars(description = "Literal text or regular expression to search for")]
    pub pattern: String,

    #[schemars(description = "File or directory to search in (default: project root)")]
    pub path: Option<String>,

    #[schemars(description = "Glob filter, e.g. `*.rs` or `src/**/*.{ts,tsx}`")]
    pub glob: Option<String>,

    #[schemars(description = "Alias for glob")]
    pub include: Option<String>,

    /// ripgrep-style file type
    #[serde(rename = "type")]
    #[schemars(description = "File type filter, e.g. rust, py, js, ts, go, java")]
    pub file_type: Option<String>,

    #[schemars(description = "content, files_with_matches (default) or count")]
    pub output_mode: Option<GrepOutputMode>,

    #[schemars(description = "Maximum matches fetched from the upstream (default: 50)")]
    pub limit: Option<i64>,

    #[serde(rename = "-i")]
    #[schemars(description = "Case-insensitive search")]
    pub case_insensitive: Option<bool>,

    #[serde(rename = "-n")]
    #[schemars(description = "Show line numbers in content mode (default: true)")]
    pub line_numbers: Option<bool>,

    #[schemars(description = "Keep only the first N output lines")]
    pub head_limit: Option<i64>,
}
