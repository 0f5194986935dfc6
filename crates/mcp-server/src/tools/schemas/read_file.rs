use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// `L<n>: text` lines
    #[default]
    Slice,
    /// Unnumbered lines
    Raw,
    /// Block around an anchor line, bounded by indentation
    Indentation,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct IndentationRequest {
    #[schemars(description = "Line the block is built around (1-based, default: offset)")]
    pub anchor_line: Option<i64>,

    #[schemars(
        description = "Indentation levels above the anchor the block may include; 0 means unlimited (default: 0)"
    )]
    pub max_levels: Option<i64>,

    #[schemars(description = "Keep sibling blocks at the outermost level (default: false)")]
    pub include_siblings: Option<bool>,

    #[schemars(description = "Keep comment/annotation lines directly above the block (default: true)")]
    pub include_header: Option<bool>,

    #[schemars(description = "Hard cap on returned lines (default: limit)")]
    pub max_lines: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadFileRequest {
    #[schemars(description = "File path (absolute or relative to the project root)")]
    pub file_path: String,

    /// First line (1-based, default: 1)
    #[schemars(description = "First line to return (1-based, default: 1)")]
    pub offset: Option<i64>,

    /// Number of lines (default: 2000)
    #[schemars(description = "Maximum number of lines to return (default: 2000)")]
    pub limit: Option<i64>,

    #[schemars(description = "slice (numbered, default), raw (unnumbered) or indentation (block around an anchor)")]
    pub mode: Option<ReadMode>,

    #[schemars(description = "Options for mode=indentation")]
    pub indentation: Option<IndentationRequest>,
}
