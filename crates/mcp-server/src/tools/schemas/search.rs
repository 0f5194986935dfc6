use relay_search::{QueryType, SearchTarget};
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutput {
    /// Every hit with its line and text
    #[default]
    Entries,
    /// One item per file
    Files,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct SearchToolRequest {
    #[schemars(description = "Symbol name, file name/glob, or text to find")]
    pub query: String,

    #[schemars(description = "symbol, file or text (inferred from the query when omitted)")]
    pub target: Option<SearchTarget>,

    #[schemars(description = "text, regex or glob (inferred when omitted)")]
    pub query_type: Option<QueryType>,

    #[schemars(description = "Directory or file to restrict the search to")]
    pub path: Option<String>,

    #[schemars(
        description = "Include globs/prefixes; entries starting with `!` exclude, e.g. [\"src\", \"!src/generated\"]"
    )]
    pub paths: Option<Vec<String>>,

    #[schemars(description = "Maximum items (default: 50)")]
    pub limit: Option<i64>,

    #[schemars(description = "entries (default) or files (one item per path)")]
    pub output: Option<SearchOutput>,
}
