use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ApplyPatchRequest {
    /// Patch text, `*** Begin Patch` through `*** End Patch`
    #[schemars(
        description = "Patch text. Starts with `*** Begin Patch`, ends with `*** End Patch`; contains `*** Add File:`, `*** Delete File:` or `*** Update File:` sections (optionally `*** Move to:`), hunks introduced by `@@`."
    )]
    pub patch: String,
}
