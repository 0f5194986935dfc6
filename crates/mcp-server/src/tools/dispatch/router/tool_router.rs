use super::super::RelayService;
use super::capabilities::capabilities;
use super::error::respond;
use crate::tools::schemas::apply_patch::ApplyPatchRequest;
use crate::tools::schemas::capabilities::CapabilitiesRequest;
use crate::tools::schemas::edit::{EditRequest, WriteRequest};
use crate::tools::schemas::grep::GrepRequest;
use crate::tools::schemas::read_file::ReadFileRequest;
use crate::tools::schemas::search::SearchToolRequest;
use crate::tools::{file_edit, grep, read_file, search};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::{tool, tool_router, ErrorData as McpError};

pub(super) fn build_tool_router() -> ToolRouter<RelayService> {
    RelayService::tool_router()
}

#[tool_router]
impl RelayService {
    /// Multi-file patch in the `*** Begin Patch` format.
    #[tool(
        description = "Apply a patch to one or more files. Format: `*** Begin Patch`, then `*** Add File: <path>` (lines prefixed with +), `*** Delete File: <path>`, or `*** Update File: <path>` (optional `*** Move to: <path>`) with hunks introduced by `@@ [header]` and lines prefixed by ' ', '-' or '+'; end with `*** End Patch`. Nothing is written unless every hunk applies."
    )]
    pub async fn apply_patch(
        &self,
        Parameters(request): Parameters<ApplyPatchRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(file_edit::apply_patch(self.ctx(), &request.patch).await))
    }

    /// Exact string replacement in one file.
    #[tool(
        description = "Replace old_string with new_string in a file. old_string must match exactly once unless replace_all is true; when no exact match exists, a whitespace-tolerant line match is tried. Line endings and BOM are preserved."
    )]
    pub async fn edit(
        &self,
        Parameters(request): Parameters<EditRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(
            file_edit::edit(
                self.ctx(),
                &request.file_path,
                &request.old_string,
                &request.new_string,
                request.replace_all.unwrap_or(false),
            )
            .await,
        ))
    }

    /// Create or overwrite a file.
    #[tool(
        description = "Create or overwrite a file with the given content. CRLF and CR line endings are written as LF."
    )]
    pub async fn write(
        &self,
        Parameters(request): Parameters<WriteRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(
            file_edit::write(self.ctx(), &request.file_path, &request.content).await,
        ))
    }

    /// Bounded file read.
    #[tool(
        description = "Read a file. mode=slice (default) returns `L<n>: text` lines from offset (1-based) for limit lines; mode=raw omits numbering; mode=indentation returns the block around indentation.anchor_line bounded by indentation structure. Long lines are cut at 500 characters."
    )]
    pub async fn read_file(
        &self,
        Parameters(request): Parameters<ReadFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(read_file::read_file(self.ctx(), request).await))
    }

    /// Content search.
    #[tool(
        description = "Search file contents for a literal or regex pattern. Filter with path, glob/include or type (rust, py, ts, ...). output_mode: files_with_matches (default), content (`path:line:text`), count. -i for case-insensitive, -n to toggle line numbers, head_limit to cap output lines."
    )]
    pub async fn grep(
        &self,
        Parameters(request): Parameters<GrepRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(grep::grep(self.ctx(), request).await))
    }

    /// Symbol, file or text search.
    #[tool(
        description = "Find symbols, files or text. target (symbol|file|text) and query_type (text|regex|glob) are inferred when omitted. Scope with path or paths (`!` prefix excludes). Returns JSON {items: [{path, line?, text?}], more?}; output=files keeps one item per file."
    )]
    pub async fn search(
        &self,
        Parameters(request): Parameters<SearchToolRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(search::search(self.ctx(), request).await))
    }

    /// Capabilities handshake.
    #[tool(
        description = "Return server version, the search primitives the upstream offers (native, legacy or missing) and the effective read/search settings."
    )]
    pub async fn capabilities(
        &self,
        Parameters(request): Parameters<CapabilitiesRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(capabilities(self, request).await)
    }
}
