// Tool-call plumbing used by the MCP tool router.

pub(super) mod capabilities;
pub(super) mod error;
mod tool_router;

pub(super) fn build_tool_router() -> rmcp::handler::server::tool::ToolRouter<super::RelayService> {
    tool_router::build_tool_router()
}
