use super::super::RelayService;
use crate::tools::catalog;
use crate::tools::schemas::capabilities::{
    CapabilitiesRequest, CapabilitiesResult, CapabilitiesServer, UpstreamStatus,
};
use relay_protocol::CAPABILITIES_SCHEMA_VERSION;
use rmcp::model::{CallToolResult, Content};
use serde_json::json;

/// Server identity, upstream search primitives and the effective tunables.
pub(in crate::tools::dispatch) async fn capabilities(
    service: &RelayService,
    _request: CapabilitiesRequest,
) -> CallToolResult {
    let state = &service.state;
    let upstream = match state.upstream.capabilities().await {
        Ok(search) => UpstreamStatus {
            configured: state.config.upstream.is_some(),
            search: Some(search),
            error: None,
        },
        Err(err) => {
            log::warn!("capabilities: upstream unavailable: {err}");
            UpstreamStatus {
                configured: state.config.upstream.is_some(),
                search: None,
                error: Some(err.to_string()),
            }
        }
    };

    let result = CapabilitiesResult {
        schema_version: CAPABILITIES_SCHEMA_VERSION,
        server: CapabilitiesServer {
            name: "relay-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        tools: catalog::tool_names().collect(),
        project_root: state.paths.root().display().to_string(),
        upstream,
        read: state.config.read.clone(),
        search: state.config.search,
    };

    let value = json!(result);
    let mut output = CallToolResult::success(vec![Content::text(value.to_string())]);
    output.structured_content = Some(value);
    output
}
