//! MCP tool dispatch for relay.
//!
//! The service owns the configuration, the path resolver and the shared upstream handle; the
//! router turns each tool call into a [`ToolContext`] borrowed from that state.

mod router;
mod service;

use super::context::ToolContext;
use super::paths::PathResolver;
use crate::runtime_env::RelayConfig;
use crate::upstream::Upstream;
use rmcp::handler::server::tool::ToolRouter;
use std::sync::Arc;

/// Relay MCP service
#[derive(Clone)]
pub struct RelayService {
    /// Tool router
    tool_router: ToolRouter<Self>,
    /// Shared per-process state
    state: Arc<ServiceState>,
}

struct ServiceState {
    config: RelayConfig,
    paths: PathResolver,
    upstream: Arc<dyn Upstream>,
}

impl RelayService {
    pub fn new(config: RelayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let paths = PathResolver::new(&config.project_root);
        Self {
            tool_router: router::build_tool_router(),
            state: Arc::new(ServiceState {
                config,
                paths,
                upstream,
            }),
        }
    }

    fn ctx(&self) -> ToolContext<'_> {
        ToolContext {
            upstream: self.state.upstream.as_ref(),
            paths: &self.state.paths,
            config: &self.state.config,
        }
    }
}
