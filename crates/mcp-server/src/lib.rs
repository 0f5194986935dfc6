//! Relay MCP server
//!
//! Exposes patch, edit, read and search tools to AI agents and implements each of them as a
//! sequence of calls to an upstream file/search MCP server (typically an IDE).
//!
//! ## Tools
//!
//! - `apply_patch` - Apply a `*** Begin Patch` block (add/delete/update/move files)
//! - `edit` / `write` - String-replacement edit and whole-file write
//! - `read_file` - Line-numbered slice or indentation-aware block of a file
//! - `grep` / `search` - Content, file and symbol search over the upstream primitives
//! - `capabilities` - Server version, upstream search primitives and tunables
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "relay": {
//!       "command": "relay-mcp",
//!       "env": { "RELAY_UPSTREAM_COMMAND": "ide-mcp-bridge" }
//!     }
//!   }
//! }
//! ```

use anyhow::{Context as AnyhowContext, Result};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use std::sync::Arc;

pub mod runtime_env;
#[cfg(test)]
pub(crate) mod test_support;
mod tools;
pub mod upstream;

pub use runtime_env::RelayConfig;
pub use tools::RelayService;
pub use upstream::{Upstream, UpstreamClient};

/// Run the server on stdio until the client disconnects.
pub async fn main_entry() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = RelayConfig::from_env();
    if config.upstream.is_none() {
        log::warn!(
            "{} is not set; tools that need the upstream server will fail",
            runtime_env::UPSTREAM_COMMAND_ENV
        );
    }
    log::info!(
        "Starting relay MCP server (project root: {})",
        config.project_root.display()
    );

    let upstream = Arc::new(UpstreamClient::new(
        config.upstream.clone(),
        config.project_root.clone(),
    ));
    let service = RelayService::new(config, upstream);
    let server = service
        .serve(stdio())
        .await
        .context("failed to start MCP stdio transport")?;

    server
        .waiting()
        .await
        .context("MCP server terminated abnormally")?;

    log::info!("Relay MCP server stopped");
    Ok(())
}
