//! Client side of the proxy: a lazily spawned upstream MCP server.

use crate::runtime_env::{UpstreamCommand, UPSTREAM_COMMAND_ENV};
use async_trait::async_trait;
use relay_protocol::{SearchCapabilities, ToolError, ToolResult, UpstreamCaller, UpstreamReply};
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

type RunningUpstream = RunningService<RoleClient, ()>;

/// Upstream session as seen by the tools: a tool caller plus its search capabilities.
#[async_trait]
pub trait Upstream: UpstreamCaller {
    async fn capabilities(&self) -> ToolResult<SearchCapabilities>;

    fn caller(&self) -> &dyn UpstreamCaller;
}

struct Session {
    service: RunningUpstream,
    capabilities: SearchCapabilities,
}

/// Upstream MCP server reached over stdio.
///
/// The process is spawned on the first call; a failed connect is retried on the next call.
pub struct UpstreamClient {
    command: Option<UpstreamCommand>,
    working_dir: PathBuf,
    session: OnceCell<Session>,
}

impl UpstreamClient {
    pub fn new(command: Option<UpstreamCommand>, working_dir: PathBuf) -> Self {
        Self {
            command,
            working_dir,
            session: OnceCell::new(),
        }
    }

    async fn session(&self) -> ToolResult<&Session> {
        self.session.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> ToolResult<Session> {
        let Some(upstream) = &self.command else {
            return Err(ToolError::transport(format!(
                "no upstream MCP server configured; set {UPSTREAM_COMMAND_ENV}"
            )));
        };

        let mut command = Command::new(&upstream.program);
        command.args(&upstream.args);
        command.current_dir(&self.working_dir);
        log::info!("Spawning upstream MCP server: {} {:?}", upstream.program, upstream.args);

        let transport = TokioChildProcess::new(command).map_err(|err| {
            ToolError::transport(format!("failed to spawn upstream `{}`: {err}", upstream.program))
        })?;
        let service = tokio::time::timeout(CONNECT_TIMEOUT, ().serve(transport))
            .await
            .map_err(|_| ToolError::transport("timed out connecting to the upstream MCP server"))?
            .map_err(|err| ToolError::transport(format!("upstream MCP handshake failed: {err}")))?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|err| ToolError::transport(format!("failed to list upstream tools: {err}")))?;
        let capabilities =
            SearchCapabilities::from_tool_names(tools.iter().map(|tool| tool.name.as_ref()));
        log::info!(
            "Connected to upstream ({} tools); search capabilities: {capabilities:?}",
            tools.len()
        );

        Ok(Session {
            service,
            capabilities,
        })
    }
}

#[async_trait]
impl UpstreamCaller for UpstreamClient {
    async fn call(&self, tool: &str, args: Value) -> ToolResult<UpstreamReply> {
        let session = self.session().await?;
        log::debug!("upstream call {tool} {args}");
        let result = session
            .service
            .call_tool(CallToolRequestParam {
                name: tool.to_string().into(),
                arguments: args.as_object().cloned(),
            })
            .await
            .map_err(|err| ToolError::transport(format!("upstream `{tool}` failed: {err}")))?;
        reply_from_result(tool, result)
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    async fn capabilities(&self) -> ToolResult<SearchCapabilities> {
        Ok(self.session().await?.capabilities)
    }

    fn caller(&self) -> &dyn UpstreamCaller {
        self
    }
}

fn reply_from_result(tool: &str, result: CallToolResult) -> ToolResult<UpstreamReply> {
    let text = result
        .content
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error == Some(true) {
        let message = if text.trim().is_empty() {
            "no details".to_string()
        } else {
            text
        };
        return Err(ToolError::transport(format!("upstream `{tool}` returned an error: {message}")));
    }

    Ok(UpstreamReply {
        structured: result.structured_content,
        text,
    })
}
