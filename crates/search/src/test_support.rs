use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use relay_protocol::{ToolError, ToolResult, UpstreamCaller, UpstreamReply};
use serde_json::Value;

/// Upstream fake: canned replies per tool name, every call recorded.
#[derive(Default)]
pub struct RecordingUpstream {
    replies: HashMap<String, UpstreamReply>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingUpstream {
    pub fn reply(mut self, tool: &str, payload: Value) -> Self {
        self.replies
            .insert(tool.to_string(), UpstreamReply::from_json(payload));
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamCaller for RecordingUpstream {
    async fn call(&self, tool: &str, args: Value) -> ToolResult<UpstreamReply> {
        self.calls.lock().unwrap().push((tool.to_string(), args));
        self.replies
            .get(tool)
            .cloned()
            .ok_or_else(|| ToolError::transport(format!("no such tool: {tool}")))
    }
}
