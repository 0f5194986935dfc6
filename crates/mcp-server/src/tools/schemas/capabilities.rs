use crate::runtime_env::ReadConfig;
use relay_protocol::SearchCapabilities;
use relay_search::SearchConfig;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct CapabilitiesRequest {}

#[derive(Debug, Serialize)]
pub struct CapabilitiesServer {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct UpstreamStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CapabilitiesResult {
    pub schema_version: u32,
    pub server: CapabilitiesServer,
    pub tools: Vec<&'static str>,
    pub project_root: String,
    pub upstream: UpstreamStatus,
    pub read: ReadConfig,
    pub search: SearchConfig,
}
