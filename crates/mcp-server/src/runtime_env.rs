//! Startup configuration: environment variables plus an optional TOML tunables file.

use relay_search::SearchConfig;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const UPSTREAM_COMMAND_ENV: &str = "RELAY_UPSTREAM_COMMAND";
pub const UPSTREAM_ARGS_ENV: &str = "RELAY_UPSTREAM_ARGS";
pub const PROJECT_ROOT_ENV: &str = "RELAY_PROJECT_ROOT";
pub const CONFIG_FILE_ENV: &str = "RELAY_CONFIG";

pub const DEFAULT_TRUNCATION_MARKER: &str = "<<<...content truncated...>>>";

/// Program (and arguments) spawned as the upstream MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct UpstreamCommand {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct ReadConfig {
    /// Lines returned by `read_file` when `limit` is omitted.
    pub default_limit: usize,
    /// Longest rendered line, in UTF-16 code units.
    pub max_line_chars: usize,
    /// Sentinel the upstream reader appends when it cuts a document short.
    pub truncation_marker: String,
    /// Line cap for whole-document reads (`edit`, `apply_patch`).
    pub full_read_max_lines: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            default_limit: 2000,
            max_line_chars: 500,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.to_string(),
            full_read_max_lines: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct TunablesFile {
    read: ReadConfig,
    search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub upstream: Option<UpstreamCommand>,
    pub project_root: PathBuf,
    pub read: ReadConfig,
    pub search: SearchConfig,
}

impl RelayConfig {
    /// Load from the process environment. Never fails: bad inputs log a warning and fall back.
    pub fn from_env() -> Self {
        let upstream = env_non_empty(UPSTREAM_COMMAND_ENV).map(|program| UpstreamCommand {
            program,
            args: parse_args(env_non_empty(UPSTREAM_ARGS_ENV).as_deref()),
        });

        let project_root = env_non_empty(PROJECT_ROOT_ENV)
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let tunables = env_non_empty(CONFIG_FILE_ENV)
            .map(|path| load_tunables(Path::new(&path)))
            .unwrap_or_default();

        Self {
            upstream,
            project_root,
            read: tunables.read,
            search: tunables.search,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_args(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match shell_words::split(raw) {
        Ok(args) => args,
        Err(err) => {
            log::warn!("Failed to parse {UPSTREAM_ARGS_ENV} ({err}); splitting on whitespace");
            raw.split_whitespace().map(str::to_string).collect()
        }
    }
}

fn load_tunables(path: &Path) -> TunablesFile {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("Failed to read config {}: {err}; using defaults", path.display());
            return TunablesFile::default();
        }
    };
    match toml::from_str::<TunablesFile>(&raw) {
        Ok(tunables) => tunables,
        Err(err) => {
            log::warn!("Invalid config {}: {err}; using defaults", path.display());
            TunablesFile::default()
        }
    }
}
