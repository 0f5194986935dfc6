use crate::runtime_env::{ReadConfig, RelayConfig};
use crate::upstream::Upstream;
use async_trait::async_trait;
use relay_protocol::upstream::tools;
use relay_protocol::{SearchCapabilities, ToolError, ToolResult, UpstreamCaller, UpstreamReply};
use relay_search::SearchConfig;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

/// Cross-test synchronization for process-wide state (env vars, cwd, etc.).
///
/// Rust tests run in parallel by default, but env vars are shared per-process.
/// Any test that mutates or depends on process-wide env should lock this mutex.
pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub(crate) const TEST_MARKER: &str = "<<<...content truncated...>>>";

/// Default tunables rooted at `root`, with no upstream command.
pub(crate) fn test_config(root: &Path) -> RelayConfig {
    RelayConfig {
        upstream: None,
        project_root: root.to_path_buf(),
        read: ReadConfig::default(),
        search: SearchConfig::default(),
    }
}

const LEGACY_TOOLS: &[&str] = &[
    tools::READ_FILE,
    tools::CREATE_FILE,
    tools::FIND_FILES_BY_GLOB,
    tools::FIND_FILES_BY_NAME_KEYWORD,
    tools::SEARCH_IN_FILES_BY_TEXT,
    tools::SEARCH_IN_FILES_BY_REGEX,
];

/// In-memory upstream: a file map behind the read/write tools, canned replies for the rest.
pub(crate) struct ScriptedUpstream {
    files: Mutex<BTreeMap<String, String>>,
    tool_names: Vec<&'static str>,
    start_read_cap: Option<usize>,
    fail_untruncated_reads: bool,
    glue_marker: bool,
    replies: HashMap<String, Value>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl Default for ScriptedUpstream {
    fn default() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            tool_names: LEGACY_TOOLS.to_vec(),
            start_read_cap: None,
            fail_untruncated_reads: false,
            glue_marker: false,
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedUpstream {
    pub(crate) fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub(crate) fn with_tools(mut self, names: &[&'static str]) -> Self {
        self.tool_names = names.to_vec();
        self
    }

    /// `START` reads return at most `lines` lines followed by the truncation marker.
    pub(crate) fn truncating_at(mut self, lines: usize) -> Self {
        self.start_read_cap = Some(lines);
        self
    }

    /// Append the marker to the last line instead of on its own line.
    pub(crate) fn gluing_marker(mut self) -> Self {
        self.glue_marker = true;
        self
    }

    pub(crate) fn failing_untruncated_reads(mut self) -> Self {
        self.fail_untruncated_reads = true;
        self
    }

    pub(crate) fn reply(mut self, tool: &str, payload: Value) -> Self {
        self.replies.insert(tool.to_string(), payload);
        self
    }

    pub(crate) fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    fn read(&self, args: &Value) -> ToolResult<UpstreamReply> {
        let path = args["pathInProject"].as_str().unwrap_or_default();
        let max_lines = args["maxLinesCount"].as_u64().unwrap_or(u64::MAX) as usize;
        let content = self
            .file(path)
            .ok_or_else(|| ToolError::transport(format!("file not found: {path}")))?;

        if args["truncateMode"] == json!("NONE") {
            if self.fail_untruncated_reads {
                return Err(ToolError::transport("connection reset"));
            }
            return Ok(UpstreamReply::from_text(content));
        }

        let lines: Vec<&str> = content.lines().collect();
        let cap = self.start_read_cap.unwrap_or(usize::MAX).min(max_lines);
        if lines.len() <= cap {
            return Ok(UpstreamReply::from_text(content));
        }
        let head = lines[..cap].join("\n");
        let text = if self.glue_marker {
            format!("{head}{TEST_MARKER}")
        } else {
            format!("{head}\n{TEST_MARKER}")
        };
        Ok(UpstreamReply::from_text(text))
    }

    fn write(&self, args: &Value) -> ToolResult<UpstreamReply> {
        let path = args["pathInProject"].as_str().unwrap_or_default().to_string();
        let text = args["text"].as_str().unwrap_or_default().to_string();
        self.files.lock().unwrap().insert(path, text);
        Ok(UpstreamReply::from_text("ok"))
    }

    /// Whole-line regex over one file: every non-blank line becomes an entry.
    fn whole_line_search(&self, path: &str, limit: usize) -> ToolResult<UpstreamReply> {
        let content = self
            .file(path)
            .ok_or_else(|| ToolError::transport(format!("file not found: {path}")))?;
        let hits: Vec<Value> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| json!({"filePath": path, "lineNumber": idx + 1, "lineText": line}))
            .collect();
        let more = hits.len() > limit;
        let entries: Vec<Value> = hits.into_iter().take(limit).collect();
        Ok(UpstreamReply::from_json(
            json!({"entries": entries, "probablyHasMoreMatchingEntries": more}),
        ))
    }
}

#[async_trait]
impl UpstreamCaller for ScriptedUpstream {
    async fn call(&self, tool: &str, args: Value) -> ToolResult<UpstreamReply> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), args.clone()));
        if !self.tool_names.contains(&tool) {
            return Err(ToolError::transport(format!("unknown upstream tool: {tool}")));
        }
        if let Some(reply) = self.replies.get(tool) {
            return Ok(UpstreamReply::from_json(reply.clone()));
        }
        match tool {
            tools::READ_FILE => self.read(&args),
            tools::CREATE_FILE => self.write(&args),
            tools::SEARCH_IN_FILES_BY_REGEX if args["regexPattern"] == json!("^.*$") => {
                let dir = args["directoryToSearch"].as_str().unwrap_or_default();
                let mask = args["fileMask"].as_str().unwrap_or_default();
                let path = if dir.is_empty() {
                    mask.to_string()
                } else {
                    format!("{dir}/{mask}")
                };
                let limit = args["maxUsageCount"].as_u64().unwrap_or(u64::MAX) as usize;
                self.whole_line_search(&path, limit)
            }
            tools::SEARCH_REGEX if args["q"] == json!("^.*$") => {
                let path = args["paths"][0].as_str().unwrap_or_default().to_string();
                let limit = args["limit"].as_u64().unwrap_or(u64::MAX) as usize;
                self.whole_line_search(&path, limit)
            }
            _ => Err(ToolError::transport(format!("no scripted reply for {tool}"))),
        }
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn capabilities(&self) -> ToolResult<SearchCapabilities> {
        Ok(SearchCapabilities::from_tool_names(
            self.tool_names.iter().copied(),
        ))
    }

    fn caller(&self) -> &dyn UpstreamCaller {
        self
    }
}
