//! Rebuild a file's lines from a whole-line regex search.
//!
//! Used when reading a document directly is not possible. Every line matches `^.*$`, so the
//! search results carry line numbers and texts for the file; lines the upstream did not
//! report (typically blank ones) are filled in as empty.

use std::collections::BTreeMap;

use relay_protocol::upstream::tools;
use relay_protocol::{Primitive, SearchCapabilities, UpstreamCaller};
use serde_json::json;

use crate::error::{Result, SearchError};
use crate::results::{normalize_result_path, parse_reply, SearchItem};

const WHOLE_LINE: &str = "^.*$";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMap {
    lines: BTreeMap<usize, String>,
    more: bool,
}

impl LineMap {
    /// Collect the hits that belong to `path`; `upstream_more` marks a capped result list.
    pub fn from_items(items: &[SearchItem], path: &str, upstream_more: bool) -> Self {
        let path = normalize_result_path(path);
        let mut lines = BTreeMap::new();
        for item in items {
            if normalize_result_path(&item.path) != path {
                continue;
            }
            if let (Some(line), Some(text)) = (item.line, &item.text) {
                if line > 0 {
                    lines.entry(line).or_insert_with(|| text.clone());
                }
            }
        }
        Self {
            lines,
            more: upstream_more,
        }
    }

    /// Highest line number seen.
    pub fn highest(&self) -> usize {
        self.lines.keys().next_back().copied().unwrap_or(0)
    }

    /// Whether lines beyond [`Self::highest`] may exist.
    pub const fn more(&self) -> bool {
        self.more
    }

    /// True when lines `start..=end` are known, or the file provably ends before `end`.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        let highest = self.highest();
        if highest >= end {
            return true;
        }
        !self.more && start <= highest.max(1)
    }

    /// Lines `start..=end` clipped to the known end of file, gaps as empty strings.
    pub fn slice(&self, start: usize, end: usize) -> Vec<String> {
        let end = end.min(self.highest());
        (start..=end)
            .map(|n| self.lines.get(&n).cloned().unwrap_or_default())
            .collect()
    }
}

/// Fetch up to `max_lines` lines of `path` through the regex search primitive.
pub async fn reconstruct_lines(
    upstream: &dyn UpstreamCaller,
    caps: &SearchCapabilities,
    path: &str,
    max_lines: usize,
) -> Result<LineMap> {
    let path = normalize_result_path(path);
    let reply = match caps.regex {
        Primitive::Native => {
            upstream
                .call(
                    tools::SEARCH_REGEX,
                    json!({"q": WHOLE_LINE, "paths": [path], "limit": max_lines}),
                )
                .await?
        }
        Primitive::Legacy => {
            let (directory, file_name) = match path.rsplit_once('/') {
                Some((dir, name)) => (dir, name),
                None => ("", path.as_str()),
            };
            let mut args = json!({
                "regexPattern": WHOLE_LINE,
                "fileMask": file_name,
                "caseSensitive": true,
                "maxUsageCount": max_lines,
            });
            if !directory.is_empty() {
                args["directoryToSearch"] = json!(directory);
            }
            upstream.call(tools::SEARCH_IN_FILES_BY_REGEX, args).await?
        }
        Primitive::Missing => {
            return Err(SearchError::Unsupported(
                "line reconstruction needs a regex search primitive".to_string(),
            ))
        }
    };

    let (items, upstream_more) = parse_reply(&reply);
    let mut map = LineMap::from_items(&items, &path, upstream_more);
    // A result list cut at the cap may hide later lines even without an explicit flag.
    if map.lines.len() >= max_lines {
        map.more = true;
    }
    log::info!(
        "reconstructed {} line(s) of {path} from search (more: {})",
        map.lines.len(),
        map.more
    );
    Ok(map)
}
