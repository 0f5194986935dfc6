//! Truncation-aware reads through the upstream file reader.
//!
//! The upstream reader caps its output and appends a marker when it stops short. A read whose
//! requested range is not covered is retried once untruncated; when that retry cannot reach the
//! upstream, the lines are rebuilt from a whole-line regex search instead.

use super::indentation::{extract_block, BlockOptions};
use super::util::render_lines;
use crate::runtime_env::ReadConfig;
use crate::upstream::Upstream;
use relay_patch::normalize_newlines;
use relay_protocol::upstream::tools;
use relay_protocol::{ToolError, ToolResult, TruncateMode};
use relay_search::{reconstruct_lines, SearchError};
use serde_json::json;

/// Upstream reader output split into lines, with the truncation marker removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Document {
    pub(super) lines: Vec<String>,
    pub(super) truncated: bool,
}

/// Text before the marker when `text` ends with it, either on its own line or glued to the
/// last line. Only the single line break in front of an own-line marker is dropped.
fn strip_marker<'t>(text: &'t str, marker: &str) -> Option<&'t str> {
    if marker.is_empty() {
        return None;
    }
    let body = text.trim_end().strip_suffix(marker)?;
    Some(
        body.strip_suffix("\r\n")
            .or_else(|| body.strip_suffix('\n'))
            .or_else(|| body.strip_suffix('\r'))
            .unwrap_or(body),
    )
}

pub(super) fn split_document(text: &str, marker: &str) -> Document {
    let (body, truncated) = match strip_marker(text, marker) {
        Some(body) => (body, true),
        None => (text, false),
    };
    let normalized = normalize_newlines(body);
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_string).collect();
    // A truncated body carries no final line break, so only an empty one has no lines.
    if normalized.is_empty() || (!truncated && normalized.ends_with('\n')) {
        lines.pop();
    }
    Document { lines, truncated }
}

fn beyond_end(path: &str, line: usize, total: usize) -> ToolError {
    ToolError::validation(format!(
        "offset {line} is beyond the end of {path} ({total} line(s))"
    ))
}

/// Lines `start..=end` of a fully known prefix, clipped to its end.
fn window(path: &str, lines: &[String], start: usize, end: usize) -> ToolResult<Vec<String>> {
    if lines.is_empty() && start == 1 {
        return Ok(Vec::new());
    }
    if start > lines.len() {
        return Err(beyond_end(path, start, lines.len()));
    }
    Ok(lines[start - 1..end.min(lines.len())].to_vec())
}

pub(super) struct Reader<'a> {
    upstream: &'a dyn Upstream,
    config: &'a ReadConfig,
}

impl<'a> Reader<'a> {
    pub(super) fn new(upstream: &'a dyn Upstream, config: &'a ReadConfig) -> Self {
        Self { upstream, config }
    }

    async fn fetch(&self, path: &str, max_lines: usize, mode: TruncateMode) -> ToolResult<Document> {
        let reply = self
            .upstream
            .call(
                tools::READ_FILE,
                json!({
                    "pathInProject": path,
                    "maxLinesCount": max_lines,
                    "truncateMode": mode.as_str(),
                }),
            )
            .await?;
        Ok(split_document(
            &reply.document_text(),
            &self.config.truncation_marker,
        ))
    }

    /// Lines `start..=end` (1-based, clipped to the end of file), asking the upstream for
    /// `request_lines` lines.
    pub(super) async fn read_lines(
        &self,
        path: &str,
        start: usize,
        end: usize,
        request_lines: usize,
    ) -> ToolResult<Vec<String>> {
        let primary = self.fetch(path, request_lines, TruncateMode::Start).await?;
        if !primary.truncated || primary.lines.len() >= end {
            return window(path, &primary.lines, start, end);
        }

        log::info!(
            "read of {path} truncated after {} line(s); retrying untruncated",
            primary.lines.len()
        );
        match self.fetch(path, request_lines, TruncateMode::None).await {
            Ok(full) if !full.truncated || full.lines.len() >= end => {
                window(path, &full.lines, start, end)
            }
            Ok(full) => Err(ToolError::truncated(format!(
                "{path}: the upstream reader stops after {} line(s) even untruncated; lines {start}-{end} are unavailable",
                full.lines.len()
            ))),
            Err(ToolError::Transport(message)) => {
                log::warn!("untruncated read of {path} failed ({message}); rebuilding lines from search");
                self.reconstruct(path, start, end, request_lines).await
            }
            Err(err) => Err(err),
        }
    }

    async fn reconstruct(
        &self,
        path: &str,
        start: usize,
        end: usize,
        request_lines: usize,
    ) -> ToolResult<Vec<String>> {
        let caps = self.upstream.capabilities().await?;
        let map = match reconstruct_lines(self.upstream.caller(), &caps, path, request_lines).await
        {
            Ok(map) => map,
            Err(SearchError::Unsupported(reason)) => {
                return Err(ToolError::truncated(format!(
                    "{path} is truncated and cannot be rebuilt: {reason}"
                )))
            }
            Err(err) => return Err(err.into()),
        };

        if !map.more() && start > map.highest().max(1) {
            return Err(beyond_end(path, start, map.highest()));
        }
        if !map.covers(start, end) {
            return Err(ToolError::truncated(format!(
                "{path} is truncated; search recovered lines up to {} but {start}-{end} were requested",
                map.highest()
            )));
        }
        Ok(map.slice(start, end))
    }

    /// `limit` lines from `offset`, numbered unless `numbered` is false.
    pub(super) async fn read_slice(
        &self,
        path: &str,
        offset: usize,
        limit: usize,
        numbered: bool,
    ) -> ToolResult<String> {
        let end = offset.saturating_add(limit - 1);
        let lines = self.read_lines(path, offset, end, end.max(3)).await?;
        Ok(render_lines(
            offset,
            lines.iter().map(String::as_str),
            numbered,
            self.config.max_line_chars,
        ))
    }

    /// The block around `anchor` that its indentation structure owns, at most `max_lines` lines.
    pub(super) async fn read_indentation_block(
        &self,
        path: &str,
        anchor: usize,
        max_lines: usize,
        options: &BlockOptions,
    ) -> ToolResult<String> {
        // Lines after the anchor the block may extend over.
        let guard = anchor.saturating_add(max_lines);
        let lines = self.read_lines(path, 1, guard, guard.max(3)).await?;
        if anchor > lines.len() {
            return Err(ToolError::validation(format!(
                "anchor_line {anchor} is beyond the end of {path} ({} line(s))",
                lines.len()
            )));
        }

        let range = extract_block(&lines, anchor, options, max_lines);
        Ok(render_lines(
            range.start + 1,
            lines[range].iter().map(String::as_str),
            true,
            self.config.max_line_chars,
        ))
    }

    /// Whole document text as stored (line endings and BOM untouched), for edits.
    pub(super) async fn read_full(&self, path: &str) -> ToolResult<String> {
        let reply = self
            .upstream
            .call(
                tools::READ_FILE,
                json!({
                    "pathInProject": path,
                    "maxLinesCount": self.config.full_read_max_lines,
                    "truncateMode": TruncateMode::None.as_str(),
                }),
            )
            .await?;
        let text = reply.document_text();
        if strip_marker(&text, &self.config.truncation_marker).is_some() {
            return Err(ToolError::truncated(format!(
                "{path} exceeds {} lines and cannot be edited through the upstream reader",
                self.config.full_read_max_lines
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedUpstream, TEST_MARKER};
    use pretty_assertions::assert_eq;

    const FIVE: &str = "alpha\nbeta\ngamma\ndelta\nepsilon\n";

    fn config() -> ReadConfig {
        ReadConfig::default()
    }

    #[test]
    fn marker_on_its_own_line() {
        let doc = split_document(&format!("alpha\nbeta\n{TEST_MARKER}"), TEST_MARKER);
        assert_eq!(doc.lines, vec!["alpha", "beta"]);
        assert!(doc.truncated);
    }

    #[test]
    fn marker_glued_to_last_line() {
        let doc = split_document(&format!("alpha\nbeta{TEST_MARKER}\n"), TEST_MARKER);
        assert_eq!(doc.lines, vec!["alpha", "beta"]);
        assert!(doc.truncated);
    }

    #[test]
    fn truncated_body_keeps_trailing_blanks() {
        let doc = split_document(&format!("a\n\n{TEST_MARKER}"), TEST_MARKER);
        assert_eq!(doc.lines, vec!["a", ""]);

        let doc = split_document(&format!("a\nabc  {TEST_MARKER}"), TEST_MARKER);
        assert_eq!(doc.lines, vec!["a", "abc  "]);

        let doc = split_document(TEST_MARKER, TEST_MARKER);
        assert!(doc.lines.is_empty());
        assert!(doc.truncated);
    }

    #[test]
    fn plain_documents_keep_every_line() {
        let doc = split_document("a\r\n\r\nb", TEST_MARKER);
        assert_eq!(doc.lines, vec!["a", "", "b"]);
        assert!(!doc.truncated);
        assert!(split_document("", TEST_MARKER).lines.is_empty());
    }

    #[tokio::test]
    async fn truncated_read_retries_untruncated() {
        let upstream = ScriptedUpstream::default()
            .with_file("f.txt", FIVE)
            .truncating_at(2);
        let config = config();
        let text = Reader::new(&upstream, &config)
            .read_slice("f.txt", 3, 2, true)
            .await
            .unwrap();
        assert_eq!(text, "L3: gamma\nL4: delta");

        let calls = upstream.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1["truncateMode"], json!("START"));
        assert_eq!(calls[0].1["maxLinesCount"], json!(4));
        assert_eq!(calls[1].1["truncateMode"], json!("NONE"));
        assert_eq!(calls[1].1["maxLinesCount"], json!(4));
    }

    #[tokio::test]
    async fn formatting_is_identical_with_and_without_retry() {
        let config = config();
        let direct = ScriptedUpstream::default().with_file("f.txt", FIVE);
        let retried = ScriptedUpstream::default()
            .with_file("f.txt", FIVE)
            .truncating_at(1);
        for (offset, limit) in [(1, 5), (2, 2), (4, 10)] {
            let a = Reader::new(&direct, &config)
                .read_slice("f.txt", offset, limit, true)
                .await
                .unwrap();
            let b = Reader::new(&retried, &config)
                .read_slice("f.txt", offset, limit, true)
                .await
                .unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(direct.calls().len(), 3);
    }

    #[tokio::test]
    async fn covered_range_needs_no_retry() {
        let upstream = ScriptedUpstream::default()
            .with_file("f.txt", FIVE)
            .truncating_at(4)
            .gluing_marker();
        let config = config();
        let text = Reader::new(&upstream, &config)
            .read_slice("f.txt", 1, 3, false)
            .await
            .unwrap();
        assert_eq!(text, "alpha\nbeta\ngamma");
        assert_eq!(upstream.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_retry_falls_back_to_search() {
        let upstream = ScriptedUpstream::default()
            .with_file("f.txt", "alpha\nbeta\n\ndelta\nepsilon\n")
            .truncating_at(2)
            .failing_untruncated_reads();
        let config = config();
        let text = Reader::new(&upstream, &config)
            .read_slice("f.txt", 3, 2, true)
            .await
            .unwrap();
        assert_eq!(text, "L3: \nL4: delta");
        assert_eq!(
            upstream.call_names(),
            vec![
                tools::READ_FILE.to_string(),
                tools::READ_FILE.to_string(),
                tools::SEARCH_IN_FILES_BY_REGEX.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unrecoverable_truncation_is_reported() {
        let upstream = ScriptedUpstream::default()
            .with_tools(&[tools::READ_FILE])
            .with_file("f.txt", FIVE)
            .truncating_at(2)
            .failing_untruncated_reads();
        let config = config();
        let err = Reader::new(&upstream, &config)
            .read_slice("f.txt", 3, 2, true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "truncated_content");
    }

    #[tokio::test]
    async fn offset_past_the_end_is_invalid() {
        let upstream = ScriptedUpstream::default().with_file("f.txt", FIVE);
        let config = config();
        let err = Reader::new(&upstream, &config)
            .read_slice("f.txt", 9, 1, true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[tokio::test]
    async fn long_lines_are_cut() {
        let long = "x".repeat(600);
        let upstream = ScriptedUpstream::default().with_file("f.txt", &long);
        let config = config();
        let text = Reader::new(&upstream, &config)
            .read_slice("f.txt", 1, 1, true)
            .await
            .unwrap();
        assert_eq!(text, format!("L1: {}", "x".repeat(500)));
    }

    #[tokio::test]
    async fn full_reads_reject_truncated_documents() {
        let upstream = ScriptedUpstream::default()
            .with_tools(&[tools::READ_FILE])
            .reply(tools::READ_FILE, json!({"text": format!("a\n{TEST_MARKER}")}));
        let config = config();
        let err = Reader::new(&upstream, &config)
            .read_full("f.txt")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "truncated_content");
    }

    #[tokio::test]
    async fn indentation_block_reads_from_the_top() {
        let source = "fn a() {\n    one();\n    two();\n}\nfn b() {}\n";
        let upstream = ScriptedUpstream::default().with_file("lib.rs", source);
        let config = config();
        let text = Reader::new(&upstream, &config)
            .read_indentation_block("lib.rs", 2, 50, &BlockOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "L1: fn a() {\nL2:     one();\nL3:     two();\nL4: }");
        assert_eq!(upstream.calls()[0].1["maxLinesCount"], json!(52));
    }
}
