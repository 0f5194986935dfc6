use std::collections::HashSet;

use relay_protocol::{SearchScope, UpstreamReply};
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys under which upstream versions report the result list.
const ENTRY_KEYS: &[&str] = &["entries", "items", "results", "files", "usages", "symbols"];
/// Keys under which upstream versions report that results were capped.
const MORE_KEYS: &[&str] = &[
    "probablyHasMoreMatchingEntries",
    "probablyHasMoreMatchingFiles",
    "probablyHasMoreUsages",
    "hasMore",
    "more",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchItem {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SearchItem {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            text: None,
        }
    }

    pub fn hit(path: impl Into<String>, line: usize, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub items: Vec<SearchItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub more: bool,
}

impl SearchOutcome {
    /// Collapse to one entry per file, keeping first-seen order.
    #[must_use]
    pub fn into_files(self) -> Self {
        let mut seen = HashSet::new();
        let items = self
            .items
            .into_iter()
            .filter(|item| seen.insert(item.path.clone()))
            .map(|item| SearchItem::file(item.path))
            .collect();
        Self {
            items,
            more: self.more,
        }
    }
}

/// Project-relative, forward-slash form of an upstream path.
pub fn normalize_result_path(raw: &str) -> String {
    let mut path = raw.trim().replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    path
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn line_field(map: &Map<String, Value>) -> Option<usize> {
    ["lineNumber", "line"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_u64))
        .and_then(|n| usize::try_from(n).ok())
}

fn item_from_value(value: &Value) -> Option<SearchItem> {
    match value {
        Value::String(path) => Some(SearchItem::file(normalize_result_path(path))),
        Value::Object(map) => {
            let path = string_field(map, &["filePath", "path", "file"])?;
            Some(SearchItem {
                path: normalize_result_path(&path),
                line: line_field(map),
                text: string_field(map, &["lineText", "text", "snippet", "name"]),
            })
        }
        _ => None,
    }
}

/// `path:line:text` or a bare path, as produced by text-only upstream builds.
fn item_from_text_line(line: &str) -> Option<SearchItem> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return None;
    }
    let mut parts = line.splitn(3, ':');
    let path = parts.next()?;
    if let (Some(number), Some(text)) = (parts.next(), parts.next()) {
        if let Ok(number) = number.trim().parse::<usize>() {
            return Some(SearchItem::hit(
                normalize_result_path(path),
                number,
                text.strip_prefix(' ').unwrap_or(text),
            ));
        }
    }
    Some(SearchItem::file(normalize_result_path(line)))
}

/// Decode an upstream search reply into items plus its "more results" flag.
pub fn parse_reply(reply: &UpstreamReply) -> (Vec<SearchItem>, bool) {
    if reply.json().is_some() {
        let items = reply
            .array(ENTRY_KEYS)
            .iter()
            .filter_map(item_from_value)
            .collect();
        return (items, reply.flag(MORE_KEYS));
    }
    let items = reply
        .document_text()
        .lines()
        .filter_map(item_from_text_line)
        .collect();
    (items, false)
}

/// Scope-filter, dedupe and cap raw results.
pub fn normalize(
    items: Vec<SearchItem>,
    scope: &SearchScope,
    limit: usize,
    upstream_more: bool,
) -> SearchOutcome {
    let mut seen = HashSet::new();
    let mut kept: Vec<SearchItem> = items
        .into_iter()
        .filter(|item| scope.matches(&item.path))
        .filter(|item| seen.insert(item.clone()))
        .collect();
    let more = upstream_more || kept.len() >= limit;
    kept.truncate(limit);
    SearchOutcome { items: kept, more }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_structured_entries() {
        let reply = UpstreamReply::from_json(json!({
            "entries": [
                {"filePath": "src/lib.rs", "lineNumber": 3, "lineText": "pub fn run()"},
                {"path": "./src/main.rs"},
            ],
            "probablyHasMoreMatchingEntries": true,
        }));
        let (items, more) = parse_reply(&reply);
        assert_eq!(
            items,
            vec![
                SearchItem::hit("src/lib.rs", 3, "pub fn run()"),
                SearchItem::file("src/main.rs"),
            ]
        );
        assert!(more);
    }

    #[test]
    fn parses_plain_text_lines() {
        let reply = UpstreamReply::from_text("src/a.rs:12: let x = 1;\nREADME.md\n\n");
        let (items, more) = parse_reply(&reply);
        assert_eq!(
            items,
            vec![
                SearchItem::hit("src/a.rs", 12, "let x = 1;"),
                SearchItem::file("README.md"),
            ]
        );
        assert!(!more);
    }

    #[test]
    fn normalize_dedupes_filters_and_caps() {
        let scope = SearchScope::parse(&["src", "!src/gen"]).unwrap();
        let items = vec![
            SearchItem::hit("src/a.rs", 1, "x"),
            SearchItem::hit("src/a.rs", 1, "x"),
            SearchItem::hit("src/gen/b.rs", 1, "x"),
            SearchItem::hit("docs/c.md", 1, "x"),
            SearchItem::hit("src/d.rs", 2, "x"),
            SearchItem::hit("src/e.rs", 3, "x"),
        ];
        let outcome = normalize(items, &scope, 2, false);
        assert_eq!(
            outcome.items,
            vec![SearchItem::hit("src/a.rs", 1, "x"), SearchItem::hit("src/d.rs", 2, "x")]
        );
        assert!(outcome.more);
    }

    #[test]
    fn more_is_false_below_the_cap() {
        let outcome = normalize(
            vec![SearchItem::file("a.rs")],
            &SearchScope::unrestricted(),
            5,
            false,
        );
        assert!(!outcome.more);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"items": [{"path": "a.rs"}]})
        );
    }

    #[test]
    fn files_output_keeps_one_entry_per_path() {
        let outcome = SearchOutcome {
            items: vec![
                SearchItem::hit("a.rs", 1, "x"),
                SearchItem::hit("a.rs", 9, "y"),
                SearchItem::hit("b.rs", 2, "z"),
            ],
            more: true,
        };
        let files = outcome.into_files();
        assert_eq!(files.items, vec![SearchItem::file("a.rs"), SearchItem::file("b.rs")]);
        assert!(files.more);
    }
}
