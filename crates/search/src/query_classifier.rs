use relay_protocol::scope::has_glob_meta;
use relay_protocol::SearchCapabilities;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// What a search is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchTarget {
    /// Declarations by name (classes, functions, fields).
    Symbol,
    /// Files by name or glob.
    File,
    /// File content.
    Text,
}

/// How the query string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Text,
    Regex,
    Glob,
}

/// Result of [`classify_pattern`]: how a grep pattern will be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternDialect {
    /// No regex metacharacters; search as plain text.
    Literal(String),
    /// Parses as a regular expression unchanged.
    Regex(String),
    /// Parses only after escaping stray delimiters (unbalanced `(`, `[`, `{`).
    Lax(String),
}

impl PatternDialect {
    pub fn is_regex(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    pub fn pattern(&self) -> &str {
        match self {
            Self::Literal(p) | Self::Regex(p) | Self::Lax(p) => p,
        }
    }
}

const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// Decide whether a grep pattern is literal text or a regex.
///
/// The chain is bounded: literal check, strict parse, lax parse with stray delimiters escaped,
/// and finally the literal text.
#[must_use]
pub fn classify_pattern(pattern: &str) -> PatternDialect {
    if !pattern.contains(REGEX_META) {
        return PatternDialect::Literal(pattern.to_string());
    }
    if regex::Regex::new(pattern).is_ok() {
        return PatternDialect::Regex(pattern.to_string());
    }
    let lax = escape_stray_delimiters(pattern);
    if lax != pattern && regex::Regex::new(&lax).is_ok() {
        return PatternDialect::Lax(lax);
    }
    PatternDialect::Literal(pattern.to_string())
}

/// Escape opening delimiters that are never closed and closers that were never opened.
fn escape_stray_delimiters(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut stray = vec![false; chars.len()];
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut escaped = false;
    for (idx, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' | '[' | '{' => open.push((c, idx)),
            ')' | ']' | '}' => {
                let opener = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.last().map(|(o, _)| *o) == Some(opener) {
                    open.pop();
                } else {
                    stray[idx] = true;
                }
            }
            _ => {}
        }
    }
    for (_, idx) in open {
        stray[idx] = true;
    }
    if escaped {
        // Dangling backslash at the end.
        stray[chars.len() - 1] = true;
    }

    let mut out = String::with_capacity(pattern.len() + 4);
    for (c, is_stray) in chars.into_iter().zip(stray) {
        if is_stray {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn has_file_extension(token: &str) -> bool {
    let token = token.trim();
    let Some((stem, ext)) = token.rsplit_once('.') else {
        return false;
    };
    if ext.is_empty() || ext.len() > 6 {
        return false;
    }
    let stem_ok = !stem.is_empty() || token.starts_with('.');
    stem_ok && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

pub struct QueryClassifier;

impl QueryClassifier {
    /// A single token that looks like a file path (separators or a file extension).
    #[must_use]
    pub fn is_path_like(query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || query.contains(char::is_whitespace) {
            return false;
        }
        query.contains('/') || query.contains('\\') || has_file_extension(query)
    }

    #[must_use]
    pub fn is_glob_like(query: &str) -> bool {
        let query = query.trim();
        !query.contains(char::is_whitespace) && has_glob_meta(query)
    }

    /// Pick a target when the caller left it open.
    pub fn infer_target(query: &str, caps: &SearchCapabilities) -> Result<SearchTarget> {
        let query = query.trim();
        if Self::is_glob_like(query) || Self::is_path_like(query) {
            return Ok(SearchTarget::File);
        }
        if query.contains(char::is_whitespace) {
            return Ok(SearchTarget::Text);
        }
        if caps.symbol.is_available() {
            Ok(SearchTarget::Symbol)
        } else if caps.has_file_search() {
            Ok(SearchTarget::File)
        } else if caps.text.is_available() {
            Ok(SearchTarget::Text)
        } else {
            Err(SearchError::Unsupported(
                "the upstream server offers no search primitives".to_string(),
            ))
        }
    }

    /// Resolve the query type and reject target/type pairs that make no sense.
    pub fn resolve_query_type(
        target: SearchTarget,
        explicit: Option<QueryType>,
        query: &str,
    ) -> Result<QueryType> {
        let query_type = match explicit {
            Some(query_type) => query_type,
            None if target == SearchTarget::File && has_glob_meta(query) => QueryType::Glob,
            None => QueryType::Text,
        };
        match (target, query_type) {
            (SearchTarget::Symbol | SearchTarget::Text, QueryType::Glob) => Err(
                SearchError::InvalidArgument(format!(
                    "query_type 'glob' requires target 'file', got '{}'",
                    target.as_str()
                )),
            ),
            (SearchTarget::File, QueryType::Regex) => Err(SearchError::InvalidArgument(
                "query_type 'regex' is not supported for target 'file'; use a glob".to_string(),
            )),
            _ => Ok(query_type),
        }
    }
}

impl SearchTarget {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::File => "file",
            Self::Text => "text",
        }
    }
}

impl QueryType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Regex => "regex",
            Self::Glob => "glob",
        }
    }
}
