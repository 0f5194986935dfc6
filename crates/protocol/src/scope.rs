use crate::ToolError;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Include/exclude filter over project-relative paths.
///
/// Built once per request from a `paths` argument: plain entries are include patterns,
/// `!`-prefixed entries are excludes. Entries without glob metacharacters match as path
/// prefixes (`src` matches `src/lib.rs`), and slash-free globs also match at any depth.
#[derive(Debug, Clone)]
pub struct SearchScope {
    includes: Option<GlobSet>,
    excludes: Option<GlobSet>,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    common_directory: Option<String>,
}

impl SearchScope {
    pub fn parse<S: AsRef<str>>(paths: &[S]) -> Result<Self, ToolError> {
        let mut include_patterns = Vec::new();
        let mut exclude_patterns = Vec::new();
        for raw in paths {
            let raw = raw.as_ref().trim();
            let (negated, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let normalized = normalize_filter_path(body);
            if normalized.is_empty() {
                continue;
            }
            if negated {
                exclude_patterns.push(normalized);
            } else {
                include_patterns.push(normalized);
            }
        }

        let includes = build_set(&include_patterns)?;
        let excludes = build_set(&exclude_patterns)?;
        let common_directory = common_directory(&include_patterns);
        Ok(Self {
            includes,
            excludes,
            include_patterns,
            exclude_patterns,
            common_directory,
        })
    }

    pub fn unrestricted() -> Self {
        Self {
            includes: None,
            excludes: None,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            common_directory: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.includes.is_some() || self.excludes.is_some()
    }

    /// Deepest literal directory shared by every include pattern, if any.
    pub fn common_directory(&self) -> Option<&str> {
        self.common_directory.as_deref()
    }

    /// Pattern list in the `paths` wire shape, excludes re-prefixed with `!`.
    pub fn to_paths_arg(&self) -> Vec<String> {
        self.include_patterns
            .iter()
            .cloned()
            .chain(self.exclude_patterns.iter().map(|p| format!("!{p}")))
            .collect()
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        let path = normalize_filter_path(rel_path);
        if let Some(includes) = &self.includes {
            if !includes.is_match(&path) {
                return false;
            }
        }
        match &self.excludes {
            Some(excludes) => !excludes.is_match(&path),
            None => true,
        }
    }
}

pub fn has_glob_meta(value: &str) -> bool {
    value.contains(GLOB_META)
}

fn normalize_filter_path(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

fn compile(pattern: &str) -> Result<Glob, ToolError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| ToolError::validation(format!("Invalid path pattern '{pattern}': {err}")))
}

fn build_set(patterns: &[String]) -> Result<Option<GlobSet>, ToolError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if has_glob_meta(pattern) {
            builder.add(compile(pattern)?);
            if !pattern.contains('/') {
                builder.add(compile(&format!("**/{pattern}"))?);
            }
        } else {
            let escaped = globset::escape(pattern);
            builder.add(compile(&escaped)?);
            builder.add(compile(&format!("{escaped}/**"))?);
        }
    }
    builder
        .build()
        .map(Some)
        .map_err(|err| ToolError::validation(format!("Invalid path patterns: {err}")))
}

fn literal_dir_prefix(pattern: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    let parts: Vec<&str> = pattern.split('/').collect();
    for (idx, segment) in parts.iter().enumerate() {
        if has_glob_meta(segment) {
            break;
        }
        // The last segment of a glob, or a literal that looks like a file name, is not a directory.
        if idx + 1 == parts.len() && (has_glob_meta(pattern) || looks_like_file(segment)) {
            break;
        }
        segments.push(segment);
    }
    segments
}

fn looks_like_file(segment: &str) -> bool {
    segment
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

fn common_directory(includes: &[String]) -> Option<String> {
    let mut iter = includes.iter();
    let mut common = literal_dir_prefix(iter.next()?);
    for pattern in iter {
        let other = literal_dir_prefix(pattern);
        let shared = common
            .iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }
    if common.is_empty() {
        None
    } else {
        Some(common.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_include_is_prefix_match() {
        let scope = SearchScope::parse(&["src"]).unwrap();
        assert!(scope.matches("src/lib.rs"));
        assert!(scope.matches("src"));
        assert!(!scope.matches("src2/lib.rs"));
        assert!(!scope.matches("docs/README.md"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let scope = SearchScope::parse(&["src", "!src/gen"]).unwrap();
        assert!(scope.matches("src/lib.rs"));
        assert!(!scope.matches("src/gen/mod.rs"));
    }

    #[test]
    fn slash_free_glob_matches_at_any_depth() {
        let scope = SearchScope::parse(&["*.rs"]).unwrap();
        assert!(scope.matches("lib.rs"));
        assert!(scope.matches("crates/a/src/lib.rs"));
        assert!(!scope.matches("crates/a/README.md"));
    }

    #[test]
    fn excludes_only_scope_allows_everything_else() {
        let scope = SearchScope::parse(&["!**/target/**"]).unwrap();
        assert!(scope.is_active());
        assert!(scope.matches("src/main.rs"));
        assert!(!scope.matches("crates/a/target/debug/x"));
    }

    #[test]
    fn blank_entries_do_not_activate_scope() {
        let scope = SearchScope::parse(&["", ".", "./", "/"]).unwrap();
        assert!(!scope.is_active());
        assert!(scope.matches("anything/at/all.txt"));
    }

    #[test]
    fn common_directory_is_shared_literal_prefix() {
        let scope = SearchScope::parse(&["src/tools/*.rs", "src/tools/dispatch/**"]).unwrap();
        assert_eq!(scope.common_directory(), Some("src/tools"));

        let scope = SearchScope::parse(&["src/a.rs", "docs"]).unwrap();
        assert_eq!(scope.common_directory(), None);

        let scope = SearchScope::parse(&["*.rs"]).unwrap();
        assert_eq!(scope.common_directory(), None);

        let scope = SearchScope::parse(&["src/tools/grep.rs"]).unwrap();
        assert_eq!(scope.common_directory(), Some("src/tools"));
    }

    #[test]
    fn invalid_glob_is_validation_error() {
        let err = SearchScope::parse(&["src/[abc"]).unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[test]
    fn paths_arg_round_trips_negations() {
        let scope = SearchScope::parse(&["./src/", "!src/gen"]).unwrap();
        assert_eq!(scope.to_paths_arg(), vec!["src", "!src/gen"]);
    }
}
