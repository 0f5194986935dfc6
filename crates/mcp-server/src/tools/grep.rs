//! `grep`: ripgrep-flavoured content search on top of the search dispatcher.

use super::context::ToolContext;
use super::schemas::grep::{GrepOutputMode, GrepRequest};
use super::util::{positive, under};
use relay_protocol::{SearchScope, ToolError, ToolResult};
use relay_search::{classify_pattern, QueryType, SearchItem, SearchRequest, SearchTarget};
use std::collections::HashMap;

const NO_MATCHES: &str = "No matches found";

/// File masks for ripgrep-style `type` names.
fn type_globs(name: &str) -> ToolResult<&'static [&'static str]> {
    let globs: &'static [&'static str] = match name.trim().to_ascii_lowercase().as_str() {
        "rust" | "rs" => &["*.rs"],
        "py" | "python" => &["*.py", "*.pyi"],
        "js" | "javascript" => &["*.js", "*.jsx", "*.mjs", "*.cjs"],
        "ts" | "typescript" => &["*.ts", "*.tsx", "*.mts", "*.cts"],
        "go" => &["*.go"],
        "java" => &["*.java"],
        "kotlin" | "kt" => &["*.kt", "*.kts"],
        "scala" => &["*.scala", "*.sc"],
        "c" => &["*.c", "*.h"],
        "cpp" | "c++" => &["*.cpp", "*.cc", "*.cxx", "*.hpp", "*.hh", "*.hxx", "*.h"],
        "cs" | "csharp" => &["*.cs"],
        "rb" | "ruby" => &["*.rb"],
        "php" => &["*.php"],
        "swift" => &["*.swift"],
        "sh" | "shell" => &["*.sh", "*.bash", "*.zsh"],
        "md" | "markdown" => &["*.md", "*.markdown"],
        "json" => &["*.json"],
        "yaml" | "yml" => &["*.yaml", "*.yml"],
        "toml" => &["*.toml"],
        "xml" => &["*.xml"],
        "html" => &["*.html", "*.htm"],
        "css" => &["*.css", "*.scss", "*.sass", "*.less"],
        "sql" => &["*.sql"],
        other => {
            return Err(ToolError::validation(format!(
                "Unknown file type '{other}'"
            )))
        }
    };
    Ok(globs)
}

/// Split a glob argument on whitespace and on commas outside `{...}`.
fn split_globs(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => out.push(std::mem::take(&mut current)),
            c if c.is_whitespace() && depth == 0 => out.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    out.push(current);
    out.into_iter()
        .map(|glob| glob.trim().to_string())
        .filter(|glob| !glob.is_empty())
        .collect()
}

/// Where the search is rooted: the whole project, one directory, or one file.
enum Target {
    Project,
    Directory(String),
    File(String),
}

async fn resolve_target(ctx: ToolContext<'_>, raw: Option<&str>) -> ToolResult<Target> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Target::Project);
    };
    let resolved = ctx.paths.resolve(raw)?;
    if resolved.relative.is_empty() {
        return Ok(Target::Project);
    }
    let is_file = tokio::fs::metadata(&resolved.absolute)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    Ok(if is_file {
        Target::File(resolved.relative)
    } else {
        Target::Directory(resolved.relative)
    })
}

fn render(items: &[SearchItem], mode: GrepOutputMode, line_numbers: bool) -> Vec<String> {
    match mode {
        GrepOutputMode::Content => items
            .iter()
            .map(|item| match (item.line, item.text.as_deref()) {
                (Some(line), Some(text)) if line_numbers => format!("{}:{line}:{text}", item.path),
                (_, Some(text)) => format!("{}:{text}", item.path),
                _ => item.path.clone(),
            })
            .collect(),
        GrepOutputMode::FilesWithMatches => {
            let mut seen = std::collections::HashSet::new();
            items
                .iter()
                .filter(|item| seen.insert(item.path.as_str()))
                .map(|item| item.path.clone())
                .collect()
        }
        GrepOutputMode::Count => {
            let mut order: Vec<&str> = Vec::new();
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for item in items {
                let count = counts.entry(item.path.as_str()).or_insert(0);
                if *count == 0 {
                    order.push(item.path.as_str());
                }
                *count += 1;
            }
            order
                .into_iter()
                .map(|path| format!("{path}:{}", counts[path]))
                .collect()
        }
    }
}

pub(super) async fn grep(ctx: ToolContext<'_>, request: GrepRequest) -> ToolResult<String> {
    if request.pattern.is_empty() {
        return Err(ToolError::validation("pattern must not be empty"));
    }
    let limit = positive("limit", request.limit, ctx.config.search.default_limit)?;
    let head_limit = request
        .head_limit
        .map(|value| positive("head_limit", Some(value), 0))
        .transpose()?;

    let globs: Vec<String> = [request.glob.as_deref(), request.include.as_deref()]
        .into_iter()
        .flatten()
        .flat_map(split_globs)
        .collect();
    let type_filter: Vec<String> = match request.file_type.as_deref() {
        Some(name) if !name.trim().is_empty() => {
            type_globs(name)?.iter().map(|g| g.to_string()).collect()
        }
        _ => Vec::new(),
    };
    let filters = if globs.is_empty() { &type_filter } else { &globs };

    let target = resolve_target(ctx, request.path.as_deref()).await?;
    let mut directory = None;
    let (patterns, file_mask) = match &target {
        Target::File(rel) => {
            let (parent, name) = rel.rsplit_once('/').unwrap_or(("", rel));
            if !parent.is_empty() {
                directory = Some(parent.to_string());
            }
            (vec![rel.clone()], Some(name.to_string()))
        }
        Target::Directory(dir) if filters.is_empty() => (vec![dir.clone()], None),
        Target::Directory(dir) => (filters.iter().map(|g| under(dir, g)).collect(), None),
        Target::Project => (filters.clone(), None),
    };
    let file_mask = file_mask.or_else(|| match filters.as_slice() {
        [single] if !single.contains('/') && !single.contains('{') => Some(single.clone()),
        _ => None,
    });
    let scope = SearchScope::parse(&patterns)?;

    let dialect = classify_pattern(&request.pattern);
    let mut search = SearchRequest::new(dialect.pattern());
    search.target = Some(SearchTarget::Text);
    search.query_type = Some(if dialect.is_regex() {
        QueryType::Regex
    } else {
        QueryType::Text
    });
    search.scope = scope;
    search.limit = Some(limit);
    search.case_sensitive = !request.case_insensitive.unwrap_or(false);
    search.file_mask = file_mask;
    search.directory = directory;

    let caps = ctx.upstream.capabilities().await?;
    let mut outcome = ctx
        .dispatcher()
        .dispatch(ctx.upstream.caller(), &caps, search)
        .await?;

    // A type given next to an explicit glob still narrows the result.
    if !globs.is_empty() && !type_filter.is_empty() {
        let by_type = SearchScope::parse(&type_filter)?;
        outcome.items.retain(|item| by_type.matches(&item.path));
    }

    let mode = request.output_mode.unwrap_or_default();
    let mut lines = render(&outcome.items, mode, request.line_numbers.unwrap_or(true));
    if lines.is_empty() {
        return Ok(NO_MATCHES.to_string());
    }

    let mut notes = Vec::new();
    if let Some(head) = head_limit {
        if lines.len() > head {
            notes.push(format!(
                "[{} more line(s) omitted by head_limit={head}]",
                lines.len() - head
            ));
            lines.truncate(head);
        }
    }
    if outcome.more {
        notes.push(format!(
            "[more matches exist beyond limit={limit}; narrow the pattern or path]"
        ));
    }
    lines.extend(notes);
    Ok(lines.join("\n"))
}
