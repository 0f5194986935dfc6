use super::context::ToolContext;
use super::schemas::search::{SearchOutput, SearchToolRequest};
use super::util::{positive, under};
use relay_protocol::{SearchScope, ToolResult};
use relay_search::SearchRequest;
use serde_json::json;

/// `search`: symbol/file/text lookup rendered as `{"items": [...], "more": true?}`.
pub(super) async fn search(ctx: ToolContext<'_>, request: SearchToolRequest) -> ToolResult<String> {
    let limit = positive("limit", request.limit, ctx.config.search.default_limit)?;

    let mut patterns = request.paths.unwrap_or_default();
    if let Some(raw) = request.path.as_deref().filter(|raw| !raw.trim().is_empty()) {
        let dir = ctx.paths.resolve(raw)?.relative;
        if !dir.is_empty() {
            patterns = within(&dir, patterns);
        }
    }

    let mut search = SearchRequest::new(request.query);
    search.target = request.target;
    search.query_type = request.query_type;
    search.scope = SearchScope::parse(&patterns)?;
    search.limit = Some(limit);

    let caps = ctx.upstream.capabilities().await?;
    let outcome = ctx
        .dispatcher()
        .dispatch(ctx.upstream.caller(), &caps, search)
        .await?;
    let outcome = match request.output.unwrap_or_default() {
        SearchOutput::Entries => outcome,
        SearchOutput::Files => outcome.into_files(),
    };
    Ok(json!(outcome).to_string())
}

/// Narrow `patterns` to `dir`: every include and exclude is re-rooted below it.
fn within(dir: &str, patterns: Vec<String>) -> Vec<String> {
    let has_include = patterns
        .iter()
        .any(|pattern| !pattern.trim().is_empty() && !pattern.trim().starts_with('!'));
    let mut out: Vec<String> = patterns
        .iter()
        .map(|pattern| pattern.trim())
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| match pattern.strip_prefix('!') {
            Some(exclude) => format!("!{}", rebase(dir, exclude)),
            None => rebase(dir, pattern),
        })
        .collect();
    if !has_include {
        out.push(dir.to_string());
    }
    out
}

fn rebase(dir: &str, pattern: &str) -> String {
    let pattern = pattern.trim_start_matches("./").trim_start_matches('/');
    if pattern.contains(['*', '?', '[', '{']) {
        under(dir, pattern)
    } else {
        format!("{dir}/{pattern}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedUpstream;
    use crate::tools::context::Fixture;
    use pretty_assertions::assert_eq;
    use relay_protocol::upstream::tools;
    use relay_search::{QueryType, SearchTarget};
    use serde_json::Value;

    fn request(query: &str) -> SearchToolRequest {
        SearchToolRequest {
            query: query.to_string(),
            ..SearchToolRequest::default()
        }
    }

    fn parse(out: &str) -> Value {
        serde_json::from_str(out).unwrap()
    }

    #[tokio::test]
    async fn legacy_glob_search_is_scoped() {
        let fx = Fixture::new(ScriptedUpstream::default().reply(
            tools::FIND_FILES_BY_GLOB,
            json!({"files": ["src/a.rs", "docs/b.rs", "./src/c.rs"]}),
        ));
        let out = search(
            fx.ctx(),
            SearchToolRequest {
                path: Some("src".to_string()),
                ..request("*.rs")
            },
        )
        .await
        .unwrap();
        assert_eq!(
            parse(&out),
            json!({"items": [{"path": "src/a.rs"}, {"path": "src/c.rs"}]})
        );

        let (name, args) = &fx.upstream.calls()[0];
        assert_eq!(name, tools::FIND_FILES_BY_GLOB);
        assert_eq!(args["globPattern"], json!("*.rs"));
        assert_eq!(args["subDirectoryRelativePath"], json!("src"));
        assert_eq!(args["fileCountLimit"], json!(250));
    }

    #[tokio::test]
    async fn path_narrows_the_paths_globs() {
        let fx = Fixture::new(ScriptedUpstream::default().reply(
            tools::FIND_FILES_BY_GLOB,
            json!({"files": ["src/a.rs", "docs/b.rs", "src/gen/c.rs"]}),
        ));
        let out = search(
            fx.ctx(),
            SearchToolRequest {
                path: Some("src".to_string()),
                paths: Some(vec!["*.rs".to_string(), "!gen/**".to_string()]),
                ..request("*.rs")
            },
        )
        .await
        .unwrap();
        assert_eq!(parse(&out), json!({"items": [{"path": "src/a.rs"}]}));
    }

    #[test]
    fn within_rebases_includes_and_excludes() {
        assert_eq!(
            within("src", vec!["*.rs".into(), "tools/mod.rs".into(), "!gen/**".into()]),
            vec!["src/**/*.rs", "src/tools/mod.rs", "!src/gen/**"]
        );
        assert_eq!(within("src", vec!["!*.md".into()]), vec!["!src/**/*.md", "src"]);
        assert_eq!(within("src", Vec::new()), vec!["src"]);
    }

    #[tokio::test]
    async fn files_output_keeps_one_item_per_path() {
        let fx = Fixture::new(ScriptedUpstream::default().reply(
            tools::SEARCH_IN_FILES_BY_TEXT,
            json!({
                "entries": [
                    {"filePath": "a.rs", "lineNumber": 1, "lineText": "let x = 1;"},
                    {"filePath": "a.rs", "lineNumber": 4, "lineText": "let x = 2;"},
                    {"filePath": "b.rs", "lineNumber": 2, "lineText": "let x = 3;"}
                ],
                "probablyHasMoreMatchingEntries": true
            }),
        ));
        let out = search(
            fx.ctx(),
            SearchToolRequest {
                output: Some(SearchOutput::Files),
                ..request("let x")
            },
        )
        .await
        .unwrap();
        assert_eq!(
            parse(&out),
            json!({"items": [{"path": "a.rs"}, {"path": "b.rs"}], "more": true})
        );
    }

    #[tokio::test]
    async fn entries_carry_line_and_text() {
        let fx = Fixture::new(ScriptedUpstream::default().reply(
            tools::SEARCH_IN_FILES_BY_TEXT,
            json!({"entries": [{"filePath": "a.rs", "lineNumber": 3, "lineText": "fn run()"}]}),
        ));
        let out = search(
            fx.ctx(),
            SearchToolRequest {
                target: Some(SearchTarget::Text),
                ..request("fn run")
            },
        )
        .await
        .unwrap();
        assert_eq!(
            parse(&out),
            json!({"items": [{"path": "a.rs", "line": 3, "text": "fn run()"}]})
        );
    }

    #[tokio::test]
    async fn symbol_search_needs_a_native_upstream() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let err = search(
            fx.ctx(),
            SearchToolRequest {
                target: Some(SearchTarget::Symbol),
                ..request("Parser")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "unsupported_operation");
        assert!(fx.upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn glob_query_type_requires_file_target() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let err = search(
            fx.ctx(),
            SearchToolRequest {
                target: Some(SearchTarget::Text),
                query_type: Some(QueryType::Glob),
                ..request("*.rs")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[tokio::test]
    async fn path_outside_the_project_is_rejected() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let err = search(
            fx.ctx(),
            SearchToolRequest {
                path: Some("../elsewhere".to_string()),
                ..request("needle")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }
}
