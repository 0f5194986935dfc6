use async_trait::async_trait;
use relay_protocol::upstream::tools;
use relay_protocol::{Primitive, SearchCapabilities, SearchScope, UpstreamCaller};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, SearchError};
use crate::query_classifier::{QueryClassifier, QueryType, SearchTarget};
use crate::results::{normalize, parse_reply, SearchOutcome};

/// Search tunables, loaded from the `[search]` table of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    /// Legacy primitives cannot filter by scope, so scoped legacy searches ask for
    /// `limit * multiplier` results (at most `cap`) and filter locally.
    pub legacy_overfetch_multiplier: usize,
    pub legacy_overfetch_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            legacy_overfetch_multiplier: 5,
            legacy_overfetch_cap: 1000,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn fetch_limit(&self, limit: usize, scoped: bool) -> usize {
        if !scoped {
            return limit;
        }
        limit
            .saturating_mul(self.legacy_overfetch_multiplier.max(1))
            .min(self.legacy_overfetch_cap)
            .max(limit)
    }
}

/// Caller-facing search arguments before inference.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub target: Option<SearchTarget>,
    pub query_type: Option<QueryType>,
    pub scope: SearchScope,
    pub limit: Option<usize>,
    pub case_sensitive: bool,
    /// File-name mask for legacy content search (`*.rs`); native backends rely on `scope`.
    pub file_mask: Option<String>,
    /// Directory handed to legacy tools in place of the scope's shared prefix.
    pub directory: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            target: None,
            query_type: None,
            scope: SearchScope::unrestricted(),
            limit: None,
            case_sensitive: true,
            file_mask: None,
            directory: None,
        }
    }
}

/// Fully resolved search, ready for a backend.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub query: String,
    pub target: SearchTarget,
    pub query_type: QueryType,
    pub scope: SearchScope,
    pub limit: usize,
    pub case_sensitive: bool,
    pub file_mask: Option<String>,
    pub directory: Option<String>,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, upstream: &dyn UpstreamCaller, plan: &SearchPlan) -> Result<SearchOutcome>;
}

/// Combined `search_*` primitives that take the scope as a `paths` list.
pub struct NativeSearch;

#[async_trait]
impl SearchBackend for NativeSearch {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn run(&self, upstream: &dyn UpstreamCaller, plan: &SearchPlan) -> Result<SearchOutcome> {
        let (tool, query) = match (plan.target, plan.query_type) {
            (SearchTarget::Symbol, _) => (tools::SEARCH_SYMBOL, plan.query.clone()),
            (SearchTarget::File, _) => (tools::SEARCH_FILE, plan.query.clone()),
            (SearchTarget::Text, QueryType::Regex) if !plan.case_sensitive => {
                (tools::SEARCH_REGEX, format!("(?i){}", plan.query))
            }
            (SearchTarget::Text, QueryType::Regex) => (tools::SEARCH_REGEX, plan.query.clone()),
            (SearchTarget::Text, _) if !plan.case_sensitive => {
                (tools::SEARCH_REGEX, format!("(?i){}", regex::escape(&plan.query)))
            }
            (SearchTarget::Text, _) => (tools::SEARCH_TEXT, plan.query.clone()),
        };

        let mut args = Map::new();
        args.insert("q".to_string(), json!(query));
        let paths = plan.scope.to_paths_arg();
        if !paths.is_empty() {
            args.insert("paths".to_string(), json!(paths));
        }
        args.insert("limit".to_string(), json!(plan.limit));

        let reply = upstream.call(tool, Value::Object(args)).await?;
        let (items, more) = parse_reply(&reply);
        Ok(normalize(items, &plan.scope, plan.limit, more))
    }
}

/// Finder and content-search tools of older upstreams, filtered locally.
pub struct LegacySearch {
    config: SearchConfig,
}

impl LegacySearch {
    pub const fn new(config: SearchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SearchBackend for LegacySearch {
    fn name(&self) -> &'static str {
        "legacy"
    }

    async fn run(&self, upstream: &dyn UpstreamCaller, plan: &SearchPlan) -> Result<SearchOutcome> {
        let fetch = self.config.fetch_limit(plan.limit, plan.scope.is_active());
        let directory = plan
            .directory
            .as_deref()
            .or_else(|| plan.scope.common_directory());

        let (tool, mut args) = match (plan.target, plan.query_type) {
            (SearchTarget::Symbol, _) => {
                return Err(SearchError::Unsupported(
                    "symbol search needs the upstream `search_symbol` tool".to_string(),
                ))
            }
            (SearchTarget::File, QueryType::Glob) => {
                let mut args = Map::new();
                args.insert("globPattern".to_string(), json!(plan.query));
                if let Some(dir) = directory {
                    args.insert("subDirectoryRelativePath".to_string(), json!(dir));
                }
                args.insert("fileCountLimit".to_string(), json!(fetch));
                (tools::FIND_FILES_BY_GLOB, args)
            }
            (SearchTarget::File, _) => {
                let mut args = Map::new();
                args.insert("nameKeyword".to_string(), json!(plan.query));
                args.insert("fileCountLimit".to_string(), json!(fetch));
                (tools::FIND_FILES_BY_NAME_KEYWORD, args)
            }
            (SearchTarget::Text, query_type) => {
                let (tool, key) = if query_type == QueryType::Regex {
                    (tools::SEARCH_IN_FILES_BY_REGEX, "regexPattern")
                } else {
                    (tools::SEARCH_IN_FILES_BY_TEXT, "searchText")
                };
                let mut args = Map::new();
                args.insert(key.to_string(), json!(plan.query));
                if let Some(dir) = directory {
                    args.insert("directoryToSearch".to_string(), json!(dir));
                }
                args.insert("caseSensitive".to_string(), json!(plan.case_sensitive));
                args.insert("maxUsageCount".to_string(), json!(fetch));
                (tool, args)
            }
        };
        if plan.target == SearchTarget::Text {
            if let Some(mask) = &plan.file_mask {
                args.insert("fileMask".to_string(), json!(mask));
            }
        }

        let reply = upstream.call(tool, Value::Object(args)).await?;
        let (items, more) = parse_reply(&reply);
        log::debug!(
            "legacy {tool} returned {} item(s), fetch limit {fetch}",
            items.len()
        );
        Ok(normalize(items, &plan.scope, plan.limit, more))
    }
}

pub struct SearchDispatcher {
    config: SearchConfig,
}

impl SearchDispatcher {
    pub const fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Resolve target, query type and backend for one request.
    pub fn plan(
        &self,
        request: SearchRequest,
        caps: &SearchCapabilities,
    ) -> Result<(SearchPlan, Box<dyn SearchBackend>)> {
        if request.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        // Content patterns keep their surrounding whitespace.
        let query = match request.target {
            Some(SearchTarget::Text) => request.query,
            _ => request.query.trim().to_string(),
        };
        let limit = request.limit.unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Err(SearchError::InvalidArgument(
                "limit must be a positive integer".to_string(),
            ));
        }

        let target = match request.target {
            Some(target) => target,
            None => QueryClassifier::infer_target(&query, caps)?,
        };
        let query_type = QueryClassifier::resolve_query_type(target, request.query_type, &query)?;

        let primitive = match (target, query_type) {
            (SearchTarget::Symbol, QueryType::Regex) => Primitive::Missing,
            (SearchTarget::Symbol, _) => caps.symbol,
            (SearchTarget::File, QueryType::Glob) => caps.file_glob,
            (SearchTarget::File, _) => caps.file_name,
            (SearchTarget::Text, QueryType::Regex) => caps.regex,
            // Native text search has no case flag; go through regex instead.
            (SearchTarget::Text, _) if !request.case_sensitive && caps.text == Primitive::Native => {
                caps.regex
            }
            (SearchTarget::Text, _) => caps.text,
        };

        let backend: Box<dyn SearchBackend> = match primitive {
            Primitive::Native => Box::new(NativeSearch),
            Primitive::Legacy => Box::new(LegacySearch::new(self.config)),
            Primitive::Missing => {
                return Err(SearchError::Unsupported(format!(
                    "{} search with query_type '{}' is not supported by the upstream server",
                    target.as_str(),
                    query_type.as_str()
                )))
            }
        };

        let plan = SearchPlan {
            query,
            target,
            query_type,
            scope: request.scope,
            limit,
            case_sensitive: request.case_sensitive,
            file_mask: request.file_mask,
            directory: request.directory,
        };
        Ok((plan, backend))
    }

    pub async fn dispatch(
        &self,
        upstream: &dyn UpstreamCaller,
        caps: &SearchCapabilities,
        request: SearchRequest,
    ) -> Result<SearchOutcome> {
        let (plan, backend) = self.plan(request, caps)?;
        log::debug!(
            "search {} target={} type={} limit={}",
            backend.name(),
            plan.target.as_str(),
            plan.query_type.as_str(),
            plan.limit
        );
        backend.run(upstream, &plan).await
    }
}
