//! Search dispatch for relay.
//!
//! A request is classified into a target (symbol, file, text) and a query type (text, regex,
//! glob), then served by one [`SearchBackend`]: [`NativeSearch`] when the upstream exposes
//! the combined `search_*` tools, [`LegacySearch`] otherwise.

mod dispatcher;
mod error;
mod query_classifier;
mod reconstruct;
mod results;

#[cfg(test)]
mod test_support;

pub use dispatcher::{
    LegacySearch, NativeSearch, SearchBackend, SearchConfig, SearchDispatcher, SearchPlan,
    SearchRequest,
};
pub use error::{Result, SearchError};
pub use query_classifier::{classify_pattern, PatternDialect, QueryClassifier, QueryType, SearchTarget};
pub use reconstruct::{reconstruct_lines, LineMap};
pub use results::{normalize, normalize_result_path, parse_reply, SearchItem, SearchOutcome};
