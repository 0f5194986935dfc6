use super::paths::PathResolver;
use super::reader::Reader;
use crate::runtime_env::RelayConfig;
use crate::upstream::Upstream;
use relay_search::SearchDispatcher;

/// Everything a tool invocation needs, borrowed from the service for one call.
#[derive(Clone, Copy)]
pub(super) struct ToolContext<'a> {
    pub(super) upstream: &'a dyn Upstream,
    pub(super) paths: &'a PathResolver,
    pub(super) config: &'a RelayConfig,
}

impl<'a> ToolContext<'a> {
    pub(super) fn reader(&self) -> Reader<'a> {
        Reader::new(self.upstream, &self.config.read)
    }

    pub(super) fn dispatcher(&self) -> SearchDispatcher {
        SearchDispatcher::new(self.config.search)
    }
}

#[cfg(test)]
pub(super) struct Fixture {
    pub(super) upstream: crate::test_support::ScriptedUpstream,
    pub(super) paths: PathResolver,
    pub(super) config: RelayConfig,
}

#[cfg(test)]
impl Fixture {
    pub(super) fn new(upstream: crate::test_support::ScriptedUpstream) -> Self {
        Self::rooted(upstream, std::path::Path::new("/work/project"))
    }

    pub(super) fn rooted(
        upstream: crate::test_support::ScriptedUpstream,
        root: &std::path::Path,
    ) -> Self {
        Self {
            upstream,
            paths: PathResolver::new(root),
            config: crate::test_support::test_config(root),
        }
    }

    pub(super) fn ctx(&self) -> ToolContext<'_> {
        ToolContext {
            upstream: &self.upstream,
            paths: &self.paths,
            config: &self.config,
        }
    }
}
