use crate::upstream::tools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a query primitive is served by the current upstream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// Combined search tool that accepts a `paths` scope list directly.
    Native,
    /// Emulated through the older finder/content-search tools plus local filtering.
    Legacy,
    #[default]
    Missing,
}

impl Primitive {
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::Missing)
    }

    fn pick(native: bool, legacy: bool) -> Self {
        if native {
            Self::Native
        } else if legacy {
            Self::Legacy
        } else {
            Self::Missing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct SearchCapabilities {
    pub text: Primitive,
    pub regex: Primitive,
    pub file_glob: Primitive,
    pub file_name: Primitive,
    pub symbol: Primitive,
}

impl SearchCapabilities {
    /// Derive the capability record from the upstream `tools/list` names.
    pub fn from_tool_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: HashSet<&str> = names.into_iter().collect();
        let has = |name: &str| names.contains(name);
        Self {
            text: Primitive::pick(has(tools::SEARCH_TEXT), has(tools::SEARCH_IN_FILES_BY_TEXT)),
            regex: Primitive::pick(
                has(tools::SEARCH_REGEX),
                has(tools::SEARCH_IN_FILES_BY_REGEX),
            ),
            file_glob: Primitive::pick(has(tools::SEARCH_FILE), has(tools::FIND_FILES_BY_GLOB)),
            file_name: Primitive::pick(
                has(tools::SEARCH_FILE),
                has(tools::FIND_FILES_BY_NAME_KEYWORD),
            ),
            // Symbols have no legacy emulation.
            symbol: Primitive::pick(has(tools::SEARCH_SYMBOL), false),
        }
    }

    pub const fn has_file_search(&self) -> bool {
        self.file_glob.is_available() || self.file_name.is_available()
    }
}
