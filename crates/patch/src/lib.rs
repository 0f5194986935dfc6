//! Patch format support for relay.
//!
//! - [`parse_patch`] turns a `*** Begin Patch` / `*** End Patch` block into typed operations.
//! - [`seek_sequence`] locates a run of lines with progressively looser comparisons.
//! - [`apply_hunks`] splices update hunks into file content.
//! - [`edit_document`] performs the string-replacement edit used by the `edit` tool.

mod apply;
mod error;
mod matcher;
mod parser;
mod text_edit;

pub use apply::apply_hunks;
pub use error::{PatchError, Result};
pub use matcher::{normalize_for_match, seek_sequence};
pub use parser::parse_patch;
pub use text_edit::{detect_line_ending, edit_document, normalize_newlines, replace_text, EditOutcome};

/// One file-level operation of a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOperation {
    Add {
        path: String,
        content: String,
    },
    Delete {
        path: String,
    },
    Update {
        path: String,
        move_to: Option<String>,
        hunks: Vec<Hunk>,
    },
}

impl PatchOperation {
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Delete { path } | Self::Update { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Add(String),
    Remove(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hunk {
    pub header: Option<String>,
    pub lines: Vec<HunkLine>,
    pub is_end_of_file: bool,
}

impl Hunk {
    /// Lines the hunk expects to find in the file (context + removals).
    pub fn old_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(text) | HunkLine::Remove(text) => Some(text.as_str()),
                HunkLine::Add(_) => None,
            })
            .collect()
    }

    /// Lines that replace the matched region (context + additions).
    pub fn new_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(text) | HunkLine::Add(text) => Some(text.as_str()),
                HunkLine::Remove(_) => None,
            })
            .collect()
    }
}
