use thiserror::Error;

pub type Result<T> = std::result::Result<T, PatchError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Invalid patch: missing '{0}' marker")]
    MissingMarker(&'static str),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Invalid Add File line {line}: every content line must start with '+'")]
    AddFileFormat { line: usize },

    #[error("Empty hunk at line {line}: a hunk needs at least one ' ', '+' or '-' line")]
    EmptyHunk { line: usize },

    #[error("Update File '{path}' requires at least one hunk")]
    UpdateFileRequiresHunk { path: String },

    #[error("Unexpected patch line {line}: '{text}'")]
    UnexpectedPatchLine { line: usize, text: String },

    #[error("Patch contains no operations")]
    NoOperations,

    #[error("Hunk context not found (hunk {hunk}): {context}")]
    HunkContextNotFound { hunk: usize, context: String },

    #[error("old_string and new_string must differ")]
    IdenticalStrings,

    #[error("old_string must not be empty")]
    EmptyOldString,

    #[error("old_string not found")]
    OldStringNotFound,

    #[error("old_string is not unique ({count} matches); add surrounding context or set replace_all")]
    OldStringNotUnique { count: usize },
}

impl PatchError {
    /// Malformed patch syntax, as opposed to content that does not match the file.
    pub const fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::MissingMarker(_)
                | Self::InvalidPath { .. }
                | Self::AddFileFormat { .. }
                | Self::EmptyHunk { .. }
                | Self::UpdateFileRequiresHunk { .. }
                | Self::UnexpectedPatchLine { .. }
                | Self::NoOperations
        )
    }

    /// Old content could not be located in the current file.
    pub const fn is_context_miss(&self) -> bool {
        matches!(
            self,
            Self::HunkContextNotFound { .. } | Self::OldStringNotFound
        )
    }
}
