use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod capabilities;
pub mod scope;
pub mod upstream;

pub use capabilities::{Primitive, SearchCapabilities};
pub use scope::SearchScope;
pub use upstream::{TruncateMode, UpstreamCaller, UpstreamReply};

pub const CAPABILITIES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

/// Failure of a single tool invocation.
///
/// Every variant is surfaced verbatim to the calling agent; only the reader's
/// documented recovery path ever looks at a variant before propagating it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    ContextNotFound(String),

    #[error("{0}")]
    TruncatedContent(String),

    #[error("{0}")]
    UnsupportedOperation(String),

    #[error("{0}")]
    Transport(String),
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    pub fn truncated(message: impl Into<String>) -> Self {
        Self::TruncatedContent(message.into())
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid_argument",
            Self::Parse(_) => "parse_error",
            Self::ContextNotFound(_) => "context_not_found",
            Self::TruncatedContent(_) => "truncated_content",
            Self::UnsupportedOperation(_) => "unsupported_operation",
            Self::Transport(_) => "transport",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ContextNotFound(_) => {
                Some("Re-read the file and rebuild the patch/edit against its current content.")
            }
            Self::TruncatedContent(_) => Some("Request a smaller range with offset/limit."),
            Self::UnsupportedOperation(_) => {
                Some("Call `capabilities` to see which search primitives the upstream offers.")
            }
            _ => None,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code().to_string(),
            message: self.to_string(),
            details: None,
            hint: self.hint().map(str::to_string),
        }
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
