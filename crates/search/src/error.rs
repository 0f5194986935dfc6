use relay_protocol::ToolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    Upstream(#[from] ToolError),
}

impl From<SearchError> for ToolError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => Self::validation("query must not be empty"),
            SearchError::InvalidArgument(message) => Self::Validation(message),
            SearchError::Unsupported(message) => Self::UnsupportedOperation(message),
            SearchError::Upstream(err) => err,
        }
    }
}
