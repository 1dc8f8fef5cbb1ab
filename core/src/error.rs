use thiserror::Error;

use crate::DocId;

/// Errors returned by [`crate::SearchServer`] and its collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("document {0} already exists")]
    DuplicateId(DocId),

    #[error("document id {0} is negative")]
    InvalidId(DocId),

    /// Control characters in a document or stop word, or a malformed query word.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("document {0} not found")]
    NotFound(DocId),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn invalid_content<S: Into<String>>(msg: S) -> Self {
        SearchError::InvalidContent(msg.into())
    }
}
