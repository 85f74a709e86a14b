use thiserror::Error;

/// Errors raised while configuring the search engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Invalid search settings: {0}")]
    Settings(String),
}

pub type SearchResult<T> = Result<T, SearchError>;
