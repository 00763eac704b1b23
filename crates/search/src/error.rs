use roadmapper_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Empty query")]
    EmptyQuery,

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
