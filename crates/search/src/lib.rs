//! Cross-project search and the global knowledge base.

mod error;
pub mod knowledge;
pub mod search;

pub use error::{Result, SearchError};
pub use knowledge::{entry_identity, extract_from_session, KnowledgeBase};
pub use search::{
    search_projects, targets_from_paths, targets_from_registry, LineMatch, ResultCap,
    SearchFileType, SearchOptions, SearchResult, SearchTarget,
};
