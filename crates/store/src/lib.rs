//! On-disk state for roadmapper: project layout, layered config, the
//! append-only session history, per-project context, and the global project
//! registry.
//!
//! Every document is a small plain-text file that is read whole and rewritten
//! whole. Malformed documents read as empty instead of failing, so one
//! corrupt file never blocks unrelated commands.

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod git;
pub mod history;
pub mod paths;
pub mod registry;
pub mod roadmap;

pub use config::{ConfigScope, ConfigStore};
pub use context::{ContextStore, SessionSummaryInput};
pub use document::{write_atomic, JsonStore};
pub use error::{Result, StoreError};
pub use history::{log_session, HistoryLog, HistoryStats};
pub use paths::resolve_project_root;
pub use registry::{
    default_search_paths, discover_projects, health_at, last_session_info, project_health,
    ProjectRegistry,
};
