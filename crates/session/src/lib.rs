//! Session lifecycle: creating dated session files, scraping them for a
//! summary, and closing them into the project's context, roadmap and archive.

pub mod close;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod init;
pub mod manager;
pub mod template;

pub use close::{close_session, CloseActions, CloseOptions, CloseOutcome};
pub use error::{Result, SessionError};
pub use extract::{extract_summary, roadmap_summary_block};
pub use init::{init_project, InitOptions, InitReport};
pub use manager::{
    create_session, current_session, latest_session_file, sessions_by_recency, summarize_session,
    CreateOptions,
};
pub use template::TemplateVariant;
