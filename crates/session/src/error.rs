use roadmapper_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No session file found in {}", .0.display())]
    NoSessionFile(PathBuf),

    #[error("Session file not found: {}", .0.display())]
    SessionFileMissing(PathBuf),

    #[error("Invalid session name '{0}'")]
    InvalidSessionName(String),
}
