use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),

    #[error("Not in a roadmapper project. Run 'roadmapper init' first.")]
    NotInProject,

    #[error("Home directory is unavailable")]
    HomeDirUnavailable,

    #[error("Invalid config scope '{0}' (expected 'global' or 'project')")]
    InvalidScope(String),

    #[error("Invalid config key '{0}'")]
    InvalidKey(String),

    #[error("Path has no parent directory: {}", .0.display())]
    NoParent(PathBuf),
}
