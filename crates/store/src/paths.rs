use crate::{Result, StoreError};
use std::path::{Path, PathBuf};

pub const ROADMAP_FILE_NAME: &str = "PROJECT_ROADMAP.md";
pub const PROJECT_CONFIG_FILE_NAME: &str = ".roadmapper.toml";
pub const STATE_DIR_NAME: &str = ".roadmapper";
pub const HISTORY_FILE_NAME: &str = "history.jsonl";
pub const CONTEXT_FILE_NAME: &str = "context.json";
pub const GLOBAL_CONFIG_FILE_NAME: &str = "config.toml";
pub const REGISTRY_FILE_NAME: &str = "projects.json";
pub const KNOWLEDGE_FILE_NAME: &str = "knowledge.json";
pub const SESSION_TEMPLATE_FILE_NAME: &str = "SESSION_WORKING_TEMPLATE.md";
pub const SESSION_FILE_PREFIX: &str = "SESSION_";
pub const SESSION_FILE_EXTENSION: &str = ".md";

/// Overrides `~/.roadmapper` as the global directory.
pub const HOME_ENV: &str = "ROADMAPPER_HOME";

/// Upward search bound for [`resolve_project_root`].
pub const MAX_ROOT_SEARCH_LEVELS: usize = 10;

/// Walks upward from `start` (or the current directory) looking for a project
/// config or roadmap marker. Gives up at the filesystem root or after
/// [`MAX_ROOT_SEARCH_LEVELS`] directories.
#[must_use]
pub fn resolve_project_root(start: Option<&Path>) -> Option<PathBuf> {
    let start = match start {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let mut current = start.canonicalize().unwrap_or(start);

    for _ in 0..MAX_ROOT_SEARCH_LEVELS {
        if is_project_root(&current) {
            return Some(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    None
}

#[must_use]
pub fn is_project_root(dir: &Path) -> bool {
    dir.join(PROJECT_CONFIG_FILE_NAME).exists() || dir.join(ROADMAP_FILE_NAME).exists()
}

/// Per-user directory (`$ROADMAPPER_HOME` or `~/.roadmapper`), created on first access.
pub fn global_config_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or(StoreError::HomeDirUnavailable)?
            .join(STATE_DIR_NAME),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn global_config_file() -> Result<PathBuf> {
    Ok(global_config_dir()?.join(GLOBAL_CONFIG_FILE_NAME))
}

pub fn registry_file() -> Result<PathBuf> {
    Ok(global_config_dir()?.join(REGISTRY_FILE_NAME))
}

pub fn knowledge_file() -> Result<PathBuf> {
    Ok(global_config_dir()?.join(KNOWLEDGE_FILE_NAME))
}

#[must_use]
pub fn project_config_file(root: &Path) -> PathBuf {
    root.join(PROJECT_CONFIG_FILE_NAME)
}

#[must_use]
pub fn roadmap_file(root: &Path) -> PathBuf {
    root.join(ROADMAP_FILE_NAME)
}

#[must_use]
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR_NAME)
}

#[must_use]
pub fn history_file(root: &Path) -> PathBuf {
    state_dir(root).join(HISTORY_FILE_NAME)
}

#[must_use]
pub fn context_file(root: &Path) -> PathBuf {
    state_dir(root).join(CONTEXT_FILE_NAME)
}

#[must_use]
pub fn archive_dir(root: &Path) -> PathBuf {
    root.join("docs").join("archive").join("sessions")
}

#[must_use]
pub fn reference_dir(root: &Path) -> PathBuf {
    root.join("docs").join("reference")
}

#[must_use]
pub fn session_template_file(root: &Path) -> PathBuf {
    reference_dir(root).join(SESSION_TEMPLATE_FILE_NAME)
}

#[must_use]
pub fn is_session_file_name(name: &str) -> bool {
    name.starts_with(SESSION_FILE_PREFIX) && name.ends_with(SESSION_FILE_EXTENSION)
}

/// `SESSION_*.md` files directly inside `dir`, sorted by name. A missing or
/// unreadable directory yields nothing.
#[must_use]
pub fn list_session_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_session_file_name)
        })
        .collect();
    files.sort();
    files
}

/// Active sessions in `root` followed by archived ones.
#[must_use]
pub fn all_session_files(root: &Path) -> Vec<PathBuf> {
    let mut files = list_session_files(root);
    files.extend(list_session_files(&archive_dir(root)));
    files
}
