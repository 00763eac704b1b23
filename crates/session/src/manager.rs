//! Session file creation and lookup.
//!
//! Dated sessions are named `SESSION_<YYYY_MM_DD>_<SUFFIX>.md`. Suffixes run
//! `A..Z`, then `AA, AB, ..` like spreadsheet columns. The next suffix follows
//! the highest one present in the working directory or the project archive, so
//! a closed session's letter is never handed out again.

use crate::extract::extract_summary;
use crate::template::{self, render_session, SessionPlaceholders, TemplateVariant};
use crate::{Result, SessionError};
use chrono::{Local, NaiveDate};
use roadmapper_protocol::SessionSummary;
use roadmapper_store::{history, paths, roadmap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use paths::{SESSION_FILE_EXTENSION as SESSION_EXTENSION, SESSION_FILE_PREFIX as SESSION_PREFIX};

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Custom name: `SESSION_<name>.md`, overwritten if present.
    pub name: Option<String>,
    /// Day used for dated names; today (local time) when `None`.
    pub date: Option<NaiveDate>,
    /// Built-in template used when the project has no template file.
    pub variant: TemplateVariant,
}

/// Creates a session file in `dir` and records it in the project history.
pub fn create_session(dir: &Path, options: &CreateOptions) -> Result<PathBuf> {
    let date = options.date.unwrap_or_else(|| Local::now().date_naive());
    let project_root = paths::resolve_project_root(Some(dir));

    let (file_name, session_id) = match options.name.as_deref() {
        Some(name) => {
            let name = name.trim();
            if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
                return Err(SessionError::InvalidSessionName(name.to_string()));
            }
            (format!("{SESSION_PREFIX}{name}{SESSION_EXTENSION}"), name.to_string())
        }
        None => {
            let stamp = date.format("%Y_%m_%d").to_string();
            let mut scan_dirs = vec![dir.to_path_buf()];
            if let Some(root) = project_root.as_deref() {
                scan_dirs.push(paths::archive_dir(root));
            }
            let suffix = next_suffix(&existing_suffixes(&scan_dirs, &stamp));
            (
                format!("{SESSION_PREFIX}{stamp}_{suffix}{SESSION_EXTENSION}"),
                format!("{}-{suffix}", date.format("%Y-%m-%d")),
            )
        }
    };

    let template_root = project_root.as_deref().unwrap_or(dir);
    let template = match std::fs::read_to_string(paths::session_template_file(template_root)) {
        Ok(text) => text,
        Err(_) => template::session_template(options.variant).to_string(),
    };

    let roadmap_text = std::fs::read_to_string(paths::roadmap_file(template_root)).ok();
    let placeholders = SessionPlaceholders {
        session_id,
        date,
        project_name: roadmap_text
            .as_deref()
            .and_then(roadmap::detect_project_name)
            .or_else(|| {
                project_root
                    .as_deref()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
            }),
        phase: roadmap_text.as_deref().and_then(roadmap::detect_current_phase),
    };

    let path = dir.join(&file_name);
    std::fs::write(&path, render_session(&template, &placeholders))?;
    log::debug!("created session {}", path.display());

    if let Some(root) = project_root.as_deref() {
        history::log_session(&path, Some(root));
    }
    Ok(path)
}

/// Suffixes of `SESSION_<stamp>_<SUFFIX>.md` files in `dirs`.
fn existing_suffixes(dirs: &[PathBuf], stamp: &str) -> Vec<String> {
    let prefix = format!("{SESSION_PREFIX}{stamp}_");
    let mut found = Vec::new();
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(suffix) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(SESSION_EXTENSION))
            else {
                continue;
            };
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_uppercase()) {
                found.push(suffix.to_string());
            }
        }
    }
    found
}

/// Suffix after the highest of `existing`, ordered by (length, text).
#[must_use]
pub fn next_suffix(existing: &[String]) -> String {
    existing
        .iter()
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .map_or_else(|| "A".to_string(), |last| increment_suffix(last))
}

fn increment_suffix(suffix: &str) -> String {
    let mut bytes = suffix.as_bytes().to_vec();
    for byte in bytes.iter_mut().rev() {
        if *byte == b'Z' {
            *byte = b'A';
        } else {
            *byte += 1;
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    }
    let mut out = String::with_capacity(bytes.len() + 1);
    out.push('A');
    out.push_str(&String::from_utf8_lossy(&bytes));
    out
}

/// Session files in `dir`, most recently modified first.
#[must_use]
pub fn sessions_by_recency(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(SystemTime, PathBuf)> = paths::list_session_files(dir)
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    files.into_iter().map(|(_, path)| path).collect()
}

/// The session being worked on: the most recently modified session file.
#[must_use]
pub fn current_session(dir: &Path) -> Option<PathBuf> {
    sessions_by_recency(dir).into_iter().next()
}

/// Lexicographically last session file in `root`.
#[must_use]
pub fn latest_session_file(root: &Path) -> Option<PathBuf> {
    paths::list_session_files(root).pop()
}

/// `file`, or the latest session in `root`, checked to exist.
pub(crate) fn resolve_session_file(root: &Path, file: Option<&Path>) -> Result<PathBuf> {
    match file {
        Some(file) => {
            let file = if file.is_absolute() {
                file.to_path_buf()
            } else {
                root.join(file)
            };
            if file.is_file() {
                Ok(file)
            } else {
                Err(SessionError::SessionFileMissing(file))
            }
        }
        None => latest_session_file(root)
            .ok_or_else(|| SessionError::NoSessionFile(root.to_path_buf())),
    }
}

/// Session id: the file stem.
#[must_use]
pub fn session_id(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn summarize_session(root: &Path, file: Option<&Path>) -> Result<SessionSummary> {
    let file = resolve_session_file(root, file)?;
    let content = std::fs::read_to_string(&file)?;
    Ok(extract_summary(&content))
}
