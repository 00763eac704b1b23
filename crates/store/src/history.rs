//! Append-only per-project session log (`.roadmapper/history.jsonl`).

use crate::{git, paths, Result};
use chrono::{DateTime, Duration, Utc};
use roadmapper_protocol::HistoryRecord;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub sessions_last_7_days: usize,
    pub sessions_last_30_days: usize,
    pub avg_sessions_per_week: f64,
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn for_project(root: &Path) -> Self {
        Self::new(paths::history_file(root))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one JSON line.
    ///
    /// A log left ending mid-line by an interrupted write is terminated first,
    /// so the fragment stays on its own line and is the only record skipped.
    pub fn append_record(&self, record: &HistoryRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let mut line = String::new();
        if !ends_with_newline(&mut file)? {
            log::debug!("history: terminating partial line in {}", self.path.display());
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(record)?);
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Records most-recent-first.
    ///
    /// Malformed lines are skipped one at a time. With `since` set, records
    /// whose date cannot be parsed are dropped as well.
    #[must_use]
    pub fn read(&self, limit: Option<usize>, since: Option<DateTime<Utc>>) -> Vec<HistoryRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to read history {}: {err}", self.path.display());
                }
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: HistoryRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(err) => {
                    log::debug!("history: skipping line {}: {err}", idx + 1);
                    continue;
                }
            };
            if let Some(since) = since {
                match record.timestamp() {
                    Some(at) if at >= since => {}
                    _ => continue,
                }
            }
            records.push(record);
        }

        records.reverse();
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        records
    }

    #[must_use]
    pub fn stats(&self, since: Option<DateTime<Utc>>) -> HistoryStats {
        self.stats_at(since, Utc::now())
    }

    /// [`stats`](Self::stats) evaluated against a fixed clock.
    #[must_use]
    pub fn stats_at(&self, since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> HistoryStats {
        let records = self.read(None, since);
        if records.is_empty() {
            return HistoryStats::default();
        }

        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);
        let stamps: Vec<DateTime<Utc>> =
            records.iter().filter_map(HistoryRecord::timestamp).collect();

        let total = records.len();
        let days_span = stamps
            .iter()
            .min()
            .map_or(0, |oldest| (now - *oldest).num_days())
            .max(1);
        let avg = total as f64 / days_span as f64 * 7.0;

        HistoryStats {
            total_sessions: total,
            sessions_last_7_days: stamps.iter().filter(|at| **at >= week_ago).count(),
            sessions_last_30_days: stamps.iter().filter(|at| **at >= month_ago).count(),
            avg_sessions_per_week: (avg * 10.0).round() / 10.0,
        }
    }
}

/// Records creation of `session_file`. Never fails: history is diagnostic, so
/// an unresolvable project or a write error is logged and dropped.
pub fn log_session(session_file: &Path, project_root: Option<&Path>) {
    let root = match project_root {
        Some(root) => root.to_path_buf(),
        None => match paths::resolve_project_root(None) {
            Some(root) => root,
            None => {
                log::debug!("history: not in a project, skipping");
                return;
            }
        },
    };
    log_session_at(session_file, &root, Utc::now());
}

pub(crate) fn log_session_at(session_file: &Path, root: &Path, at: DateTime<Utc>) {
    let name = session_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| session_file.to_string_lossy().into_owned());
    let record = HistoryRecord::session(name, git::current_branch(root), at);
    if let Err(err) = HistoryLog::for_project(root).append_record(&record) {
        log::warn!("Failed to append history for {}: {err}", root.display());
    }
}

/// Empty files count as terminated.
fn ends_with_newline(file: &mut std::fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
