//! Literal text search across the session files, roadmaps and history logs of
//! one or more projects.
//!
//! Per project the scan order is fixed: session files (active, then archived),
//! the roadmap, then history. With [`ResultCap::Global`] the cap is applied
//! after every project has been scanned, so later projects can be starved.

use crate::{Result, SearchError};
use regex::{Regex, RegexBuilder};
use roadmapper_protocol::RegistryEntry;
use roadmapper_store::{paths, HistoryLog};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_CONTEXT_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFileType {
    Session,
    Roadmap,
    History,
}

impl SearchFileType {
    pub const ALL: [SearchFileType; 3] = [
        SearchFileType::Session,
        SearchFileType::Roadmap,
        SearchFileType::History,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchFileType::Session => "session",
            SearchFileType::Roadmap => "roadmap",
            SearchFileType::History => "history",
        }
    }
}

impl fmt::Display for SearchFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchFileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" | "sessions" => Ok(SearchFileType::Session),
            "roadmap" => Ok(SearchFileType::Roadmap),
            "history" => Ok(SearchFileType::History),
            other => Err(format!(
                "unknown file type '{other}' (expected session, roadmap or history)"
            )),
        }
    }
}

/// How `max_results` is applied across projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultCap {
    /// Truncate the flat, project-ordered result list.
    #[default]
    Global,
    /// Take one result per project in turn until the cap is reached.
    RoundRobin,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub file_types: Vec<SearchFileType>,
    pub case_sensitive: bool,
    pub max_results: usize,
    pub cap: ResultCap,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            file_types: SearchFileType::ALL.to_vec(),
            case_sensitive: false,
            max_results: DEFAULT_MAX_RESULTS,
            cap: ResultCap::Global,
        }
    }
}

/// A project to search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub name: String,
    pub path: PathBuf,
}

impl SearchTarget {
    /// Target named after the last component of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

#[must_use]
pub fn targets_from_registry(entries: &[RegistryEntry]) -> Vec<SearchTarget> {
    entries
        .iter()
        .map(|entry| SearchTarget {
            name: entry.name.clone(),
            path: PathBuf::from(&entry.path),
        })
        .collect()
}

#[must_use]
pub fn targets_from_paths(project_paths: &[PathBuf]) -> Vec<SearchTarget> {
    project_paths.iter().cloned().map(SearchTarget::from_path).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-based.
    pub line: usize,
    pub text: String,
}

/// Every matching line of one searched file.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub project: String,
    pub project_path: PathBuf,
    pub file: PathBuf,
    pub file_type: SearchFileType,
    pub matches: Vec<LineMatch>,
    #[serde(skip)]
    lines: Vec<String>,
}

impl SearchResult {
    /// Numbered lines within `radius` of each match, in file order, each line
    /// at most once.
    #[must_use]
    pub fn context(&self, radius: usize) -> Vec<String> {
        let mut wanted = BTreeSet::new();
        for m in &self.matches {
            let index = m.line.saturating_sub(1);
            let start = index.saturating_sub(radius);
            let end = (index + radius + 1).min(self.lines.len());
            wanted.extend(start..end);
        }
        wanted
            .into_iter()
            .map(|i| format!("{:4}| {}", i + 1, self.lines[i]))
            .collect()
    }
}

/// Case-(in)sensitive literal search for `query` over `targets`.
pub fn search_projects(
    query: &str,
    targets: &[SearchTarget],
    options: &SearchOptions,
) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let pattern = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(!options.case_sensitive)
        .build()?;

    let per_project: Vec<Vec<SearchResult>> = targets
        .iter()
        .map(|target| search_project(&pattern, target, &options.file_types))
        .collect();
    let total: usize = per_project.iter().map(Vec::len).sum();

    let results: Vec<SearchResult> = match options.cap {
        ResultCap::Global => per_project
            .into_iter()
            .flatten()
            .take(options.max_results)
            .collect(),
        ResultCap::RoundRobin => round_robin(per_project, options.max_results),
    };
    log::debug!(
        "search '{query}' matched {total} file(s) across {} project(s), returning {}",
        targets.len(),
        results.len()
    );
    Ok(results)
}

fn round_robin(per_project: Vec<Vec<SearchResult>>, max: usize) -> Vec<SearchResult> {
    let mut queues: Vec<std::vec::IntoIter<SearchResult>> =
        per_project.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::new();
    while out.len() < max {
        let mut progressed = false;
        for queue in &mut queues {
            if out.len() == max {
                break;
            }
            if let Some(result) = queue.next() {
                out.push(result);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    out
}

fn search_project(
    pattern: &Regex,
    target: &SearchTarget,
    file_types: &[SearchFileType],
) -> Vec<SearchResult> {
    let root = target.path.as_path();
    let mut results = Vec::new();
    for file_type in SearchFileType::ALL {
        if !file_types.contains(&file_type) {
            continue;
        }
        match file_type {
            SearchFileType::Session => {
                for file in paths::all_session_files(root) {
                    if let Some(text) = read_text(&file) {
                        results.extend(scan(pattern, target, file, file_type, &text));
                    }
                }
            }
            SearchFileType::Roadmap => {
                let file = paths::roadmap_file(root);
                if let Some(text) = read_text(&file) {
                    results.extend(scan(pattern, target, file, file_type, &text));
                }
            }
            SearchFileType::History => {
                let log = HistoryLog::for_project(root);
                let text = history_text(&log);
                if !text.is_empty() {
                    let path = log.path().to_path_buf();
                    results.extend(scan(pattern, target, path, file_type, &text));
                }
            }
        }
    }
    results
}

/// History records as pretty JSON, one block per record, newest first.
fn history_text(log: &HistoryLog) -> String {
    log.read(None, None)
        .iter()
        .filter_map(|record| serde_json::to_string_pretty(record).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_text(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            log::debug!("skipping {}: {err}", path.display());
            None
        }
    }
}

fn scan(
    pattern: &Regex,
    target: &SearchTarget,
    file: PathBuf,
    file_type: SearchFileType,
    text: &str,
) -> Option<SearchResult> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let matches: Vec<LineMatch> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(i, line)| LineMatch {
            line: i + 1,
            text: line.clone(),
        })
        .collect();
    if matches.is_empty() {
        return None;
    }
    Some(SearchResult {
        project: target.name.clone(),
        project_path: target.path.clone(),
        file,
        file_type,
        matches,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roadmapper_protocol::{HistoryEventKind, HistoryRecord};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn record(file: &str) -> HistoryRecord {
        HistoryRecord {
            kind: HistoryEventKind::Session,
            date: "2025-11-04T10:00:00Z".to_string(),
            file: file.to_string(),
            branch: Some("main".to_string()),
        }
    }

    fn project(parent: &TempDir, name: &str, session: &str) -> SearchTarget {
        let root = parent.path().join(name);
        fs::create_dir_all(&root).unwrap();
        fs::write(paths::roadmap_file(&root), format!("# {name} Project\n")).unwrap();
        fs::write(root.join("SESSION_2025_11_04_A.md"), session).unwrap();
        SearchTarget::from_path(root)
    }

    #[test]
    fn only_files_with_matches_are_reported() {
        let temp = tempdir().unwrap();
        let targets = vec![
            project(&temp, "alpha", "# Session\nfoo first\nbar\nthen FOO again\n"),
            project(&temp, "beta", "# Session\nnothing to see\n"),
        ];

        let results = search_projects("foo", &targets, &SearchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert_eq!(hit.project, "alpha");
        assert_eq!(hit.file_type, SearchFileType::Session);
        assert_eq!(
            hit.matches,
            vec![
                LineMatch { line: 2, text: "foo first".to_string() },
                LineMatch { line: 4, text: "then FOO again".to_string() },
            ]
        );
    }

    #[test]
    fn case_sensitive_and_literal() {
        let temp = tempdir().unwrap();
        let targets = vec![project(&temp, "alpha", "a.b\naxb\nA.B\n")];
        let options = SearchOptions {
            case_sensitive: true,
            ..SearchOptions::default()
        };
        let results = search_projects("a.b", &targets, &options).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches.len(), 1);
        assert_eq!(results[0].matches[0].line, 1);
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(matches!(
            search_projects("  ", &[], &SearchOptions::default()),
            Err(SearchError::EmptyQuery)
        ));
    }

    #[test]
    fn scans_archive_roadmap_and_history_in_order() {
        let temp = tempdir().unwrap();
        let target = project(&temp, "alpha", "widget in progress\n");
        let archive = paths::archive_dir(&target.path);
        fs::create_dir_all(&archive).unwrap();
        fs::write(archive.join("SESSION_2025_11_01_A.md"), "old widget notes\n").unwrap();
        fs::write(paths::roadmap_file(&target.path), "# Widget Project\n").unwrap();
        HistoryLog::for_project(&target.path)
            .append_record(&record("SESSION_widget.md"))
            .unwrap();

        let results =
            search_projects("widget", &[target.clone()], &SearchOptions::default()).unwrap();
        let kinds: Vec<(SearchFileType, PathBuf)> =
            results.iter().map(|r| (r.file_type, r.file.clone())).collect();
        assert_eq!(
            kinds,
            vec![
                (SearchFileType::Session, target.path.join("SESSION_2025_11_04_A.md")),
                (SearchFileType::Session, archive.join("SESSION_2025_11_01_A.md")),
                (SearchFileType::Roadmap, paths::roadmap_file(&target.path)),
                (SearchFileType::History, paths::history_file(&target.path)),
            ]
        );
        assert_eq!(results[3].matches[0].text, "  \"file\": \"SESSION_widget.md\",");

        let roadmap_only = SearchOptions {
            file_types: vec![SearchFileType::Roadmap],
            ..SearchOptions::default()
        };
        let results = search_projects("widget", &[target], &roadmap_only).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_type, SearchFileType::Roadmap);
    }

    #[test]
    fn global_cap_starves_later_projects_round_robin_does_not() {
        let temp = tempdir().unwrap();
        let first = project(&temp, "alpha", "hit\n");
        for letter in ["B", "C"] {
            fs::write(first.path.join(format!("SESSION_2025_11_04_{letter}.md")), "hit\n").unwrap();
        }
        let targets = vec![first, project(&temp, "beta", "hit\n")];

        let global = SearchOptions {
            file_types: vec![SearchFileType::Session],
            max_results: 2,
            ..SearchOptions::default()
        };
        let results = search_projects("hit", &targets, &global).unwrap();
        let projects: Vec<&str> = results.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(projects, vec!["alpha", "alpha"]);

        let fair = SearchOptions {
            cap: ResultCap::RoundRobin,
            ..global
        };
        let results = search_projects("hit", &targets, &fair).unwrap();
        let projects: Vec<&str> = results.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(projects, vec!["alpha", "beta"]);
    }

    #[test]
    fn context_merges_overlapping_windows() {
        let temp = tempdir().unwrap();
        let body = "one\ntwo\nneedle\nfour\nneedle\nsix\nseven\neight\n";
        let targets = vec![project(&temp, "alpha", body)];
        let options = SearchOptions {
            file_types: vec![SearchFileType::Session],
            ..SearchOptions::default()
        };
        let results = search_projects("needle", &targets, &options).unwrap();
        assert_eq!(
            results[0].context(1),
            vec!["   2| two", "   3| needle", "   4| four", "   5| needle", "   6| six"]
        );
    }

    #[test]
    fn file_type_parsing() {
        assert_eq!("Sessions".parse::<SearchFileType>(), Ok(SearchFileType::Session));
        assert!("notes".parse::<SearchFileType>().is_err());
    }
}
