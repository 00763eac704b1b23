//! Read/patch helpers for `PROJECT_ROADMAP.md`.

use crate::{document, paths, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static PLAIN_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^# ([A-Za-z0-9_\- ]+)$").expect("valid title regex"));
static ACTIVE_PHASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"🔵 Phase (\d+[.\d]*):").expect("valid phase regex"));
static IN_PROGRESS_PHASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^.*Phase (\d+[.\d]*):.*\(In Progress\).*$").expect("valid phase regex")
});
static RECENT_SESSIONS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^##\s*(?:💡\s*)?Recent Sessions[^\n]*$").expect("valid heading regex")
});

pub const RECENT_SESSIONS_HEADING: &str = "## 💡 Recent Sessions";
const NOTE_MARKER: &str = "**Note:**";

/// Project title from a roadmap.
///
/// Only considered when the roadmap carries a plain `# Title` line; the name is
/// then the first `# ` heading mentioning "Project" that is not the
/// "Quick Start" banner.
#[must_use]
pub fn detect_project_name(content: &str) -> Option<String> {
    if !PLAIN_TITLE_RE.is_match(content) {
        return None;
    }
    content
        .lines()
        .filter_map(|line| line.strip_prefix("# "))
        .find(|title| title.contains("Project") && !title.contains("Quick Start"))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// `Phase N` label of the active (blue-marked) phase.
///
/// The marker after "Phase Progress:" wins; otherwise the first marker in
/// the document, then a phase line flagged "(In Progress)".
#[must_use]
pub fn detect_current_phase(content: &str) -> Option<String> {
    if let Some(pos) = content.find("Phase Progress:") {
        if let Some(caps) = ACTIVE_PHASE_RE.captures(&content[pos..]) {
            return Some(format!("Phase {}", &caps[1]));
        }
    }
    if let Some(caps) = ACTIVE_PHASE_RE.captures(content) {
        return Some(format!("Phase {}", &caps[1]));
    }
    IN_PROGRESS_PHASE_RE
        .captures(content)
        .map(|caps| format!("Phase {}", &caps[1]))
}

/// Returns the roadmap with `block` placed under the "Recent Sessions"
/// heading, or inside a new such section ahead of the trailing `**Note:**`.
/// `None` when neither anchor exists.
#[must_use]
pub fn insert_recent_session(content: &str, block: &str) -> Option<String> {
    let (head, tail, new_section) = if let Some(heading) = RECENT_SESSIONS_RE.find(content) {
        (&content[..heading.end()], &content[heading.end()..], false)
    } else {
        let note = content.rfind(NOTE_MARKER)?;
        (content[..note].trim_end_matches('\n'), &content[note..], true)
    };

    let mut out = String::with_capacity(content.len() + block.len() + 64);
    out.push_str(head);
    if new_section {
        out.push_str("\n\n");
        out.push_str(RECENT_SESSIONS_HEADING);
    }
    out.push_str("\n\n");
    out.push_str(block.trim_end());
    out.push_str("\n\n");
    out.push_str(tail.trim_start_matches('\n'));
    Some(out)
}

/// Applies [`insert_recent_session`] to the project's roadmap on disk.
/// Returns whether the file was rewritten.
pub fn update_recent_sessions(root: &Path, block: &str) -> Result<bool> {
    let path = paths::roadmap_file(root);
    if !path.exists() {
        return Ok(false);
    }
    let content = std::fs::read_to_string(&path)?;
    match insert_recent_session(&content, block) {
        Some(updated) => {
            document::write_atomic(&path, updated.as_bytes())?;
            Ok(true)
        }
        None => {
            log::debug!("roadmap has no Recent Sessions or Note anchor; left untouched");
            Ok(false)
        }
    }
}

/// Project name for `root`, read from its roadmap when present.
#[must_use]
pub fn project_name_for(root: &Path) -> Option<String> {
    std::fs::read_to_string(paths::roadmap_file(root))
        .ok()
        .and_then(|content| detect_project_name(&content))
}
