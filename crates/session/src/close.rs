//! Closing a session: summarize, suggest what comes next, then apply the
//! context / roadmap / archive side effects.
//!
//! The three side effects are independent. A failure in one is logged and
//! recorded as "not done" in [`CloseActions`]; it never stops the others.

use crate::extract::{extract_summary, roadmap_summary_block, EMPTY_SUMMARY};
use crate::frontmatter::parse_front_matter;
use crate::manager::{resolve_session_file, session_id};
use crate::Result;
use roadmapper_protocol::SessionSummary;
use roadmapper_store::{paths, roadmap, ContextStore, SessionSummaryInput};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const UNKNOWN_PROJECT: &str = "Unknown Project";
pub const UNKNOWN_PHASE: &str = "Unknown Phase";

const CONTEXT_SUMMARY_MAX_CHARS: usize = 200;
const RESUMED_TASKS: usize = 3;
const HANDOFF_ACCOMPLISHMENTS: usize = 5;
const HANDOFF_DECISIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOptions {
    pub archive: bool,
    pub update_roadmap: bool,
    pub update_context: bool,
}

impl Default for CloseOptions {
    fn default() -> Self {
        Self {
            archive: true,
            update_roadmap: true,
            update_context: true,
        }
    }
}

/// Which side effects actually completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloseActions {
    pub archived: bool,
    pub roadmap_updated: bool,
    pub context_updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub session_id: String,
    pub project: String,
    pub phase: String,
    pub summary: SessionSummary,
    pub next_goals: Vec<String>,
    pub handoff_prompt: String,
    pub actions: CloseActions,
}

/// Closes `file` (default: the lexicographically last session in `root`).
pub fn close_session(
    root: &Path,
    file: Option<&Path>,
    options: CloseOptions,
) -> Result<CloseOutcome> {
    let file = resolve_session_file(root, file)?;
    let content = std::fs::read_to_string(&file)?;
    let summary = extract_summary(&content);
    let id = session_id(&file);

    let roadmap_text = std::fs::read_to_string(paths::roadmap_file(root)).ok();
    let meta = parse_front_matter(&content);
    let project = meta
        .get("project")
        .cloned()
        .or_else(|| roadmap_text.as_deref().and_then(roadmap::detect_project_name))
        .unwrap_or_else(|| UNKNOWN_PROJECT.to_string());
    let phase = meta
        .get("phase")
        .cloned()
        .or_else(|| roadmap_text.as_deref().and_then(roadmap::detect_current_phase))
        .unwrap_or_else(|| UNKNOWN_PHASE.to_string());

    let next_goals = suggest_next_goals(&summary, &phase, roadmap_text.is_some());
    let handoff_prompt = handoff_prompt(&id, &summary, &next_goals, &project, &phase);

    let mut actions = CloseActions::default();

    if options.update_context {
        let input = SessionSummaryInput {
            id: id.clone(),
            file: file
                .strip_prefix(root)
                .unwrap_or(&file)
                .to_string_lossy()
                .into_owned(),
            summary: context_summary_text(&summary),
            accomplishments: summary.accomplishments.clone(),
            decisions: summary.decisions.clone(),
        };
        match ContextStore::for_project(root).add_session_summary(input) {
            Ok(()) => actions.context_updated = true,
            Err(err) => log::warn!("close {id}: context update failed: {err}"),
        }
    }

    if options.update_roadmap {
        match roadmap::update_recent_sessions(root, &roadmap_summary_block(&id, &summary)) {
            Ok(updated) => actions.roadmap_updated = updated,
            Err(err) => log::warn!("close {id}: roadmap update failed: {err}"),
        }
    }

    if options.archive {
        match archive_session(&file, root) {
            Ok(path) => {
                actions.archived = true;
                actions.archive_path = Some(path);
            }
            Err(err) => log::warn!("close {id}: archiving failed: {err}"),
        }
    }

    Ok(CloseOutcome {
        session_id: id,
        project,
        phase,
        summary,
        next_goals,
        handoff_prompt,
        actions,
    })
}

/// Copies the session into the archive directory, then removes the original.
fn archive_session(file: &Path, root: &Path) -> std::io::Result<PathBuf> {
    let archive_dir = paths::archive_dir(root);
    std::fs::create_dir_all(&archive_dir)?;
    let name = file.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "session file has no name")
    })?;
    let target = archive_dir.join(name);
    std::fs::copy(file, &target)?;
    std::fs::remove_file(file)?;
    Ok(target)
}

/// First accomplishment, clipped for the context store.
fn context_summary_text(summary: &SessionSummary) -> String {
    let Some(first) = summary.accomplishments.first() else {
        return EMPTY_SUMMARY.to_string();
    };
    if first.chars().count() < CONTEXT_SUMMARY_MAX_CHARS {
        return first.clone();
    }
    let clipped: String = first.chars().take(CONTEXT_SUMMARY_MAX_CHARS - 3).collect();
    format!("{clipped}...")
}

fn is_finished(status: &str) -> bool {
    let status = status.to_lowercase();
    status.contains("done") || status.contains("complete") || status.contains('✅')
}

#[must_use]
pub fn suggest_next_goals(summary: &SessionSummary, phase: &str, has_roadmap: bool) -> Vec<String> {
    let mut goals: Vec<String> = summary
        .tasks
        .iter()
        .filter(|t| !is_finished(&t.status))
        .take(RESUMED_TASKS)
        .map(|t| format!("Resume task: {} ({})", t.task, t.status))
        .collect();

    if has_roadmap {
        if phase == UNKNOWN_PHASE {
            goals.push("Continue with next phase tasks".to_string());
        } else {
            goals.push(format!("Continue with {phase} tasks"));
        }
        goals.push("Review and test completed features".to_string());
    }

    if goals.is_empty() {
        goals = vec![
            "Review session accomplishments".to_string(),
            "Plan next development tasks".to_string(),
            "Update documentation as needed".to_string(),
        ];
    }
    goals
}

/// Plain-text briefing for whoever picks up the next session.
#[must_use]
pub fn handoff_prompt(
    session_id: &str,
    summary: &SessionSummary,
    next_goals: &[String],
    project: &str,
    phase: &str,
) -> String {
    let mut lines = vec![
        format!("# Session Handoff: {session_id}"),
        String::new(),
        format!("**Project:** {project}"),
        format!("**Phase:** {phase}"),
        String::new(),
        "## Session Summary".to_string(),
        String::new(),
    ];

    if !summary.accomplishments.is_empty() {
        lines.push("**Completed:**".to_string());
        lines.extend(
            summary
                .accomplishments
                .iter()
                .take(HANDOFF_ACCOMPLISHMENTS)
                .map(|a| format!("- {a}")),
        );
        lines.push(String::new());
    }

    if !summary.decisions.is_empty() {
        lines.push("**Key Decisions:**".to_string());
        lines.extend(
            summary
                .decisions
                .iter()
                .take(HANDOFF_DECISIONS)
                .map(|d| format!("- {d}")),
        );
        lines.push(String::new());
    }

    if !next_goals.is_empty() {
        lines.push("## Suggested Next Goals".to_string());
        lines.push(String::new());
        lines.extend(next_goals.iter().map(|g| format!("- {g}")));
        lines.push(String::new());
    }

    lines.extend(
        [
            "## Instructions for Next Session",
            "",
            "1. Read PROJECT_ROADMAP.md for current phase status",
            "2. Review session accomplishments above",
            "3. Continue with suggested goals or user-specified tasks",
            "4. Use reasoning markers and structured tasks for tracking",
            "",
        ]
        .map(str::to_string),
    );
    lines.join("\n")
}
