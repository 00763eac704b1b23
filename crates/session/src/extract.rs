//! Best-effort scraping of session markdown.
//!
//! Nothing here is a parser. Each extractor looks for a fixed set of markers
//! and returns whatever it can find; absent sections simply yield nothing.
//!
//! Recognized markers:
//!
//! ```text
//! ## ✅ Session Accomplishments     section, up to the next `##`
//!   Completed:                      sub-list, up to In Progress:/Deferred:/Discoveries:
//!   - ✅ item                       (indented lines continue the item)
//! 🧭 DECISION: text                 anywhere, up to end of line or next marker emoji
//! Discoveries:                      section, up to `---` or `##`
//!   - **Term** - explanation
//! [TASK] text / [STATUS] s / [NOTES] n
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use roadmapper_protocol::{SessionSummary, SessionTask};

/// Items at or below this many characters are treated as noise.
const MIN_ITEM_CHARS: usize = 10;
/// `[STATUS]` / `[NOTES]` are looked up within this many bytes of their `[TASK]`.
const TASK_WINDOW_BYTES: usize = 500;

const SUMMARY_ACCOMPLISHMENTS: usize = 3;
const SUMMARY_DECISIONS: usize = 2;
const SUMMARY_DISCOVERIES: usize = 2;
const ROADMAP_ACCOMPLISHMENTS: usize = 5;
const ROADMAP_DECISIONS: usize = 3;

pub const EMPTY_SUMMARY: &str = "Session work completed.";

static ACCOMPLISHMENTS_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^##[^\n]*✅\s*Session Accomplishments[^\n]*$").expect("valid regex")
});
static NEXT_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n##").expect("valid regex"));
static COMPLETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Completed:").expect("valid regex"));
static COMPLETED_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)In Progress:|Deferred:|Discoveries:").expect("valid regex")
});
static DONE_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s*✅\s*(.+)$").expect("valid regex"));
static NESTED_BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*]\s*)?").expect("valid regex"));
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));

static DECISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)🧭\s*DECISION:\s*").expect("valid regex"));
const DECISION_STOPS: [char; 5] = ['🧭', '🤔', '✅', '⚠', '💡'];

static DISCOVERIES_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)Discoveries:|^##[^\n]*Discoveries[^\n]*$").expect("valid regex")
});
static SECTION_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n---|\n##").expect("valid regex"));
static DISCOVERY_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*]\s*\*\*(.+?)\*\*\s*[-–—]\s*(.+)$").expect("valid regex")
});
static DISCOVERY_BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*]\s*\*\*(.+?)\*\*").expect("valid regex"));

static TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)\[TASK\][ \t]*([^\n]*)$").expect("valid regex"));
static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[STATUS\][ \t]*([^\n]*)").expect("valid regex"));
static NOTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[NOTES\][ \t]*([^\n]*)").expect("valid regex"));

/// Runs every extractor over `content`.
#[must_use]
pub fn extract_summary(content: &str) -> SessionSummary {
    let accomplishments = extract_accomplishments(content);
    let decisions = extract_decisions(content);
    let discoveries = extract_discoveries(content);
    let tasks = extract_tasks(content);
    let summary = compose_summary(&accomplishments, &decisions, &discoveries);
    SessionSummary {
        summary,
        accomplishments,
        decisions,
        discoveries,
        tasks,
    }
}

fn section_after<'a>(content: &'a str, start: usize, end_re: &Regex) -> &'a str {
    let rest = &content[start..];
    match end_re.find(rest) {
        Some(end) => &rest[..end.start()],
        None => rest,
    }
}

fn strip_markup(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "$1");
    CODE_RE.replace_all(&text, "$1").trim().to_string()
}

fn long_enough(item: &str) -> bool {
    item.chars().count() > MIN_ITEM_CHARS
}

#[must_use]
pub fn extract_accomplishments(content: &str) -> Vec<String> {
    let Some(heading) = ACCOMPLISHMENTS_HEADING_RE.find(content) else {
        return Vec::new();
    };
    let section = section_after(content, heading.end(), &NEXT_HEADING_RE);
    let Some(completed) = COMPLETED_RE.find(section) else {
        return Vec::new();
    };
    let completed = section_after(section, completed.end(), &COMPLETED_END_RE);

    let mut items: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    for line in completed.lines() {
        if let Some(caps) = DONE_ITEM_RE.captures(line) {
            items.extend(current.take());
            current = Some(caps[1].trim().to_string());
            continue;
        }
        let continues =
            line.starts_with(|c: char| c == ' ' || c == '\t') && !line.trim().is_empty();
        match current.as_mut() {
            Some(item) if continues => {
                let nested = NESTED_BULLET_RE.replace(line, "");
                item.push(' ');
                item.push_str(nested.trim());
            }
            _ => items.extend(current.take()),
        }
    }
    items.extend(current.take());

    items
        .iter()
        .map(|item| strip_markup(item))
        .filter(|item| long_enough(item))
        .collect()
}

#[must_use]
pub fn extract_decisions(content: &str) -> Vec<String> {
    let markers: Vec<(usize, usize)> = DECISION_RE
        .find_iter(content)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut decisions = Vec::new();
    for (idx, &(_, body_start)) in markers.iter().enumerate() {
        let body_end = markers
            .get(idx + 1)
            .map_or(content.len(), |&(next_start, _)| next_start);
        let mut body = &content[body_start..body_end];
        if let Some(newline) = body.find('\n') {
            body = &body[..newline];
        }
        if let Some(stop) = body.find(|c: char| DECISION_STOPS.contains(&c)) {
            body = &body[..stop];
        }
        let decision = body.trim();
        if !decision.is_empty() {
            decisions.push(decision.to_string());
        }
    }
    decisions
}

#[must_use]
pub fn extract_discoveries(content: &str) -> Vec<String> {
    let Some(start) = DISCOVERIES_START_RE.find(content) else {
        return Vec::new();
    };
    let section = section_after(content, start.end(), &SECTION_END_RE);

    let pairs: Vec<String> = section
        .lines()
        .filter_map(|line| DISCOVERY_PAIR_RE.captures(line))
        .map(|caps| format!("{} - {}", caps[1].trim(), caps[2].trim()))
        .collect();
    if !pairs.is_empty() {
        return pairs;
    }

    section
        .lines()
        .filter_map(|line| DISCOVERY_BOLD_RE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|item| long_enough(item))
        .collect()
}

/// `[TASK]` lines with the first `[STATUS]`/`[NOTES]` found in a fixed window
/// after each one. The association is positional only: a task without its
/// own status can pick up the next task's.
#[must_use]
pub fn extract_tasks(content: &str) -> Vec<SessionTask> {
    TASK_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let task = caps[1].trim().to_string();
            if task.is_empty() {
                return None;
            }
            let window = window_from(content, whole.start(), TASK_WINDOW_BYTES);
            let status = STATUS_RE
                .captures(window)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            let notes = NOTES_RE
                .captures(window)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default();
            Some(SessionTask {
                task,
                status,
                notes,
            })
        })
        .collect()
}

fn window_from(content: &str, start: usize, len: usize) -> &str {
    let mut end = (start + len).min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[start..end]
}

#[must_use]
pub fn compose_summary(
    accomplishments: &[String],
    decisions: &[String],
    discoveries: &[String],
) -> String {
    let mut parts = Vec::new();
    if !accomplishments.is_empty() {
        parts.push(format!(
            "Completed: {}",
            first_n(accomplishments, SUMMARY_ACCOMPLISHMENTS).join(", ")
        ));
    }
    if !decisions.is_empty() {
        parts.push(format!(
            "Key decisions: {}",
            first_n(decisions, SUMMARY_DECISIONS).join("; ")
        ));
    }
    if !discoveries.is_empty() {
        parts.push(format!(
            "Discoveries: {}",
            first_n(discoveries, SUMMARY_DISCOVERIES).join("; ")
        ));
    }
    if parts.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }
    format!("{}.", parts.join(". "))
}

fn first_n(items: &[String], n: usize) -> &[String] {
    &items[..items.len().min(n)]
}

/// Block inserted under the roadmap's "Recent Sessions" heading.
#[must_use]
pub fn roadmap_summary_block(session_id: &str, summary: &SessionSummary) -> String {
    let mut lines = vec![format!("**Session {session_id}:** ✅ Complete")];
    for item in first_n(&summary.accomplishments, ROADMAP_ACCOMPLISHMENTS) {
        lines.push(format!("- {item}"));
    }
    if !summary.decisions.is_empty() {
        lines.push(String::new());
        lines.push("**Key decisions:**".to_string());
        for decision in first_n(&summary.decisions, ROADMAP_DECISIONS) {
            lines.push(format!("- {decision}"));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SESSION: &str = "\
# Session 2025-11-04-A: Parser

## 🔧 Work Log

🧭 DECISION: Store history as JSON lines ✅ done
Some text. 🧭 DECISION: Keep config in TOML
🧭 decision: lowercase markers count too

## ✅ Session Accomplishments

**Completed:**
- ✅ Implemented the **session** letter sequencing
- ✅ `extract` module with tests
  - nested detail about fixtures
- ✅ Tiny
- [ ] Not done yet, should be ignored
- ✅ Wired the CLI through clap

**Deferred:**
- ✅ Deferred items are not accomplishments

**Discoveries:**
- **Naive timestamps** - older logs omit the offset
- **Regex lookaheads** — they are not supported by the regex crate

---

[TASK] Port the registry
[STATUS] in progress
[NOTES] waiting on discovery
[TASK] Write docs
";

    #[test]
    fn accomplishments_come_from_completed_list_only() {
        assert_eq!(
            extract_accomplishments(SESSION),
            vec![
                "Implemented the session letter sequencing".to_string(),
                "extract module with tests nested detail about fixtures".to_string(),
                "Wired the CLI through clap".to_string(),
            ]
        );
    }

    #[test]
    fn accomplishments_require_the_section() {
        let text = "**Completed:**\n- ✅ Something long enough\n";
        assert!(extract_accomplishments(text).is_empty());
    }

    #[test]
    fn decisions_stop_at_line_end_and_marker_emoji() {
        assert_eq!(
            extract_decisions(SESSION),
            vec![
                "Store history as JSON lines".to_string(),
                "Keep config in TOML".to_string(),
                "lowercase markers count too".to_string(),
            ]
        );
    }

    #[test]
    fn decisions_need_the_compass_marker() {
        let prose = "We hit some indecision: nobody picked a database yet.\n\
                     Our final decision: postpone it.\n\
                     DECISION: bare markers are prose too\n";
        assert!(extract_decisions(prose).is_empty());
    }

    #[test]
    fn discoveries_prefer_bold_pairs() {
        assert_eq!(
            extract_discoveries(SESSION),
            vec![
                "Naive timestamps - older logs omit the offset".to_string(),
                "Regex lookaheads - they are not supported by the regex crate".to_string(),
            ]
        );
    }

    #[test]
    fn discoveries_fall_back_to_bare_bold_items() {
        let text = "Discoveries:\n- **Caching registry reads is unnecessary**\n- **Short**\n\n## Next\n- **Outside the section entirely**\n";
        assert_eq!(
            extract_discoveries(text),
            vec!["Caching registry reads is unnecessary".to_string()]
        );
    }

    #[test]
    fn tasks_use_a_window_after_each_marker() {
        let tasks = extract_tasks(SESSION);
        assert_eq!(
            tasks,
            vec![
                SessionTask {
                    task: "Port the registry".to_string(),
                    status: "in progress".to_string(),
                    notes: "waiting on discovery".to_string(),
                },
                SessionTask {
                    task: "Write docs".to_string(),
                    status: "unknown".to_string(),
                    notes: String::new(),
                },
            ]
        );
    }

    #[test]
    fn summary_joins_leading_items() {
        let summary = extract_summary(SESSION);
        assert_eq!(
            summary.summary,
            "Completed: Implemented the session letter sequencing, extract module with tests nested detail about fixtures, Wired the CLI through clap. \
Key decisions: Store history as JSON lines; Keep config in TOML. \
Discoveries: Naive timestamps - older logs omit the offset; Regex lookaheads - they are not supported by the regex crate."
        );
    }

    #[test]
    fn empty_text_yields_placeholder_summary() {
        let summary = extract_summary("# Nothing here\n");
        assert_eq!(summary.summary, EMPTY_SUMMARY);
        assert!(summary.accomplishments.is_empty());
        assert!(summary.tasks.is_empty());
    }

    #[test]
    fn roadmap_block_limits_items() {
        let summary = SessionSummary {
            accomplishments: (1..=7).map(|i| format!("accomplishment {i}")).collect(),
            decisions: (1..=4).map(|i| format!("decision {i}")).collect(),
            ..SessionSummary::default()
        };
        let block = roadmap_summary_block("SESSION_2025_11_04_A", &summary);
        assert_eq!(
            block,
            "**Session SESSION_2025_11_04_A:** ✅ Complete\n\
- accomplishment 1\n- accomplishment 2\n- accomplishment 3\n- accomplishment 4\n- accomplishment 5\n\
\n**Key decisions:**\n- decision 1\n- decision 2\n- decision 3"
        );
    }
}
