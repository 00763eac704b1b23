//! Record types shared by every roadmapper crate.
//!
//! These are the shapes of the plain-text artifacts the tool keeps on disk:
//!
//! ```text
//! <project>/.roadmapper/history.jsonl   one HistoryRecord per line
//! <project>/.roadmapper/context.json    ContextDocument
//! ~/.roadmapper/projects.json           path -> RegistryEntry
//! ~/.roadmapper/knowledge.json          [KnowledgeEntry]
//! ```
//!
//! Timestamps are kept as the exact strings found on disk so older documents
//! round-trip untouched; use [`parse_timestamp`] when a real instant is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

mod timestamp;

pub use timestamp::{format_timestamp, now_timestamp, parse_timestamp};

pub const CONTEXT_DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEventKind {
    #[default]
    Session,
}

/// One line of the append-only per-project history log.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    #[serde(rename = "type", default)]
    pub kind: HistoryEventKind,
    pub date: String,
    pub file: String,
    #[serde(default)]
    pub branch: Option<String>,
}

impl HistoryRecord {
    pub fn session(file: impl Into<String>, branch: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind: HistoryEventKind::Session,
            date: format_timestamp(at),
            file: file.into(),
            branch,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }
}

/// Staleness classification derived from session recency.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Inactive,
    Stale,
    #[default]
    Unknown,
}

impl Health {
    pub const ALL: [Health; 4] = [
        Health::Healthy,
        Health::Inactive,
        Health::Stale,
        Health::Unknown,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Health::Healthy => "healthy",
            Health::Inactive => "inactive",
            Health::Stale => "stale",
            Health::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LastSession {
    pub date: String,
    pub file: String,
    #[serde(default)]
    pub branch: Option<String>,
}

impl From<&HistoryRecord> for LastSession {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            date: record.date.clone(),
            file: record.file.clone(),
            branch: record.branch.clone(),
        }
    }
}

/// Value side of the global project registry, keyed by canonical path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub path: String,
    pub name: String,
    pub registered_at: String,
    #[serde(default)]
    pub last_session: Option<LastSession>,
    #[serde(default)]
    pub health: Health,
}

pub type RegistryDocument = BTreeMap<String, RegistryEntry>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContextSession {
    pub id: String,
    pub file: String,
    pub summary: String,
    #[serde(default)]
    pub accomplishments: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    pub archived_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct KeyDecision {
    pub session_id: String,
    pub decision: String,
    pub timestamp: String,
}

/// Per-project accumulation of closed-session summaries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContextDocument {
    #[serde(default = "default_context_version")]
    pub version: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub sessions: Vec<ContextSession>,
    #[serde(default)]
    pub summaries: BTreeMap<String, String>,
    #[serde(default)]
    pub key_decisions: Vec<KeyDecision>,
    /// Reserved; never written by this crate family.
    #[serde(default)]
    pub embeddings: serde_json::Map<String, serde_json::Value>,
}

fn default_context_version() -> String {
    CONTEXT_DOCUMENT_VERSION.to_string()
}

impl Default for ContextDocument {
    fn default() -> Self {
        Self {
            version: default_context_version(),
            project: None,
            sessions: Vec::new(),
            summaries: BTreeMap::new(),
            key_decisions: Vec::new(),
            embeddings: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeKind {
    Discovery,
    Accomplishment,
    Insight,
}

impl KnowledgeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeKind::Discovery => "discovery",
            KnowledgeKind::Accomplishment => "accomplishment",
            KnowledgeKind::Insight => "insight",
        }
    }
}

impl fmt::Display for KnowledgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovery" => Ok(KnowledgeKind::Discovery),
            "accomplishment" => Ok(KnowledgeKind::Accomplishment),
            "insight" => Ok(KnowledgeKind::Insight),
            other => Err(format!(
                "unknown knowledge type '{other}' (expected discovery, accomplishment or insight)"
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    #[serde(rename = "type")]
    pub kind: KnowledgeKind,
    pub content: String,
    pub project: String,
    pub project_path: String,
    pub session_file: String,
    pub extracted_at: String,
}

/// `[TASK]` marker with whatever `[STATUS]`/`[NOTES]` sat close behind it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionTask {
    pub task: String,
    pub status: String,
    pub notes: String,
}

/// Best-effort scrape of a session file. Every field may be empty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub summary: String,
    pub accomplishments: Vec<String>,
    pub decisions: Vec<String>,
    pub discoveries: Vec<String>,
    pub tasks: Vec<SessionTask>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn history_record_matches_wire_shape() {
        let line = r#"{"type":"session","date":"2025-11-04T10:15:00.000000Z","file":"SESSION_2025_11_04_A.md","branch":null}"#;
        let record: HistoryRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.kind, HistoryEventKind::Session);
        assert_eq!(record.branch, None);
        assert_eq!(serde_json::to_string(&record).unwrap(), line);
    }

    #[test]
    fn context_document_tolerates_missing_sections() {
        let doc: ContextDocument = serde_json::from_str(r#"{"project":"Demo"}"#).unwrap();
        assert_eq!(doc.version, CONTEXT_DOCUMENT_VERSION);
        assert_eq!(doc.project.as_deref(), Some("Demo"));
        assert!(doc.sessions.is_empty());
        assert!(doc.embeddings.is_empty());
    }

    #[test]
    fn registry_entry_defaults_unknown_health() {
        let entry: RegistryEntry = serde_json::from_str(
            r#"{"path":"/p","name":"p","registered_at":"2025-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(entry.health, Health::Unknown);
        assert!(entry.last_session.is_none());
    }

    #[test]
    fn knowledge_kind_parses_case_insensitively() {
        assert_eq!("Insight".parse::<KnowledgeKind>(), Ok(KnowledgeKind::Insight));
        assert!("rumour".parse::<KnowledgeKind>().is_err());
    }
}
