//! Per-project store of closed-session summaries (`.roadmapper/context.json`).

use crate::document::JsonStore;
use crate::{paths, roadmap, Result};
use roadmapper_protocol::{now_timestamp, ContextDocument, ContextSession, KeyDecision};
use std::path::{Path, PathBuf};

/// Input for [`ContextStore::add_session_summary`].
#[derive(Debug, Clone, Default)]
pub struct SessionSummaryInput {
    pub id: String,
    pub file: String,
    pub summary: String,
    pub accomplishments: Vec<String>,
    pub decisions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ContextStore {
    root: PathBuf,
    doc: JsonStore<ContextDocument>,
}

impl ContextStore {
    #[must_use]
    pub fn for_project(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            doc: JsonStore::new(paths::context_file(root)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    #[must_use]
    pub fn load(&self) -> ContextDocument {
        self.doc.load()
    }

    pub fn save(&self, doc: &ContextDocument) -> Result<()> {
        self.doc.save(doc)
    }

    /// Upserts the session by id (the previous entry is replaced, not merged)
    /// and records its decisions.
    pub fn add_session_summary(&self, input: SessionSummaryInput) -> Result<()> {
        let mut doc = self.load();
        let archived_at = now_timestamp();

        doc.sessions.retain(|s| s.id != input.id);
        doc.summaries.insert(input.id.clone(), input.summary.clone());

        for decision in &input.decisions {
            let duplicate = doc
                .key_decisions
                .iter()
                .any(|d| d.session_id == input.id && &d.decision == decision);
            if !duplicate {
                doc.key_decisions.push(KeyDecision {
                    session_id: input.id.clone(),
                    decision: decision.clone(),
                    timestamp: archived_at.clone(),
                });
            }
        }

        doc.sessions.push(ContextSession {
            id: input.id,
            file: input.file,
            summary: input.summary,
            accomplishments: input.accomplishments,
            decisions: input.decisions,
            archived_at,
        });

        if doc.project.is_none() {
            doc.project = roadmap::project_name_for(&self.root);
        }

        self.save(&doc)
    }

    #[must_use]
    pub fn get_session_summary(&self, session_id: &str) -> Option<String> {
        self.load().summaries.get(session_id).cloned()
    }

    /// Last `limit` key decisions, most recent first.
    #[must_use]
    pub fn get_recent_decisions(&self, limit: usize) -> Vec<KeyDecision> {
        self.load()
            .key_decisions
            .into_iter()
            .rev()
            .take(limit)
            .collect()
    }

    /// Sessions whose summary or any accomplishment contains `query`
    /// (case-insensitive); all sessions without a query.
    #[must_use]
    pub fn get_session_pointers(&self, query: Option<&str>) -> Vec<ContextSession> {
        let sessions = self.load().sessions;
        let Some(query) = query.map(str::to_lowercase).filter(|q| !q.is_empty()) else {
            return sessions;
        };
        sessions
            .into_iter()
            .filter(|s| {
                s.summary.to_lowercase().contains(&query)
                    || s
                        .accomplishments
                        .iter()
                        .any(|a| a.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Deletes the document; a no-op when there is none.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
