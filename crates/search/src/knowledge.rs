//! Global knowledge base (`~/.roadmapper/knowledge.json`).
//!
//! Entries are scraped from session files across registered projects and
//! stored append-only. An entry's identity is the SHA-256 of its content,
//! project and session file name; re-indexing an unchanged session adds
//! nothing.
//!
//! Recognized sections:
//!
//! ```text
//! ## … Discoveries / **Discoveries:**    - list items            discovery
//! ## … Session Accomplishments
//!   **Completed:**                      - [x] item / - ✅ item    accomplishment
//! ## … Work Log                         Learned: … / **Topic**: … insight
//! ```

use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use roadmapper_protocol::{now_timestamp, KnowledgeEntry, KnowledgeKind, RegistryEntry};
use roadmapper_store::{paths, JsonStore, ProjectRegistry};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MIN_ITEM_CHARS: usize = 10;
const MIN_INSIGHT_CHARS: usize = 20;
const MAX_INSIGHTS_PER_SESSION: usize = 5;
const RELATED_WORDS: usize = 5;
const RELATED_MIN_WORD_CHARS: usize = 4;
pub const MAX_RELATED: usize = 10;

static NEXT_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n##").expect("valid regex"));

static DISCOVERIES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^(?:##[^\n]*Discoveries[^\n]*|\*\*Discoveries:\*\*[ \t]*)$")
        .expect("valid regex")
});
static DISCOVERIES_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n##|\n\*\*|\n---").expect("valid regex"));
static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s+(.+)$").expect("valid regex"));

static ACCOMPLISHMENTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^##[^\n]*Session Accomplishments[^\n]*$").expect("valid regex")
});
static COMPLETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\*\*Completed:\*\*[ \t]*$").expect("valid regex"));
static COMPLETED_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\*\*|\n##").expect("valid regex"));
static DONE_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^-\s*(?:\[x\]|✅)\s+(.+)$").expect("valid regex"));

static WORK_LOG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^##[^\n]*Work Log[^\n]*$").expect("valid regex"));
static INSIGHT_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)(?:Learned|Learn|Discovery|Found|Key insight|Insight|Important|Note|Remember):[ \t]*(.+)$",
    )
    .expect("valid regex")
});
static BOLD_TOPIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\*\*([^*\n]+?)\*\*:[ \t]*(.+)$").expect("valid regex"));

/// Body following the first `heading` match, up to the first `end` match.
fn section<'a>(content: &'a str, heading: &Regex, end: &Regex) -> Option<&'a str> {
    let start = heading.find(content)?.end();
    let rest = &content[start..];
    let stop = end.find(rest).map_or(rest.len(), |m| m.start());
    Some(&rest[..stop])
}

fn is_placeholder(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

fn list_items<'a>(
    body: &'a str,
    item: &'a Regex,
    min_chars: usize,
) -> impl Iterator<Item = String> + 'a {
    body.lines().filter_map(move |line| {
        let text = item.captures(line.trim())?.get(1)?.as_str().trim();
        (text.chars().count() > min_chars && !is_placeholder(text)).then(|| text.to_string())
    })
}

#[must_use]
pub fn extract_discoveries(content: &str) -> Vec<String> {
    section(content, &DISCOVERIES_RE, &DISCOVERIES_END_RE)
        .map(|body| list_items(body, &LIST_ITEM_RE, MIN_ITEM_CHARS).collect())
        .unwrap_or_default()
}

#[must_use]
pub fn extract_accomplishments(content: &str) -> Vec<String> {
    section(content, &ACCOMPLISHMENTS_RE, &NEXT_HEADING_RE)
        .and_then(|body| section(body, &COMPLETED_RE, &COMPLETED_END_RE))
        .map(|body| list_items(body, &DONE_ITEM_RE, MIN_ITEM_CHARS).collect())
        .unwrap_or_default()
}

/// Marker lines first, then `**Topic**: text` lines; at most five overall.
#[must_use]
pub fn extract_insights(content: &str) -> Vec<String> {
    let Some(body) = section(content, &WORK_LOG_RE, &NEXT_HEADING_RE) else {
        return Vec::new();
    };
    let marked = INSIGHT_MARKER_RE.captures_iter(body).filter_map(|caps| {
        caps.get(1)
            .map(|m| m.as_str().trim_start_matches(|c: char| c == '*' || c.is_whitespace()))
            .map(|text| text.trim().to_string())
    });
    let topics = BOLD_TOPIC_RE.captures_iter(body).filter_map(|caps| {
        let topic = caps.get(1)?.as_str().trim();
        let text = caps.get(2)?.as_str().trim();
        Some(format!("{topic}: {text}"))
    });
    marked
        .chain(topics)
        .filter(|text| text.chars().count() > MIN_INSIGHT_CHARS)
        .take(MAX_INSIGHTS_PER_SESSION)
        .collect()
}

/// Where an extracted entry came from.
#[derive(Debug, Clone, Copy)]
pub struct EntrySource<'a> {
    pub project: &'a str,
    pub project_path: &'a str,
    pub session_file: &'a str,
}

/// All knowledge in one session's text, stamped with `extracted_at`.
#[must_use]
pub fn extract_knowledge(
    content: &str,
    source: EntrySource<'_>,
    extracted_at: &str,
) -> Vec<KnowledgeEntry> {
    let entry = |kind, content: String| KnowledgeEntry {
        kind,
        content,
        project: source.project.to_string(),
        project_path: source.project_path.to_string(),
        session_file: source.session_file.to_string(),
        extracted_at: extracted_at.to_string(),
    };
    let mut out = Vec::new();
    out.extend(
        extract_discoveries(content)
            .into_iter()
            .map(|c| entry(KnowledgeKind::Discovery, c)),
    );
    out.extend(
        extract_accomplishments(content)
            .into_iter()
            .map(|c| entry(KnowledgeKind::Accomplishment, c)),
    );
    out.extend(
        extract_insights(content)
            .into_iter()
            .map(|c| entry(KnowledgeKind::Insight, c)),
    );
    out
}

/// Reads and scrapes one session file. Unreadable files yield nothing.
#[must_use]
pub fn extract_from_session(
    session_file: &Path,
    project_path: &Path,
    project: &str,
) -> Vec<KnowledgeEntry> {
    let content = match std::fs::read_to_string(session_file) {
        Ok(content) => content,
        Err(err) => {
            log::debug!("skipping {}: {err}", session_file.display());
            return Vec::new();
        }
    };
    let file_name = session_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let project_path = project_path.to_string_lossy();
    extract_knowledge(
        &content,
        EntrySource {
            project,
            project_path: &project_path,
            session_file: &file_name,
        },
        &now_timestamp(),
    )
}

/// Hex SHA-256 over content, project and session file.
#[must_use]
pub fn entry_identity(entry: &KnowledgeEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.content.as_bytes());
    hasher.update(entry.project.as_bytes());
    hasher.update(entry.session_file.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    store: JsonStore<Vec<KnowledgeEntry>>,
}

impl KnowledgeBase {
    /// Knowledge base stored in `dir/knowledge.json`.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        Self {
            store: JsonStore::new(dir.join(paths::KNOWLEDGE_FILE_NAME)),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::open(&paths::global_config_dir()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    #[must_use]
    pub fn load(&self) -> Vec<KnowledgeEntry> {
        self.store.load()
    }

    /// Appends the entries whose identity is not yet stored. Returns how many
    /// were added.
    pub fn add_entries(&self, entries: impl IntoIterator<Item = KnowledgeEntry>) -> Result<usize> {
        let mut stored = self.store.load();
        let mut seen: HashSet<String> = stored.iter().map(entry_identity).collect();
        let before = stored.len();
        for entry in entries {
            if seen.insert(entry_identity(&entry)) {
                stored.push(entry);
            }
        }
        let added = stored.len() - before;
        if added > 0 {
            self.store.save(&stored)?;
        }
        Ok(added)
    }

    /// Indexes active and archived sessions of each project.
    pub fn index_projects(&self, projects: &[RegistryEntry]) -> Result<usize> {
        let mut extracted = Vec::new();
        for project in projects {
            let root = PathBuf::from(&project.path);
            for session in paths::all_session_files(&root) {
                extracted.extend(extract_from_session(&session, &root, &project.name));
            }
        }
        let added = self.add_entries(extracted)?;
        log::info!(
            "indexed {} project(s), {added} new knowledge entr{}",
            projects.len(),
            if added == 1 { "y" } else { "ies" }
        );
        Ok(added)
    }

    /// Indexes every live registered project.
    pub fn index_all(&self, registry: &ProjectRegistry) -> Result<usize> {
        self.index_projects(&registry.list_all()?)
    }

    /// Case-insensitive substring match on content, optionally of one kind.
    #[must_use]
    pub fn search(&self, query: &str, kind: Option<KnowledgeKind>) -> Vec<KnowledgeEntry> {
        let needle = query.to_lowercase();
        self.store
            .load()
            .into_iter()
            .filter(|entry| kind.map_or(true, |k| entry.kind == k))
            .filter(|entry| entry.content.to_lowercase().contains(&needle))
            .collect()
    }

    #[must_use]
    pub fn by_topic(&self, topic: &str) -> Vec<KnowledgeEntry> {
        self.search(topic, None)
    }

    /// Entries from other projects sharing one of the first few long words
    /// of `entry`.
    #[must_use]
    pub fn related(&self, entry: &KnowledgeEntry) -> Vec<KnowledgeEntry> {
        let lowered = entry.content.to_lowercase();
        let words: Vec<&str> = lowered
            .split_whitespace()
            .filter(|word| word.chars().count() > RELATED_MIN_WORD_CHARS)
            .take(RELATED_WORDS)
            .collect();
        if words.is_empty() {
            return Vec::new();
        }
        self.store
            .load()
            .into_iter()
            .filter(|other| other != entry && other.project != entry.project)
            .filter(|other| {
                let content = other.content.to_lowercase();
                words.iter().any(|word| content.contains(word))
            })
            .take(MAX_RELATED)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const SESSION: &str = "# Session 2025-11-04-A: Caching\n\
\n\
## 🔧 Work Log\n\
\n\
Learned: the parser allocates on every token boundary\n\
**Cache layer**: memoized lookups cut latency in half\n\
Note: short one\n\
\n\
## ✅ Session Accomplishments\n\
\n\
**Completed:**\n\
- [x] Added the lookup cache module\n\
- ✅ Wired cache into the request path\n\
- [ ] Benchmarks for the cold path\n\
- [x] tiny\n\
\n\
**Deferred:**\n\
- [x] Not part of completed\n\
\n\
## Discoveries\n\
\n\
- Regex compilation dominates startup time\n\
- short\n\
- [Important findings or insights]\n";

    fn source() -> EntrySource<'static> {
        EntrySource {
            project: "alpha",
            project_path: "/work/alpha",
            session_file: "SESSION_2025_11_04_A.md",
        }
    }

    fn contents(entries: &[KnowledgeEntry], kind: KnowledgeKind) -> Vec<&str> {
        entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.content.as_str())
            .collect()
    }

    #[test]
    fn extracts_each_kind() {
        let entries = extract_knowledge(SESSION, source(), "2025-11-04T10:00:00Z");
        assert_eq!(
            contents(&entries, KnowledgeKind::Discovery),
            vec!["Regex compilation dominates startup time"]
        );
        assert_eq!(
            contents(&entries, KnowledgeKind::Accomplishment),
            vec!["Added the lookup cache module", "Wired cache into the request path"]
        );
        assert_eq!(
            contents(&entries, KnowledgeKind::Insight),
            vec![
                "the parser allocates on every token boundary",
                "Cache layer: memoized lookups cut latency in half",
            ]
        );
        assert!(entries.iter().all(|e| e.project == "alpha"
            && e.session_file == "SESSION_2025_11_04_A.md"));
    }

    #[test]
    fn bold_discoveries_block_and_bold_markers() {
        let text = "## 🔧 Work Log\n**Found:** retries mask the real timeout error\n\n\
## ✅ Session Accomplishments\n\n**Discoveries:**\n- Session letters collide after archiving\n\n---\n";
        assert_eq!(
            extract_discoveries(text),
            vec!["Session letters collide after archiving".to_string()]
        );
        assert_eq!(
            extract_insights(text),
            vec!["retries mask the real timeout error".to_string()]
        );
    }

    #[test]
    fn insights_are_capped() {
        let mut text = String::from("## 🔧 Work Log\n");
        for i in 0..8 {
            text.push_str(&format!("Insight: observation number {i} about the system\n"));
        }
        assert_eq!(extract_insights(&text).len(), MAX_INSIGHTS_PER_SESSION);
    }

    #[test]
    fn sessions_without_sections_yield_nothing() {
        assert!(extract_knowledge("# Just a title\n", source(), "now").is_empty());
    }

    #[test]
    fn identity_ignores_kind_and_timestamp() {
        let mut a = extract_knowledge(SESSION, source(), "t1").remove(0);
        let b = a.clone();
        a.extracted_at = "t2".to_string();
        assert_eq!(entry_identity(&a), entry_identity(&b));
        assert_eq!(entry_identity(&a).len(), 64);
        a.project = "beta".to_string();
        assert_ne!(entry_identity(&a), entry_identity(&b));
    }

    fn registered(root: &Path, name: &str) -> RegistryEntry {
        RegistryEntry {
            path: root.to_string_lossy().into_owned(),
            name: name.to_string(),
            registered_at: "2025-11-04T10:00:00Z".to_string(),
            last_session: None,
            health: Default::default(),
        }
    }

    #[test]
    fn reindexing_only_adds_new_entries() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let session = project.path().join("SESSION_2025_11_04_A.md");
        fs::write(&session, SESSION).unwrap();
        let projects = vec![registered(project.path(), "alpha")];
        let kb = KnowledgeBase::open(home.path());

        let first = kb.index_projects(&projects).unwrap();
        assert_eq!(first, 5);
        assert_eq!(kb.index_projects(&projects).unwrap(), 0);
        assert_eq!(kb.load().len(), 5);

        let changed = SESSION.replace(
            "- Regex compilation dominates startup time",
            "- Regex compilation dominates startup time\n- Lazy statics remove the compile cost",
        );
        fs::write(&session, changed).unwrap();
        assert_eq!(kb.index_projects(&projects).unwrap(), 1);
        assert_eq!(kb.load().len(), 6);
    }

    #[test]
    fn archived_sessions_are_indexed() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let archive = paths::archive_dir(project.path());
        fs::create_dir_all(&archive).unwrap();
        fs::write(archive.join("SESSION_old.md"), SESSION).unwrap();
        let kb = KnowledgeBase::open(home.path());
        assert_eq!(kb.index_projects(&[registered(project.path(), "alpha")]).unwrap(), 5);
    }

    fn seeded() -> (tempfile::TempDir, KnowledgeBase) {
        let home = tempdir().unwrap();
        let kb = KnowledgeBase::open(home.path());
        let mut entries = extract_knowledge(SESSION, source(), "t");
        entries.extend(extract_knowledge(
            "## Discoveries\n- Lookup tables beat regex compilation here\n- Unrelated note about docs\n",
            EntrySource {
                project: "beta",
                project_path: "/work/beta",
                session_file: "SESSION_x.md",
            },
            "t",
        ));
        kb.add_entries(entries).unwrap();
        (home, kb)
    }

    #[test]
    fn search_is_case_insensitive_and_filters_kind() {
        let (_home, kb) = seeded();
        assert_eq!(kb.search("CACHE", None).len(), 3);
        let only = kb.search("cache", Some(KnowledgeKind::Accomplishment));
        assert_eq!(only.len(), 2);
        assert_eq!(kb.by_topic("regex").len(), 2);
    }

    #[test]
    fn related_looks_across_projects_only() {
        let (_home, kb) = seeded();
        let entry = kb
            .search("Regex compilation dominates", None)
            .into_iter()
            .next()
            .unwrap();
        let related = kb.related(&entry);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].project, "beta");
        assert_eq!(related[0].content, "Lookup tables beat regex compilation here");
    }
}
