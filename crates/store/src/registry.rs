//! Global project registry (`~/.roadmapper/projects.json`) plus discovery.

use crate::document::JsonStore;
use crate::history::HistoryLog;
use crate::{paths, Result, StoreError};
use chrono::{DateTime, Utc};
use roadmapper_protocol::{
    now_timestamp, Health, LastSession, RegistryDocument, RegistryEntry,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const HEALTHY_MAX_DAYS: i64 = 7;
const INACTIVE_MAX_DAYS: i64 = 30;
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    store: JsonStore<RegistryDocument>,
}

impl ProjectRegistry {
    /// Registry stored in `dir/projects.json`.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        Self {
            store: JsonStore::new(dir.join(paths::REGISTRY_FILE_NAME)),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::open(&paths::global_config_dir()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Raw document, without refreshing or pruning.
    #[must_use]
    pub fn load(&self) -> RegistryDocument {
        self.store.load()
    }

    pub fn register(&self, path: &Path, name: Option<&str>) -> Result<RegistryEntry> {
        let path = canonical_path(path)?;
        let key = path.to_string_lossy().into_owned();
        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| key.clone()),
        };

        let entry = RegistryEntry {
            path: key.clone(),
            name,
            registered_at: now_timestamp(),
            last_session: last_session_info(&path),
            health: project_health(&path),
        };

        let mut doc = self.store.load();
        doc.insert(key, entry.clone());
        self.store.save(&doc)?;
        log::debug!("registered project {}", entry.path);
        Ok(entry)
    }

    /// Returns whether an entry was removed.
    pub fn unregister(&self, path: &Path) -> Result<bool> {
        let key = canonical_path(path)?.to_string_lossy().into_owned();
        let mut doc = self.store.load();
        if doc.remove(&key).is_none() {
            return Ok(false);
        }
        self.store.save(&doc)?;
        Ok(true)
    }

    /// Live entries with freshly derived `last_session` and `health`.
    /// Entries whose directory vanished are pruned from disk.
    pub fn list_all(&self) -> Result<Vec<RegistryEntry>> {
        let mut doc = self.store.load();
        let before = doc.len();
        doc.retain(|key, _| Path::new(key).exists());
        if doc.len() != before {
            log::info!("pruned {} missing project(s) from registry", before - doc.len());
            self.store.save(&doc)?;
        }
        Ok(refreshed(doc))
    }

    /// Same view as [`list_all`](Self::list_all) without touching the file on disk.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RegistryEntry> {
        let mut doc = self.store.load();
        doc.retain(|key, _| Path::new(key).exists());
        refreshed(doc)
    }

    /// Registers every discovered project not yet known. Returns how many were added.
    /// A project that fails to register is logged and skipped.
    pub fn sync(&self, search_paths: &[PathBuf]) -> Result<usize> {
        let known = self.store.load();
        let mut added = 0;
        for project in discover_projects(search_paths) {
            let key = project.to_string_lossy().into_owned();
            if known.contains_key(&key) {
                continue;
            }
            match self.register(&project, None) {
                Ok(_) => added += 1,
                Err(err) => log::warn!("sync: failed to register {}: {err}", project.display()),
            }
        }
        log::info!("registry sync added {added} project(s)");
        Ok(added)
    }
}

fn refreshed(doc: RegistryDocument) -> Vec<RegistryEntry> {
    doc.into_values()
        .map(|mut entry| {
            let path = PathBuf::from(&entry.path);
            entry.last_session = last_session_info(&path);
            entry.health = project_health(&path);
            entry
        })
        .collect()
}

/// Canonical absolute form used as the registry key.
pub fn canonical_path(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(_) => std::path::absolute(path).map_err(StoreError::from),
    }
}

/// Most recent history record of the project.
#[must_use]
pub fn last_session_info(root: &Path) -> Option<LastSession> {
    HistoryLog::for_project(root)
        .read(Some(1), None)
        .first()
        .map(LastSession::from)
}

#[must_use]
pub fn project_health(root: &Path) -> Health {
    health_at(root, Utc::now())
}

/// [`project_health`] evaluated against a fixed clock.
#[must_use]
pub fn health_at(root: &Path, now: DateTime<Utc>) -> Health {
    if !paths::roadmap_file(root).exists() {
        return Health::Unknown;
    }
    let Some(last) = HistoryLog::for_project(root)
        .read(Some(1), None)
        .first()
        .and_then(|r| r.timestamp())
    else {
        return Health::Unknown;
    };

    let days = (now - last).num_days();
    if days <= HEALTHY_MAX_DAYS {
        Health::Healthy
    } else if days <= INACTIVE_MAX_DAYS {
        Health::Inactive
    } else {
        Health::Stale
    }
}

/// Conventional project parents under `home`.
#[must_use]
pub fn default_search_paths(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join("Projects"),
        home.join("projects"),
        home.join("Documents").join("Projects"),
        home.join("Development"),
        home.join("dev"),
        home.join("source"),
        home.join("code"),
    ]
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Directories under `search_paths` holding a roadmap, canonicalized and
/// deduplicated. Unreadable subtrees are skipped.
#[must_use]
pub fn discover_projects(search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    for base in search_paths {
        if !base.is_dir() {
            continue;
        }
        for entry in WalkDir::new(base).into_iter().filter_entry(|e| !is_skipped(e)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::debug!("discovery: skipping {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != paths::ROADMAP_FILE_NAME {
                continue;
            }
            if let Some(parent) = entry.path().parent() {
                let root = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
                found.insert(root);
            }
        }
    }
    log::info!("discovered {} project(s)", found.len());
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::log_session_at;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use roadmapper_protocol::HistoryRecord;
    use std::fs;
    use tempfile::tempdir;

    fn make_project(parent: &Path, name: &str) -> PathBuf {
        let root = parent.join(name);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(paths::ROADMAP_FILE_NAME), "# Roadmap\n").unwrap();
        root.canonicalize().unwrap()
    }

    #[test]
    fn health_boundaries() {
        let temp = tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap();
        for (days, expected) in [
            (7, Health::Healthy),
            (8, Health::Inactive),
            (30, Health::Inactive),
            (31, Health::Stale),
        ] {
            let root = make_project(temp.path(), &format!("p{days}"));
            HistoryLog::for_project(&root)
                .append_record(&HistoryRecord::session("S.md", None, now - Duration::days(days)))
                .unwrap();
            assert_eq!(health_at(&root, now), expected, "{days} days");
        }
    }

    #[test]
    fn health_is_unknown_without_history_or_roadmap() {
        let temp = tempdir().unwrap();
        let with_roadmap = make_project(temp.path(), "roadmap-only");
        assert_eq!(project_health(&with_roadmap), Health::Unknown);

        let bare = temp.path().join("bare");
        fs::create_dir_all(&bare).unwrap();
        log_session_at(Path::new("S.md"), &bare, Utc::now());
        assert_eq!(project_health(&bare), Health::Unknown);
    }

    #[test]
    fn register_list_unregister() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let registry = ProjectRegistry::open(home.path());
        let alpha = make_project(work.path(), "alpha");
        log_session_at(Path::new("SESSION_X.md"), &alpha, Utc::now());

        let entry = registry.register(&alpha.join("."), None).unwrap();
        assert_eq!(entry.name, "alpha");
        assert_eq!(entry.path, alpha.to_string_lossy());
        assert_eq!(entry.health, Health::Healthy);
        assert_eq!(
            entry.last_session.as_ref().map(|s| s.file.as_str()),
            Some("SESSION_X.md")
        );

        registry.register(&alpha, Some("Renamed")).unwrap();
        let listed = registry.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Renamed");

        assert!(registry.unregister(&alpha).unwrap());
        assert!(!registry.unregister(&alpha).unwrap());
        assert!(registry.list_all().unwrap().is_empty());
    }

    #[test]
    fn list_all_prunes_vanished_projects() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let registry = ProjectRegistry::open(home.path());
        let keep = make_project(work.path(), "keep");
        let gone = make_project(work.path(), "gone");
        registry.register(&keep, None).unwrap();
        registry.register(&gone, None).unwrap();

        fs::remove_dir_all(&gone).unwrap();
        let listed = registry.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(registry.load().len(), 1);
    }

    #[test]
    fn snapshot_hides_vanished_projects_without_rewriting() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let registry = ProjectRegistry::open(home.path());
        let keep = make_project(work.path(), "keep");
        let gone = make_project(work.path(), "gone");
        registry.register(&keep, None).unwrap();
        registry.register(&gone, None).unwrap();
        let on_disk = fs::read_to_string(registry.path()).unwrap();

        fs::remove_dir_all(&gone).unwrap();
        let names: Vec<String> = registry.snapshot().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["keep".to_string()]);
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), on_disk);
    }

    #[test]
    fn discovery_finds_nested_roadmaps_and_skips_vendor_dirs() {
        let work = tempdir().unwrap();
        let a = make_project(work.path(), "a");
        let b = make_project(&work.path().join("group"), "b");
        make_project(&work.path().join("a").join("node_modules"), "dep");
        make_project(&work.path().join("c").join("target"), "out");

        let found = discover_projects(&[
            work.path().to_path_buf(),
            work.path().join("group"),
            work.path().join("missing"),
        ]);
        assert_eq!(found, {
            let mut v = vec![a, b];
            v.sort();
            v
        });
    }

    #[test]
    fn sync_registers_only_new_projects() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let registry = ProjectRegistry::open(home.path());
        let a = make_project(work.path(), "a");
        make_project(work.path(), "b");
        registry.register(&a, Some("Known")).unwrap();

        let added = registry.sync(&[work.path().to_path_buf()]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(registry.sync(&[work.path().to_path_buf()]).unwrap(), 0);
        assert_eq!(registry.load()[&a.to_string_lossy().into_owned()].name, "Known");
    }

    #[test]
    fn sync_skips_projects_that_fail_to_register() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let registry = ProjectRegistry::open(home.path());
        make_project(work.path(), "a");
        make_project(work.path(), "b");
        // A non-empty directory in place of projects.json makes every save fail.
        fs::create_dir_all(registry.path().join("blocked")).unwrap();

        assert_eq!(registry.sync(&[work.path().to_path_buf()]).unwrap(), 0);
    }

    #[test]
    fn default_search_paths_cover_common_locations() {
        let paths = default_search_paths(Path::new("/home/u"));
        assert!(paths.contains(&PathBuf::from("/home/u/Documents/Projects")));
        assert_eq!(paths.len(), 7);
    }
}
