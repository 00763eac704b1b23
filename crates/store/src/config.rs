//! Layered TOML configuration: built-in defaults < global file < project file.
//!
//! The two physical documents are only ever merged in memory; `set` and
//! `reset` touch exactly one of them.

use crate::paths;
use crate::{Result, StoreError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::{Table, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Project,
}

impl ConfigScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigScope::Global => "global",
            ConfigScope::Project => "project",
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigScope {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(ConfigScope::Global),
            "project" => Ok(ConfigScope::Project),
            _ => Err(StoreError::InvalidScope(s.to_string())),
        }
    }
}

#[must_use]
pub fn default_config() -> Table {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "code".to_string());

    let mut preferences = Table::new();
    preferences.insert("template_variant".into(), Value::from("default"));
    preferences.insert("editor".into(), Value::from(editor));
    preferences.insert("ai_assistant".into(), Value::from("cursor"));

    let mut git = Table::new();
    git.insert("commit_template".into(), Value::from("feat: {summary}"));

    let mut config = Table::new();
    config.insert("preferences".into(), Value::Table(preferences));
    config.insert("git".into(), Value::Table(git));
    config
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    global_file: PathBuf,
}

impl ConfigStore {
    pub fn new(global_file: impl Into<PathBuf>) -> Self {
        Self {
            global_file: global_file.into(),
        }
    }

    /// Store rooted at the per-user directory.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(paths::global_config_file()?))
    }

    #[must_use]
    pub fn global_file(&self) -> &Path {
        &self.global_file
    }

    /// Merged view for `project_root` (global only when `None`).
    #[must_use]
    pub fn load(&self, project_root: Option<&Path>) -> Table {
        let mut config = default_config();
        deep_merge(&mut config, read_table(&self.global_file));
        if let Some(root) = project_root {
            deep_merge(&mut config, read_table(&paths::project_config_file(root)));
        }
        config
    }

    /// Dot-separated lookup into the merged view. `None` when any segment is
    /// missing or is not a table.
    #[must_use]
    pub fn get(&self, key: &str, project_root: Option<&Path>) -> Option<Value> {
        lookup(&self.load(project_root), key).cloned()
    }

    /// Raw contents of one physical document.
    pub fn load_scope(&self, scope: ConfigScope, project_root: Option<&Path>) -> Result<Table> {
        Ok(read_table(&self.scope_file(scope, project_root)?))
    }

    pub fn set(
        &self,
        key: &str,
        value: &str,
        scope: ConfigScope,
        project_root: Option<&Path>,
    ) -> Result<()> {
        let segments = split_key(key)?;
        let file = self.scope_file(scope, project_root)?;
        let mut table = read_table(&file);

        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        let mut current = &mut table;
        for segment in parents {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !slot.is_table() {
                *slot = Value::Table(Table::new());
            }
            current = match slot {
                Value::Table(inner) => inner,
                _ => return Err(StoreError::InvalidKey(key.to_string())),
            };
        }
        current.insert(leaf.to_string(), Value::from(value));

        write_table(&file, &table)?;
        log::debug!("config: set {key} in {scope} scope ({})", file.display());
        Ok(())
    }

    /// Removes `key` from one scope, pruning parent tables left empty.
    /// Returns whether anything was removed.
    pub fn reset(
        &self,
        key: &str,
        scope: ConfigScope,
        project_root: Option<&Path>,
    ) -> Result<bool> {
        let segments = split_key(key)?;
        let file = self.scope_file(scope, project_root)?;
        if !file.exists() {
            return Ok(false);
        }
        let mut table = read_table(&file);
        if !remove_path(&mut table, &segments) {
            return Ok(false);
        }
        write_table(&file, &table)?;
        Ok(true)
    }

    fn scope_file(&self, scope: ConfigScope, project_root: Option<&Path>) -> Result<PathBuf> {
        match scope {
            ConfigScope::Global => Ok(self.global_file.clone()),
            ConfigScope::Project => project_root
                .map(paths::project_config_file)
                .ok_or(StoreError::NotInProject),
        }
    }
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(segments)
}

fn lookup<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let mut value = table.get(segments.next()?)?;
    for segment in segments {
        value = value.as_table()?.get(segment)?;
    }
    Some(value)
}

fn remove_path(table: &mut Table, segments: &[&str]) -> bool {
    match segments {
        [] => false,
        [leaf] => table.remove(*leaf).is_some(),
        [head, rest @ ..] => {
            let Some(Value::Table(inner)) = table.get_mut(*head) else {
                return false;
            };
            let removed = remove_path(inner, rest);
            if removed && inner.is_empty() {
                table.remove(*head);
            }
            removed
        }
    }
}

/// Recursively merges `overlay` into `base`; tables merge, anything else overwrites.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(Value::Table(existing)) = base.get_mut(&key) {
            deep_merge(existing, incoming);
            continue;
        }
        base.insert(key, Value::Table(incoming));
    }
}

fn read_table(path: &Path) -> Table {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Table::new(),
        Err(err) => {
            log::warn!("Failed to read config {}: {err}", path.display());
            return Table::new();
        }
    };
    match toml::from_str::<Table>(&raw) {
        Ok(table) => table,
        Err(err) => {
            log::warn!("Ignoring malformed config {}: {err}", path.display());
            Table::new()
        }
    }
}

fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(table)?;
    crate::document::write_atomic(path, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn editor(store: &ConfigStore, root: Option<&Path>) -> Option<String> {
        store
            .get("preferences.editor", root)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    #[test]
    fn project_overrides_global_overrides_default() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let store = ConfigStore::new(home.path().join("config.toml"));

        store
            .set("preferences.editor", "vim", ConfigScope::Global, None)
            .unwrap();
        assert_eq!(editor(&store, Some(project.path())).as_deref(), Some("vim"));

        store
            .set(
                "preferences.editor",
                "emacs",
                ConfigScope::Project,
                Some(project.path()),
            )
            .unwrap();
        assert_eq!(editor(&store, Some(project.path())).as_deref(), Some("emacs"));
        assert_eq!(editor(&store, None).as_deref(), Some("vim"));

        // Sibling defaults survive the merge.
        assert_eq!(
            store
                .get("preferences.ai_assistant", Some(project.path()))
                .and_then(|v| v.as_str().map(str::to_string))
                .as_deref(),
            Some("cursor")
        );
    }

    #[test]
    fn missing_segments_are_not_errors() {
        let home = tempdir().unwrap();
        let store = ConfigStore::new(home.path().join("config.toml"));
        assert!(store.get("preferences.nope", None).is_none());
        assert!(store.get("preferences.editor.deeper", None).is_none());
        assert!(store.get("git.commit_template", None).is_some());
    }

    #[test]
    fn project_scope_requires_a_root() {
        let home = tempdir().unwrap();
        let store = ConfigStore::new(home.path().join("config.toml"));
        let err = store
            .set("a.b", "c", ConfigScope::Project, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotInProject));
    }

    #[test]
    fn reset_prunes_empty_sections_in_one_scope_only() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let store = ConfigStore::new(home.path().join("config.toml"));
        store.set("custom.deep.key", "1", ConfigScope::Global, None).unwrap();
        store
            .set("custom.deep.key", "2", ConfigScope::Project, Some(project.path()))
            .unwrap();

        assert!(store
            .reset("custom.deep.key", ConfigScope::Project, Some(project.path()))
            .unwrap());
        assert!(store
            .load_scope(ConfigScope::Project, Some(project.path()))
            .unwrap()
            .is_empty());
        assert_eq!(
            store.get("custom.deep.key", Some(project.path())),
            Some(Value::from("1"))
        );

        assert!(!store
            .reset("custom.missing", ConfigScope::Global, None)
            .unwrap());
    }

    #[test]
    fn malformed_document_reads_as_empty() {
        let home = tempdir().unwrap();
        let file = home.path().join("config.toml");
        std::fs::write(&file, "this is = = not toml").unwrap();
        let store = ConfigStore::new(&file);
        assert_eq!(
            store.get("git.commit_template", None),
            Some(Value::from("feat: {summary}"))
        );
    }

    #[test]
    fn scope_parsing() {
        assert_eq!("Global".parse::<ConfigScope>().unwrap(), ConfigScope::Global);
        assert!(matches!(
            "team".parse::<ConfigScope>(),
            Err(StoreError::InvalidScope(_))
        ));
    }
}
