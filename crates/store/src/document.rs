use crate::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A whole-file JSON document: read fully, mutate in memory, rewrite atomically.
///
/// A missing or malformed file reads as `T::default()`; the damaged file is
/// left alone until the next successful save replaces it.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn load(&self) -> T {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(err) => {
                log::warn!("Failed to read {}: {err}", self.path.display());
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                log::warn!(
                    "Ignoring malformed document {}: {err}",
                    self.path.display()
                );
                T::default()
            }
        }
    }

    pub fn save(&self, doc: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut bytes = serde_json::to_vec_pretty(doc)?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)
    }
}

/// Writes through a sibling temp file and renames it over `path`, so readers
/// observe either the old or the new contents.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::NoParent(path.to_path_buf()))?;
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document"),
        std::process::id()
    ));

    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    type Doc = BTreeMap<String, u32>;

    #[test]
    fn missing_file_loads_default() {
        let temp = tempdir().unwrap();
        let store: JsonStore<Doc> = JsonStore::new(temp.path().join("absent.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn malformed_file_loads_default_and_is_replaced_on_save() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("doc.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store: JsonStore<Doc> = JsonStore::new(&path);
        let mut doc = store.load();
        assert!(doc.is_empty());

        doc.insert("a".to_string(), 1);
        store.save(&doc).unwrap();
        assert_eq!(store.load(), doc);
    }

    #[test]
    fn save_creates_parent_dirs_and_leaves_no_temp_files() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("doc.json");
        let store: JsonStore<Doc> = JsonStore::new(&path);
        store.save(&Doc::from([("k".to_string(), 7)])).unwrap();

        let names: Vec<String> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["doc.json".to_string()]);
    }
}
