//! Concurrent, content-addressed level index
//!
//! Three maps behind one lock:
//! - `by_id`: level id to the owning entry
//! - `by_hash`: content hash to the id of the most recent insert with that hash
//! - `by_path`: level directory to id
//!
//! Every `by_hash` and `by_path` value resolves to a `by_id` entry whose hash
//! and path match. All mutations update the three maps in one critical
//! section, so readers never observe a half-applied insert or removal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::level::{LoadedEntry, sanitize_for_id};

#[derive(Debug, Default)]
struct IndexInner {
    by_id: HashMap<String, Arc<LoadedEntry>>,
    by_hash: HashMap<String, String>,
    by_path: HashMap<PathBuf, String>,
}

impl IndexInner {
    fn remove_id(&mut self, id: &str) -> Option<Arc<LoadedEntry>> {
        let entry = self.by_id.remove(id)?;
        self.by_path.remove(&entry.path);

        if self.by_hash.get(&entry.hash).map(String::as_str) == Some(id) {
            // Re-target to a surviving entry with identical content
            let survivor = self
                .by_id
                .values()
                .filter(|other| other.hash == entry.hash)
                .min_by(|a, b| a.path.cmp(&b.path))
                .map(|other| other.id.clone());
            match survivor {
                Some(other_id) => {
                    self.by_hash.insert(entry.hash.clone(), other_id);
                }
                None => {
                    self.by_hash.remove(&entry.hash);
                }
            }
        }

        Some(entry)
    }

    /// Pick an id that is free in `by_id`.
    fn unique_id(&self, entry: &LoadedEntry) -> String {
        if !self.by_id.contains_key(&entry.id) {
            return entry.id.clone();
        }

        let by_folder = format!("{}_{}", entry.id, sanitize_for_id(&entry.folder_name()));
        if !self.by_id.contains_key(&by_folder) {
            return by_folder;
        }

        let by_path = format!(
            "{}_{}",
            entry.id,
            sanitize_for_id(&entry.path.display().to_string())
        );
        if !self.by_id.contains_key(&by_path) {
            return by_path;
        }

        (2..)
            .map(|n| format!("{by_path}_{n}"))
            .find(|candidate| !self.by_id.contains_key(candidate))
            .unwrap_or(by_path)
    }
}

/// Thread-safe level index shared by the refresh workers and the query API.
#[derive(Debug, Default)]
pub struct LevelIndex {
    inner: RwLock<IndexInner>,
}

impl LevelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a loaded entry and return the shared handle stored in the index.
    ///
    /// A previous entry at the same path is replaced. When another location
    /// already holds the entry's id (identical content), the new entry gets a
    /// location-qualified id instead so both remain addressable.
    pub fn insert(&self, mut entry: LoadedEntry) -> Arc<LoadedEntry> {
        let mut inner = self.inner.write();

        if let Some(previous) = inner.by_path.get(&entry.path).cloned() {
            inner.remove_id(&previous);
        }

        let id = inner.unique_id(&entry);
        if id != entry.id {
            crate::debug_event!(
                "index",
                "disambiguate",
                "{} already indexed elsewhere, using {id} for {}",
                entry.id,
                entry.path.display()
            );
            entry.id = id;
        }

        let entry = Arc::new(entry);
        inner
            .by_hash
            .insert(entry.hash.clone(), entry.id.clone());
        inner.by_path.insert(entry.path.clone(), entry.id.clone());
        inner.by_id.insert(entry.id.clone(), Arc::clone(&entry));
        entry
    }

    /// Remove by id. Absent ids are a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<LoadedEntry>> {
        self.inner.write().remove_id(id)
    }

    /// Remove the entry stored for a level directory.
    pub fn remove_path(&self, path: &Path) -> Option<Arc<LoadedEntry>> {
        let mut inner = self.inner.write();
        let id = inner.by_path.get(path).cloned()?;
        inner.remove_id(&id)
    }

    /// Keep only entries for which `keep` returns true; returns the removed ones.
    pub fn retain<F>(&self, mut keep: F) -> Vec<Arc<LoadedEntry>>
    where
        F: FnMut(&LoadedEntry) -> bool,
    {
        let mut inner = self.inner.write();
        let doomed: Vec<String> = inner
            .by_id
            .values()
            .filter(|entry| !keep(entry.as_ref()))
            .map(|entry| entry.id.clone())
            .collect();

        let mut removed: Vec<_> = doomed
            .iter()
            .filter_map(|id| inner.remove_id(id))
            .collect();
        removed.sort_by(|a, b| a.path.cmp(&b.path));
        removed
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<LoadedEntry>> {
        self.inner.read().by_id.get(id).cloned()
    }

    pub fn get_by_hash(&self, hash: &str) -> Option<Arc<LoadedEntry>> {
        let inner = self.inner.read();
        inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.by_id.get(id))
            .cloned()
    }

    pub fn get_by_path(&self, path: &Path) -> Option<Arc<LoadedEntry>> {
        let inner = self.inner.read();
        inner
            .by_path
            .get(path)
            .and_then(|id| inner.by_id.get(id))
            .cloned()
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.inner.read().by_path.contains_key(path)
    }

    /// First entry in path order matching `predicate`.
    pub fn find<F>(&self, predicate: F) -> Option<Arc<LoadedEntry>>
    where
        F: Fn(&LoadedEntry) -> bool,
    {
        self.snapshot()
            .into_iter()
            .find(|entry| predicate(entry.as_ref()))
    }

    /// All entries, sorted by path.
    pub fn snapshot(&self) -> Vec<Arc<LoadedEntry>> {
        let mut entries: Vec<_> = self.inner.read().by_id.values().cloned().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }

    /// Verify that every secondary row resolves to a matching entry.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let inner = self.inner.read();
        for (hash, id) in &inner.by_hash {
            let entry = inner.by_id.get(id).expect("by_hash points at a live id");
            assert_eq!(&entry.hash, hash);
        }
        for (path, id) in &inner.by_path {
            let entry = inner.by_id.get(id).expect("by_path points at a live id");
            assert_eq!(&entry.path, path);
        }
        for (id, entry) in &inner.by_id {
            assert_eq!(&entry.id, id);
            assert_eq!(inner.by_path.get(&entry.path), Some(id));
            assert!(inner.by_hash.contains_key(&entry.hash));
        }
    }
}
