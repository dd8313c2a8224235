//! Level packs derived from the index.
//!
//! Packs are rebuilt from an index snapshot after every refresh and deletion,
//! then published by swapping the whole collection.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::level::LoadedEntry;

pub const CUSTOM_LEVEL_PACK_PREFIX_ID: &str = "custom_levelPack_";
pub const CUSTOM_LEVELS_PACK_ID: &str = "custom_levelPack_CustomLevels";
pub const CUSTOM_WIP_LEVELS_PACK_ID: &str = "custom_levelPack_CustomWIPLevels";

#[derive(Debug, Clone, PartialEq)]
pub struct LevelPack {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub levels: Vec<Arc<LoadedEntry>>,
}

impl LevelPack {
    fn new(id: &str, name: &str, short_name: &str, levels: Vec<Arc<LoadedEntry>>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_name: short_name.to_string(),
            levels,
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.levels.iter().any(|level| level.id == id)
    }
}

/// The stable and WIP packs. Both are always present, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelPackCollection {
    pub stable: Arc<LevelPack>,
    pub wip: Arc<LevelPack>,
}

impl LevelPackCollection {
    pub fn empty() -> Self {
        LevelPackComposer::compose(&[])
    }

    pub fn packs(&self) -> [&Arc<LevelPack>; 2] {
        [&self.stable, &self.wip]
    }

    pub fn pack_by_id(&self, id: &str) -> Option<&Arc<LevelPack>> {
        self.packs().into_iter().find(|pack| pack.id == id)
    }
}

impl Default for LevelPackCollection {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds pack collections from index snapshots.
pub struct LevelPackComposer;

impl LevelPackComposer {
    /// Partition by the WIP flag, order by path, and keep one entry per id.
    pub fn compose(entries: &[Arc<LoadedEntry>]) -> LevelPackCollection {
        let mut sorted: Vec<&Arc<LoadedEntry>> = entries.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));

        let mut stable: IndexMap<&str, Arc<LoadedEntry>> = IndexMap::new();
        let mut wip: IndexMap<&str, Arc<LoadedEntry>> = IndexMap::new();
        for entry in sorted {
            let target = if entry.is_wip { &mut wip } else { &mut stable };
            target
                .entry(entry.id.as_str())
                .or_insert_with(|| Arc::clone(entry));
        }

        LevelPackCollection {
            stable: Arc::new(LevelPack::new(
                CUSTOM_LEVELS_PACK_ID,
                "Custom Levels",
                "Custom",
                stable.into_values().collect(),
            )),
            wip: Arc::new(LevelPack::new(
                CUSTOM_WIP_LEVELS_PACK_ID,
                "WIP Levels",
                "WIP",
                wip.into_values().collect(),
            )),
        }
    }
}

/// Holds the currently published collection.
#[derive(Debug, Default)]
pub struct PackStore {
    current: RwLock<Arc<LevelPackCollection>>,
}

impl PackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<LevelPackCollection> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new collection and return the one it replaced.
    pub fn publish(&self, collection: LevelPackCollection) -> Arc<LevelPackCollection> {
        let next = Arc::new(collection);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::level_index::tests::entry;

    #[test]
    fn test_compose_partitions_and_sorts() {
        let entries = vec![
            Arc::new(entry("/songs/c", "C", false)),
            Arc::new(entry("/wip/b", "B", true)),
            Arc::new(entry("/songs/a", "A", false)),
        ];

        let collection = LevelPackComposer::compose(&entries);
        assert_eq!(collection.stable.id, CUSTOM_LEVELS_PACK_ID);
        assert_eq!(collection.wip.id, CUSTOM_WIP_LEVELS_PACK_ID);

        let stable: Vec<_> = collection.stable.levels.iter().map(|l| l.hash.as_str()).collect();
        assert_eq!(stable, vec!["A", "C"]);
        assert_eq!(collection.wip.len(), 1);
        assert!(collection.wip.contains_id("custom_level_B"));
    }

    #[test]
    fn test_compose_dedups_by_id() {
        let entries = vec![
            Arc::new(entry("/songs/a", "SAME", false)),
            Arc::new(entry("/songs/b", "SAME", false)),
        ];
        let collection = LevelPackComposer::compose(&entries);
        assert_eq!(collection.stable.len(), 1);
        assert_eq!(collection.stable.levels[0].path, std::path::PathBuf::from("/songs/a"));
    }

    #[test]
    fn test_empty_collection_has_both_packs() {
        let collection = LevelPackCollection::empty();
        assert!(collection.stable.is_empty());
        assert!(collection.wip.is_empty());
        assert!(collection.pack_by_id(CUSTOM_WIP_LEVELS_PACK_ID).is_some());
        assert!(collection.pack_by_id("custom_levelPack_Other").is_none());
        assert!(CUSTOM_LEVELS_PACK_ID.starts_with(CUSTOM_LEVEL_PACK_PREFIX_ID));
    }

    #[test]
    fn test_publish_swaps_whole_collection() {
        let store = PackStore::new();
        let before = store.current();
        let entries = vec![Arc::new(entry("/songs/a", "A", false))];

        let previous = store.publish(LevelPackComposer::compose(&entries));
        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(store.current().stable.len(), 1);
        // Old snapshot is untouched
        assert!(before.stable.is_empty());
    }
}
