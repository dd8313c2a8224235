//! State shared by the refresh coordinator, the deletion handler and the
//! query API.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::SettingsStore;
use crate::indexing::progress::RefreshProgress;
use crate::notifications::{LoaderEvent, LoaderEvents};
use crate::packs::{LevelPackCollection, LevelPackComposer, PackStore};
use crate::registry::LevelLookups;
use crate::storage::LevelIndex;

pub struct LoaderContext {
    pub settings: Arc<SettingsStore>,
    pub index: LevelIndex,
    pub packs: PackStore,
    pub events: LoaderEvents,
    pub lookups: Arc<dyn LevelLookups>,
    pub progress: RefreshProgress,
    /// Serialises refresh batches, pack rebuilds and deletions.
    control: Mutex<()>,
}

impl std::fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("levels", &self.index.len())
            .field("phase", &self.progress.phase())
            .field("subscribers", &self.events.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl LoaderContext {
    pub fn new(settings: Arc<SettingsStore>, lookups: Arc<dyn LevelLookups>) -> Self {
        Self {
            settings,
            index: LevelIndex::new(),
            packs: PackStore::new(),
            events: LoaderEvents::default(),
            lookups,
            progress: RefreshProgress::new(),
            control: Mutex::new(()),
        }
    }

    /// Exclusive access for a batch, a pack rebuild or a deletion.
    pub(crate) fn lock_control(&self) -> MutexGuard<'_, ()> {
        self.control.lock()
    }

    /// Recompose packs from the index and publish them.
    ///
    /// Callers must hold the control lock.
    pub(crate) fn rebuild_packs_locked(&self) -> Arc<LevelPackCollection> {
        let previous = self.packs.current();
        self.events
            .send(LoaderEvent::LevelPacksWillRefresh { previous });

        let collection = LevelPackComposer::compose(&self.index.snapshot());
        crate::debug_event!(
            "packs",
            "composed",
            "{} stable, {} wip",
            collection.stable.len(),
            collection.wip.len()
        );
        self.packs.publish(collection);

        let collection = self.packs.current();
        self.events.send(LoaderEvent::LevelPacksRefreshed {
            collection: Arc::clone(&collection),
        });
        collection
    }

    /// Recompose packs, waiting for any running batch or deletion first.
    pub fn rebuild_packs(&self) -> Arc<LevelPackCollection> {
        let _guard = self.lock_control();
        self.rebuild_packs_locked()
    }
}
