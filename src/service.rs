//! Song loader service
//!
//! Single entry point for triggering refreshes, deleting levels, querying the
//! index and packs, and managing the level roots.
//!
//! ## Architecture
//!
//! ```text
//! SongLoader
//!   ├── LoaderContext (Arc) - index, packs, events, progress, settings
//!   ├── RefreshCoordinator - scans and worker batches
//!   ├── DeletionHandler - directory removal
//!   └── Registries (Option<Arc>) - default lookups, when not injected
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let loader = SongLoader::new(Arc::new(SettingsStore::in_memory(settings)));
//! loader.refresh_songs(false).wait()?;
//! let level = loader.get_level_by_hash(&hash);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::SettingsStore;
use crate::error::{LoaderError, LoaderResult};
use crate::indexing::{
    DeletionHandler, LoaderContext, RefreshCoordinator, RefreshHandle, RefreshPhase,
};
use crate::level::LoadedEntry;
use crate::notifications::LoaderEvent;
use crate::packs::{LevelPack, LevelPackCollection};
use crate::registry::{LevelLookups, Registries};

/// Loads, indexes and serves custom levels.
#[derive(Debug)]
pub struct SongLoader {
    ctx: Arc<LoaderContext>,
    coordinator: RefreshCoordinator,
    deletion: DeletionHandler,
    registries: Option<Arc<Registries>>,
}

impl SongLoader {
    /// Loader backed by the built-in registries.
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self::with_registries(settings, Arc::new(Registries::new()))
    }

    pub fn with_registries(settings: Arc<SettingsStore>, registries: Arc<Registries>) -> Self {
        let lookups: Arc<dyn LevelLookups> = registries.clone();
        let mut loader = Self::with_lookups(settings, lookups);
        loader.registries = Some(registries);
        loader
    }

    /// Loader resolving references through caller-provided lookups.
    pub fn with_lookups(settings: Arc<SettingsStore>, lookups: Arc<dyn LevelLookups>) -> Self {
        let ctx = Arc::new(LoaderContext::new(settings, lookups));
        Self {
            coordinator: RefreshCoordinator::new(Arc::clone(&ctx)),
            deletion: DeletionHandler::new(Arc::clone(&ctx)),
            ctx,
            registries: None,
        }
    }

    // Triggers

    /// Start a refresh, or join the one in flight.
    pub fn refresh_songs(&self, full: bool) -> RefreshHandle {
        self.coordinator.refresh(full)
    }

    /// Recompose both packs from the current index.
    pub fn refresh_level_packs(&self) -> Arc<LevelPackCollection> {
        self.ctx.rebuild_packs()
    }

    /// Delete the level stored in `path` from disk and from the index.
    pub fn delete_song(&self, path: impl AsRef<Path>) -> LoaderResult<()> {
        self.deletion.delete_by_path(path.as_ref())
    }

    pub fn delete_level(&self, level: &LoadedEntry) -> LoaderResult<()> {
        self.deletion.delete_by_entry(level)
    }

    // Queries

    pub fn get_level_by_path(&self, path: impl AsRef<Path>) -> Option<Arc<LoadedEntry>> {
        self.ctx.index.get_by_path(path.as_ref())
    }

    /// Lookup by content hash, case-insensitive.
    pub fn get_level_by_hash(&self, hash: &str) -> Option<Arc<LoadedEntry>> {
        self.ctx.index.get_by_hash(&hash.to_ascii_uppercase())
    }

    pub fn get_level_by_level_id(&self, level_id: &str) -> Option<Arc<LoadedEntry>> {
        self.ctx.index.get_by_id(level_id)
    }

    /// First level in path order matching `predicate`.
    pub fn get_level_by_predicate<F>(&self, predicate: F) -> Option<Arc<LoadedEntry>>
    where
        F: Fn(&LoadedEntry) -> bool,
    {
        self.ctx.index.find(predicate)
    }

    /// Every indexed level, sorted by path.
    pub fn all_levels(&self) -> Vec<Arc<LoadedEntry>> {
        self.ctx.index.snapshot()
    }

    pub fn are_songs_refreshing(&self) -> bool {
        self.ctx.progress.is_refreshing()
    }

    pub fn are_songs_loaded(&self) -> bool {
        self.ctx.progress.is_loaded()
    }

    /// Fraction of the running batch processed, 1.0 when idle and loaded.
    pub fn load_progress(&self) -> f32 {
        self.ctx.progress.fraction()
    }

    pub fn refresh_phase(&self) -> RefreshPhase {
        self.ctx.progress.phase()
    }

    /// Handle of the refresh in flight, if any.
    pub fn current_refresh(&self) -> Option<RefreshHandle> {
        self.coordinator.current()
    }

    pub fn custom_level_pack(&self) -> Arc<LevelPack> {
        Arc::clone(&self.ctx.packs.current().stable)
    }

    pub fn custom_wip_level_pack(&self) -> Arc<LevelPack> {
        Arc::clone(&self.ctx.packs.current().wip)
    }

    pub fn custom_level_pack_collection(&self) -> Arc<LevelPackCollection> {
        self.ctx.packs.current()
    }

    // Notifications

    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.ctx.events.subscribe()
    }

    // Configuration

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.ctx.settings
    }

    /// Configured roots for one kind of level, preferred path first.
    pub fn root_level_paths(&self, wip: bool) -> Vec<PathBuf> {
        let (stable, wip_roots) = self.ctx.settings.roots();
        if wip { wip_roots } else { stable }
    }

    pub fn preferred_level_path(&self, wip: bool) -> PathBuf {
        self.ctx.settings.preferred_path(wip)
    }

    /// Add a root. Takes effect on the next refresh.
    pub fn add_level_path(&self, path: impl Into<PathBuf>, wip: bool) -> LoaderResult<bool> {
        Ok(self.ctx.settings.add_level_path(path.into(), wip)?)
    }

    /// Remove a root. Its levels disappear on the next refresh. The preferred
    /// path is always scanned and cannot be removed.
    pub fn remove_level_path(&self, path: impl AsRef<Path>, wip: bool) -> LoaderResult<bool> {
        Ok(self.ctx.settings.remove_level_path(path.as_ref(), wip)?)
    }

    /// Create the preferred stable and WIP directories if missing.
    pub fn ensure_song_directories(&self) -> LoaderResult<()> {
        for wip in [false, true] {
            let path = self.preferred_level_path(wip);
            std::fs::create_dir_all(&path).map_err(|source| LoaderError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    // Collaborators

    /// Built-in registries, unless the loader was given custom lookups.
    pub fn registries(&self) -> Option<&Arc<Registries>> {
        self.registries.as_ref()
    }

    pub fn context(&self) -> &Arc<LoaderContext> {
        &self.ctx
    }
}
