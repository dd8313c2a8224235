//! Deleting a level from disk and from the index.

use std::path::Path;
use std::sync::Arc;

use crate::error::{LoaderError, LoaderResult};
use crate::indexing::context::LoaderContext;
use crate::level::LoadedEntry;
use crate::notifications::LoaderEvent;

#[derive(Debug, Clone)]
pub struct DeletionHandler {
    ctx: Arc<LoaderContext>,
}

impl DeletionHandler {
    pub fn new(ctx: Arc<LoaderContext>) -> Self {
        Self { ctx }
    }

    /// Delete the level stored at `path`.
    ///
    /// Waits for a running refresh batch to settle first. Nothing is touched
    /// when the path is not indexed. When the directory cannot be removed the
    /// index is left as it was.
    pub fn delete_by_path(&self, path: &Path) -> LoaderResult<()> {
        let _guard = self.ctx.lock_control();

        let level = self
            .ctx
            .index
            .get_by_path(path)
            .ok_or_else(|| LoaderError::NotFound(path.display().to_string()))?;

        self.ctx.events.send(LoaderEvent::SongWillBeDeleted {
            level: Arc::clone(&level),
        });

        if level.path.exists() {
            std::fs::remove_dir_all(&level.path).map_err(|source| LoaderError::Io {
                path: level.path.clone(),
                source,
            })?;
        }

        self.ctx.index.remove(&level.id);
        self.ctx.rebuild_packs_locked();

        crate::log_event!("delete", "removed", "{} ({})", level.path.display(), level.id);
        self.ctx.events.send(LoaderEvent::SongDeleted {
            path: level.path.clone(),
        });
        Ok(())
    }

    /// Delete the directory of an already loaded level.
    pub fn delete_by_entry(&self, level: &LoadedEntry) -> LoaderResult<()> {
        self.delete_by_path(&level.path)
    }
}
