//! Notification broadcasting for loader and registry events.
//!
//! Subscribers register by calling `subscribe()` and receive every event sent
//! afterwards. Delivery is fire-and-forget and unordered among subscribers;
//! sending never blocks the publishing thread.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::level::LoadedEntry;
use crate::packs::LevelPackCollection;

const DEFAULT_CAPACITY: usize = 64;

/// Events published by the song loader.
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// A refresh is about to scan the level roots.
    SongsWillRefresh,
    /// A refresh settled. Carries every level in the index.
    SongsLoaded { levels: Arc<[Arc<LoadedEntry>]> },
    /// Packs are about to be rebuilt. Carries the collection being replaced.
    LevelPacksWillRefresh {
        previous: Arc<LevelPackCollection>,
    },
    /// Packs were rebuilt and published.
    LevelPacksRefreshed {
        collection: Arc<LevelPackCollection>,
    },
    /// A level is about to be removed from disk and from the index.
    SongWillBeDeleted { level: Arc<LoadedEntry> },
    /// A level was removed.
    SongDeleted { path: PathBuf },
}

/// Broadcasts events of one kind to any number of subscribers.
#[derive(Clone)]
pub struct Broadcaster<E: Clone> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone + Debug> Broadcaster<E> {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send an event to all subscribers
    pub fn send(&self, event: E) {
        match self.sender.send(event) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "to {count} subscribers");
            }
            Err(broadcast::error::SendError(event)) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    /// Subscribe to receive events sent after this call
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone + Debug> Default for Broadcaster<E> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<E: Clone> Debug for Broadcaster<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// Broadcaster for `LoaderEvent`s.
pub type LoaderEvents = Broadcaster<LoaderEvent>;
