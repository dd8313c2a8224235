//! Concurrent discovery, hashing and indexing of custom levels.
//!
//! [`SongLoader`] is the entry point: it scans the configured level roots,
//! loads every level folder on a pool of worker threads, keeps a
//! content-addressed [`LevelIndex`] and publishes the stable and WIP level
//! packs once a refresh settles.

pub mod cli;
pub mod config;
pub mod error;
pub mod indexing;
pub mod level;
pub mod logging;
pub mod notifications;
pub mod packs;
pub mod registry;
pub mod service;
pub mod storage;

pub use config::{Settings, SettingsStore};
pub use error::{ConfigError, LoadError, LoaderError, LoaderResult, RefreshError};
pub use indexing::{
    MetadataLoader, PathCollector, RefreshHandle, RefreshPhase, RefreshResult, RefreshSummary,
};
pub use level::{CUSTOM_LEVEL_PREFIX_ID, CandidatePath, LoadedEntry};
pub use notifications::{Broadcaster, LoaderEvent};
pub use packs::{
    CUSTOM_LEVEL_PACK_PREFIX_ID, LevelPack, LevelPackCollection, LevelPackComposer,
};
pub use registry::{LevelLookups, Registries};
pub use service::SongLoader;
pub use storage::LevelIndex;
