//! Error types for loading, refreshing and managing custom levels.
//!
//! Per-level failures (`LoadError`) are absorbed by the refresh workers and only
//! logged. Service-level failures (`LoaderError`) are returned to callers.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a single candidate level directory.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No level descriptor found in {path}")]
    MissingDescriptor { path: PathBuf },

    #[error("Invalid level descriptor {path}: {reason}")]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LoadError {
    /// Path of the file or directory that failed.
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::MissingDescriptor { path }
            | LoadError::InvalidMetadata { path, .. }
            | LoadError::Io { path, .. } => path,
        }
    }
}

/// Structural failure of a whole refresh.
///
/// Cloned into every handle waiting on the same refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("None of the configured level roots could be read: {roots:?}")]
    NoAccessibleRoots { roots: Vec<PathBuf> },

    #[error("Failed to start refresh thread: {reason}")]
    CoordinatorSpawn { reason: String },
}

/// Errors surfaced by the song loader service.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Level not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors from loading or persisting settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration path: {0}")]
    InvalidPath(PathBuf),
}
