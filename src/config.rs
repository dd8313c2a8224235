//! Configuration module for the song loader.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SONGDEX_` and use double underscores
//! to separate nested levels:
//! - `SONGDEX_INDEXING__PARALLEL_THREADS=8` sets `indexing.parallel_threads`
//! - `SONGDEX_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const CONFIG_DIR: &str = ".songdex";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SONGDEX_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Level root directories
    #[serde(default)]
    pub songs: SongsConfig,

    /// Scanning and loading configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SongsConfig {
    /// Roots scanned for stable levels, in scan order
    #[serde(default)]
    pub root_level_paths: Vec<PathBuf>,

    /// Roots scanned for work-in-progress levels, in scan order
    #[serde(default)]
    pub root_wip_level_paths: Vec<PathBuf>,

    /// Where newly added stable levels are written
    #[serde(default = "default_level_path")]
    pub preferred_level_path: PathBuf,

    /// Where newly added WIP levels are written
    #[serde(default = "default_wip_level_path")]
    pub preferred_wip_level_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Number of worker threads used to load levels
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// File names recognised as level descriptors, first match wins
    #[serde(default = "default_descriptor_files")]
    pub descriptor_files: Vec<String>,

    /// Maximum directory depth below each root (unlimited when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Follow symbolic links while scanning
    #[serde(default = "default_false")]
    pub follow_links: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every target
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `refresh = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_descriptor_files() -> Vec<String> {
    vec!["Info.dat".to_string(), "info.dat".to_string()]
}
fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("songdex")
}
fn default_level_path() -> PathBuf {
    data_root().join("CustomLevels")
}
fn default_wip_level_path() -> PathBuf {
    data_root().join("CustomWIPLevels")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            songs: SongsConfig::default(),
            indexing: IndexingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SongsConfig {
    fn default() -> Self {
        let preferred_level_path = default_level_path();
        let preferred_wip_level_path = default_wip_level_path();
        Self {
            root_level_paths: vec![preferred_level_path.clone()],
            root_wip_level_paths: vec![preferred_wip_level_path.clone()],
            preferred_level_path,
            preferred_wip_level_path,
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            descriptor_files: default_descriptor_files(),
            max_depth: None,
            follow_links: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl SongsConfig {
    /// Roots for one kind of level, with the preferred path always included.
    ///
    /// Paths are made absolute so they match the keys of indexed levels.
    pub fn roots(&self, wip: bool) -> Vec<PathBuf> {
        let (roots, preferred) = if wip {
            (&self.root_wip_level_paths, &self.preferred_wip_level_path)
        } else {
            (&self.root_level_paths, &self.preferred_level_path)
        };
        let mut out: Vec<PathBuf> = Vec::with_capacity(roots.len() + 1);
        for root in std::iter::once(preferred).chain(roots) {
            let root = absolute(root);
            if !out.contains(&root) {
                out.push(root);
            }
        }
        out
    }

    pub fn preferred_path(&self, wip: bool) -> &Path {
        if wip {
            &self.preferred_wip_level_path
        } else {
            &self.preferred_level_path
        }
    }

    fn roots_mut(&mut self, wip: bool) -> &mut Vec<PathBuf> {
        if wip {
            &mut self.root_wip_level_paths
        } else {
            &mut self.root_level_paths
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Find the settings file by looking for a `.songdex` directory.
    /// Searches from current directory up to root
    pub fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Default location used by `init` when no workspace exists yet.
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Create a default settings file
    pub fn init_config_file(path: &Path, force: bool) -> Result<PathBuf, ConfigError> {
        if !force && path.exists() {
            return Err(ConfigError::InvalidPath(path.to_path_buf()));
        }
        Settings::default().save(path)?;
        Ok(path.to_path_buf())
    }

    /// Add a level root. Returns false if it was already configured.
    pub fn add_level_path(&mut self, path: PathBuf, wip: bool) -> bool {
        let target = absolute(&path);
        let roots = self.songs.roots_mut(wip);
        if roots.iter().any(|root| absolute(root) == target) {
            tracing::info!(
                "Path {} was already in the target collection, not adding again",
                path.display()
            );
            return false;
        }
        roots.push(path);
        true
    }

    /// Remove a level root. Returns false if it was not configured or is the
    /// preferred path, which is always scanned.
    pub fn remove_level_path(&mut self, path: &Path, wip: bool) -> bool {
        let target = absolute(path);
        if absolute(self.songs.preferred_path(wip)) == target {
            tracing::warn!(
                "Path {} is the preferred level path and cannot be removed",
                path.display()
            );
            return false;
        }
        let roots = self.songs.roots_mut(wip);
        let before = roots.len();
        roots.retain(|root| absolute(root) != target);
        if roots.len() == before {
            tracing::info!(
                "Path {} wasn't in the target collection, nothing will happen",
                path.display()
            );
            return false;
        }
        true
    }
}

/// Shared, mutable settings with persistence on change.
///
/// The refresh coordinator reads roots from here at the start of every scan,
/// so added or removed roots take effect on the next refresh.
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<Settings>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Settings persisted to `path` whenever roots change.
    pub fn new(settings: Settings, path: impl Into<PathBuf>) -> Self {
        Self {
            settings: RwLock::new(settings),
            path: Some(path.into()),
        }
    }

    /// Settings that are never written to disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
            path: None,
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn indexing(&self) -> IndexingConfig {
        self.settings.read().indexing.clone()
    }

    /// Stable and WIP roots, in scan order.
    pub fn roots(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let settings = self.settings.read();
        (settings.songs.roots(false), settings.songs.roots(true))
    }

    pub fn preferred_path(&self, wip: bool) -> PathBuf {
        absolute(self.settings.read().songs.preferred_path(wip))
    }

    /// Add a level root. Settings stay unchanged if persisting fails.
    pub fn add_level_path(&self, path: PathBuf, wip: bool) -> Result<bool, ConfigError> {
        self.update(|settings| settings.add_level_path(path, wip))
    }

    /// Remove a level root. Settings stay unchanged if persisting fails.
    pub fn remove_level_path(&self, path: &Path, wip: bool) -> Result<bool, ConfigError> {
        self.update(|settings| settings.remove_level_path(path, wip))
    }

    fn update(&self, change: impl FnOnce(&mut Settings) -> bool) -> Result<bool, ConfigError> {
        let mut settings = self.settings.write();
        let mut next = settings.clone();
        if !change(&mut next) {
            return Ok(false);
        }
        self.persist(&next)?;
        *settings = next;
        Ok(true)
    }

    fn persist(&self, settings: &Settings) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) => settings.save(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.indexing.parallel_threads > 0);
        assert_eq!(settings.indexing.descriptor_files, vec!["Info.dat", "info.dat"]);
        assert_eq!(settings.logging.default, "warn");
        assert!(
            settings
                .songs
                .root_level_paths
                .contains(&settings.songs.preferred_level_path)
        );
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[songs]
root_level_paths = ["/levels/a", "/levels/b"]
root_wip_level_paths = ["/levels/wip"]
preferred_level_path = "/levels/a"
preferred_wip_level_path = "/levels/wip"

[indexing]
parallel_threads = 4
max_depth = 3

[logging.modules]
refresh = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.indexing.parallel_threads, 4);
        assert_eq!(settings.indexing.max_depth, Some(3));
        assert_eq!(
            settings.songs.roots(false),
            vec![PathBuf::from("/levels/a"), PathBuf::from("/levels/b")]
        );
        assert_eq!(settings.songs.roots(true), vec![PathBuf::from("/levels/wip")]);
        assert_eq!(settings.logging.modules["refresh"], "debug");
    }

    #[test]
    fn test_preferred_path_is_always_a_root() {
        let mut songs = SongsConfig::default();
        songs.root_level_paths = vec![PathBuf::from("/other")];
        songs.preferred_level_path = PathBuf::from("/preferred");

        assert_eq!(
            songs.roots(false),
            vec![PathBuf::from("/preferred"), PathBuf::from("/other")]
        );
    }

    #[test]
    fn test_add_and_remove_level_path() {
        let mut settings = Settings::default();
        let extra = PathBuf::from("/extra/levels");

        assert!(settings.add_level_path(extra.clone(), false));
        assert!(!settings.add_level_path(extra.clone(), false));
        assert!(settings.songs.root_level_paths.contains(&extra));
        assert!(!settings.songs.root_wip_level_paths.contains(&extra));

        assert!(settings.remove_level_path(&extra, false));
        assert!(!settings.remove_level_path(&extra, false));
    }

    #[test]
    fn test_store_persists_on_change() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(".songdex").join("settings.toml");
        let store = SettingsStore::new(Settings::default(), &config_path);

        assert!(!config_path.exists());
        assert!(store.add_level_path(PathBuf::from("/wip/extra"), true).unwrap());
        assert!(config_path.exists());

        let reloaded = Settings::load_from(&config_path).unwrap();
        assert!(
            reloaded
                .songs
                .root_wip_level_paths
                .contains(&PathBuf::from("/wip/extra"))
        );

        // No change, no write
        fs::remove_file(&config_path).unwrap();
        assert!(!store.add_level_path(PathBuf::from("/wip/extra"), true).unwrap());
        assert!(!config_path.exists());
    }

    #[test]
    fn test_preferred_path_cannot_be_removed() {
        let temp_dir = TempDir::new().unwrap();
        let preferred = temp_dir.path().join("CustomLevels");
        let mut settings = Settings::default();
        settings.songs.root_level_paths.clear();
        settings.songs.preferred_level_path = preferred.clone();
        let store = SettingsStore::in_memory(settings);

        assert!(store.add_level_path(preferred.clone(), false).unwrap());
        assert!(!store.remove_level_path(&preferred, false).unwrap());
        assert_eq!(store.roots().0, vec![preferred.clone()]);
        assert!(store.snapshot().songs.root_level_paths.contains(&preferred));
    }

    #[test]
    fn test_relative_roots_are_made_absolute() {
        let mut songs = SongsConfig::default();
        songs.preferred_level_path = PathBuf::from("levels");
        songs.root_level_paths = vec![PathBuf::from("levels"), PathBuf::from("more")];

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(songs.roots(false), vec![cwd.join("levels"), cwd.join("more")]);

        let mut settings = Settings::default();
        settings.songs = songs;
        assert!(!settings.add_level_path(cwd.join("more"), false));
        assert!(settings.remove_level_path(&cwd.join("more"), false));
        assert_eq!(settings.songs.root_level_paths, vec![PathBuf::from("levels")]);
    }

    #[test]
    fn test_failed_persist_leaves_settings_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let store = SettingsStore::new(Settings::default(), blocker.join("settings.toml"));
        let before = store.snapshot().songs.root_level_paths;

        let extra = temp_dir.path().join("extra");
        assert!(store.add_level_path(extra.clone(), false).is_err());
        assert_eq!(store.snapshot().songs.root_level_paths, before);
        assert!(!store.roots().0.contains(&extra));
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.indexing.parallel_threads = 2;
        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.indexing.parallel_threads, 2);
    }
}
