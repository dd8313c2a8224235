//! Metadata loader - one candidate directory to one `LoadedEntry`
//!
//! Reads and parses the level descriptor, hashes the descriptor together with
//! its difficulty files, and resolves environment, characteristic and color
//! scheme references through the injected lookups.
//!
//! `load` touches no shared mutable state, so any number of workers may call
//! it concurrently for disjoint paths.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::config::IndexingConfig;
use crate::error::LoadError;
use crate::level::{
    BeatmapDifficulty, CUSTOM_LEVEL_PREFIX_ID, CandidatePath, DifficultyBeatmap,
    DifficultyBeatmapSetSaveData, DifficultySet, LevelInfoSaveData, LoadedEntry, folder_name,
    sanitize_for_id,
};
use crate::registry::{Characteristic, EnvironmentInfo, LevelLookups};

/// Content hash of a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash {
    /// Upper-case hex SHA-256
    pub hex: String,
    /// False when a referenced difficulty file could not be read
    pub complete: bool,
}

impl ContentHash {
    /// Hash the descriptor bytes followed by each referenced difficulty file.
    ///
    /// Difficulty files are deduplicated and fed in file-name order, so the
    /// digest does not depend on the order they are listed in the descriptor.
    pub fn compute(descriptor: &[u8], level_dir: &Path, info: &LevelInfoSaveData) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(descriptor);

        let files: BTreeSet<&str> = info.beatmap_filenames().collect();
        let mut complete = true;
        for name in files {
            let read = difficulty_file(level_dir, name).and_then(|path| fs::read(&path));
            match read {
                Ok(bytes) => hasher.update(&bytes),
                Err(e) => {
                    tracing::warn!(
                        "[loader] cannot read difficulty file '{name}' in {}: {e}",
                        level_dir.display()
                    );
                    complete = false;
                }
            }
        }

        Self {
            hex: to_upper_hex(&hasher.finalize()),
            complete,
        }
    }
}

/// Resolve a difficulty file name against its level directory.
///
/// Only plain relative names that stay inside `level_dir` (symlinks included)
/// and point at a regular file are accepted.
fn difficulty_file(level_dir: &Path, name: &str) -> io::Result<PathBuf> {
    let relative = Path::new(name);
    let plain = !name.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !plain {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "file name escapes the level directory",
        ));
    }

    let path = level_dir.join(relative).canonicalize()?;
    if !path.starts_with(level_dir.canonicalize()?) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "file resolves outside the level directory",
        ));
    }
    if !fs::metadata(&path)?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    Ok(path)
}

fn to_upper_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

/// Loads single level directories.
#[derive(Clone)]
pub struct MetadataLoader {
    lookups: Arc<dyn LevelLookups>,
    descriptor_files: Vec<String>,
}

impl std::fmt::Debug for MetadataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataLoader")
            .field("descriptor_files", &self.descriptor_files)
            .finish_non_exhaustive()
    }
}

impl MetadataLoader {
    pub fn new(lookups: Arc<dyn LevelLookups>, config: &IndexingConfig) -> Self {
        Self {
            lookups,
            descriptor_files: config.descriptor_files.clone(),
        }
    }

    /// Load one candidate.
    pub fn load(&self, candidate: &CandidatePath) -> Result<LoadedEntry, LoadError> {
        let level_dir = &candidate.path;
        let descriptor_path = self.find_descriptor(level_dir)?;

        let bytes = fs::read(&descriptor_path).map_err(|source| LoadError::Io {
            path: descriptor_path.clone(),
            source,
        })?;
        let info: LevelInfoSaveData =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::InvalidMetadata {
                path: descriptor_path.clone(),
                reason: e.to_string(),
            })?;

        let hash = ContentHash::compute(&bytes, level_dir, &info);
        let id = if hash.complete {
            format!("{CUSTOM_LEVEL_PREFIX_ID}{}", hash.hex)
        } else {
            format!(
                "{CUSTOM_LEVEL_PREFIX_ID}{}",
                sanitize_for_id(&folder_name(level_dir))
            )
        };

        Ok(self.build_entry(id, hash.hex, candidate, info))
    }

    fn find_descriptor(&self, level_dir: &Path) -> Result<PathBuf, LoadError> {
        self.descriptor_files
            .iter()
            .map(|name| level_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| LoadError::MissingDescriptor {
                path: level_dir.to_path_buf(),
            })
    }

    fn build_entry(
        &self,
        id: String,
        hash: String,
        candidate: &CandidatePath,
        info: LevelInfoSaveData,
    ) -> LoadedEntry {
        let path = &candidate.path;
        let environment = self.environment(&info.environment_name, false, path);
        let all_directions_environment =
            self.environment(&info.all_directions_environment_name, true, path);
        let environments = info
            .environment_names
            .iter()
            .map(|name| self.environment(name, false, path))
            .collect();
        let color_schemes = info
            .color_schemes
            .iter()
            .enumerate()
            .map(|(idx, save_data)| {
                let scheme = self.lookups.color_scheme(save_data);
                if scheme.is_none() {
                    tracing::warn!(
                        "[loader] unresolved color scheme #{idx} in {}, using environment colors",
                        path.display()
                    );
                }
                scheme
            })
            .collect();
        let difficulty_sets = info
            .difficulty_beatmap_sets
            .iter()
            .map(|set| self.difficulty_set(set, path))
            .collect();

        LoadedEntry {
            id,
            hash,
            is_wip: candidate.is_wip,
            path: path.clone(),
            song_name: info.song_name.clone(),
            song_sub_name: info.song_sub_name.clone(),
            song_author_name: info.song_author_name.clone(),
            level_author_name: info.level_author_name.clone(),
            beats_per_minute: info.beats_per_minute,
            preview_start_time: info.preview_start_time,
            preview_duration: info.preview_duration,
            environment,
            all_directions_environment,
            environments,
            color_schemes,
            difficulty_sets,
            info,
        }
    }

    fn environment(&self, name: &str, all_directions: bool, level: &Path) -> EnvironmentInfo {
        if name.is_empty() {
            return self.lookups.default_environment(all_directions);
        }
        self.lookups.environment(name).unwrap_or_else(|| {
            tracing::warn!(
                "[loader] unresolved environment '{name}' in {}, using default",
                level.display()
            );
            self.lookups.default_environment(all_directions)
        })
    }

    fn characteristic(&self, name: &str, level: &Path) -> Characteristic {
        self.lookups.characteristic(name).unwrap_or_else(|| {
            tracing::warn!(
                "[loader] unresolved characteristic '{name}' in {}",
                level.display()
            );
            Characteristic::missing()
        })
    }

    fn difficulty_set(&self, set: &DifficultyBeatmapSetSaveData, level: &Path) -> DifficultySet {
        let characteristic = self.characteristic(&set.beatmap_characteristic_name, level);
        let difficulties = set
            .difficulty_beatmaps
            .iter()
            .filter_map(|beatmap| match beatmap.difficulty.parse::<BeatmapDifficulty>() {
                Ok(difficulty) => Some(DifficultyBeatmap {
                    difficulty,
                    rank: beatmap.difficulty_rank,
                    beatmap_filename: beatmap.beatmap_filename.clone(),
                    note_jump_movement_speed: beatmap.note_jump_movement_speed,
                    note_jump_start_beat_offset: beatmap.note_jump_start_beat_offset,
                    color_scheme_index: beatmap.beatmap_color_scheme_idx,
                    environment_name_index: beatmap.environment_name_idx,
                }),
                Err(reason) => {
                    tracing::warn!("[loader] skipping difficulty in {}: {reason}", level.display());
                    None
                }
            })
            .collect();

        DifficultySet {
            characteristic,
            difficulties,
        }
    }
}
