//! Candidate paths and loaded level entries.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::LevelInfoSaveData;
use crate::registry::{Characteristic, ColorScheme, EnvironmentInfo};

/// Prefix of every custom level id.
pub const CUSTOM_LEVEL_PREFIX_ID: &str = "custom_level_";

/// A directory found while scanning that may hold a level.
///
/// Equality and ordering use `path` only, so a `BTreeSet<CandidatePath>`
/// holds at most one candidate per path and keeps the first inserted tag.
#[derive(Debug, Clone)]
pub struct CandidatePath {
    pub path: PathBuf,
    pub is_wip: bool,
}

impl CandidatePath {
    pub fn new(path: impl Into<PathBuf>, is_wip: bool) -> Self {
        Self {
            path: path.into(),
            is_wip,
        }
    }
}

impl PartialEq for CandidatePath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for CandidatePath {}

impl PartialOrd for CandidatePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidatePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BeatmapDifficulty {
    Easy,
    Normal,
    Hard,
    Expert,
    ExpertPlus,
}

impl FromStr for BeatmapDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Self::Easy),
            "Normal" => Ok(Self::Normal),
            "Hard" => Ok(Self::Hard),
            "Expert" => Ok(Self::Expert),
            "ExpertPlus" => Ok(Self::ExpertPlus),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

impl fmt::Display for BeatmapDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
            Self::ExpertPlus => "ExpertPlus",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBeatmap {
    pub difficulty: BeatmapDifficulty,
    pub rank: i32,
    pub beatmap_filename: String,
    pub note_jump_movement_speed: f32,
    pub note_jump_start_beat_offset: f32,
    /// Index into the level's color schemes
    pub color_scheme_index: Option<usize>,
    /// Index into the level's environments
    pub environment_name_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultySet {
    pub characteristic: Characteristic,
    pub difficulties: Vec<DifficultyBeatmap>,
}

/// A fully loaded custom level.
///
/// Owned by the level index and shared as `Arc<LoadedEntry>`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEntry {
    pub id: String,
    /// Upper-case hex SHA-256 over the descriptor and difficulty files
    pub hash: String,
    pub is_wip: bool,
    pub path: PathBuf,
    pub info: LevelInfoSaveData,

    pub song_name: String,
    pub song_sub_name: String,
    pub song_author_name: String,
    pub level_author_name: String,
    pub beats_per_minute: f32,
    pub preview_start_time: f32,
    pub preview_duration: f32,

    pub environment: EnvironmentInfo,
    pub all_directions_environment: EnvironmentInfo,
    pub environments: Vec<EnvironmentInfo>,
    /// One slot per descriptor color scheme; `None` when it could not be built
    pub color_schemes: Vec<Option<ColorScheme>>,
    pub difficulty_sets: Vec<DifficultySet>,
}

impl LoadedEntry {
    /// Directory name of the level, used for display and id disambiguation.
    pub fn folder_name(&self) -> String {
        folder_name(&self.path)
    }

    pub fn difficulty_count(&self) -> usize {
        self.difficulty_sets
            .iter()
            .map(|set| set.difficulties.len())
            .sum()
    }
}

pub(crate) fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Replace everything outside `[A-Za-z0-9_-]` so the result is id-safe.
pub fn sanitize_for_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
