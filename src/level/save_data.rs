//! Serde model of the level descriptor (`Info.dat`).
//!
//! Only the fields needed for identity, hashing and the resolved entry are
//! modelled. Unknown keys are ignored, `_customData` is kept opaque.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelInfoSaveData {
    #[serde(rename = "_version", default)]
    pub version: String,
    #[serde(rename = "_songName")]
    pub song_name: String,
    #[serde(rename = "_songSubName", default)]
    pub song_sub_name: String,
    #[serde(rename = "_songAuthorName", default)]
    pub song_author_name: String,
    #[serde(rename = "_levelAuthorName", default)]
    pub level_author_name: String,
    #[serde(rename = "_beatsPerMinute", default)]
    pub beats_per_minute: f32,
    #[serde(rename = "_songTimeOffset", default)]
    pub song_time_offset: f32,
    #[serde(rename = "_shuffle", default)]
    pub shuffle: f32,
    #[serde(rename = "_shufflePeriod", default)]
    pub shuffle_period: f32,
    #[serde(rename = "_previewStartTime", default)]
    pub preview_start_time: f32,
    #[serde(rename = "_previewDuration", default)]
    pub preview_duration: f32,
    #[serde(rename = "_songFilename", default)]
    pub song_filename: String,
    #[serde(rename = "_coverImageFilename", default)]
    pub cover_image_filename: String,
    #[serde(rename = "_environmentName", default)]
    pub environment_name: String,
    #[serde(rename = "_allDirectionsEnvironmentName", default)]
    pub all_directions_environment_name: String,
    #[serde(rename = "_environmentNames", default)]
    pub environment_names: Vec<String>,
    #[serde(rename = "_colorSchemes", default)]
    pub color_schemes: Vec<ColorSchemeSaveData>,
    #[serde(rename = "_difficultyBeatmapSets", default)]
    pub difficulty_beatmap_sets: Vec<DifficultyBeatmapSetSaveData>,
    #[serde(
        rename = "_customData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_data: Option<serde_json::Value>,
}

impl LevelInfoSaveData {
    /// Difficulty files referenced by every set, in listing order.
    pub fn beatmap_filenames(&self) -> impl Iterator<Item = &str> {
        self.difficulty_beatmap_sets
            .iter()
            .flat_map(|set| set.difficulty_beatmaps.iter())
            .map(|beatmap| beatmap.beatmap_filename.as_str())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DifficultyBeatmapSetSaveData {
    #[serde(rename = "_beatmapCharacteristicName")]
    pub beatmap_characteristic_name: String,
    #[serde(rename = "_difficultyBeatmaps", default)]
    pub difficulty_beatmaps: Vec<DifficultyBeatmapSaveData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DifficultyBeatmapSaveData {
    #[serde(rename = "_difficulty")]
    pub difficulty: String,
    #[serde(rename = "_difficultyRank", default)]
    pub difficulty_rank: i32,
    #[serde(rename = "_beatmapFilename", default)]
    pub beatmap_filename: String,
    #[serde(rename = "_noteJumpMovementSpeed", default)]
    pub note_jump_movement_speed: f32,
    #[serde(rename = "_noteJumpStartBeatOffset", default)]
    pub note_jump_start_beat_offset: f32,
    #[serde(rename = "_beatmapColorSchemeIdx", default)]
    pub beatmap_color_scheme_idx: Option<usize>,
    #[serde(rename = "_environmentNameIdx", default)]
    pub environment_name_idx: Option<usize>,
    #[serde(
        rename = "_customData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColorSchemeSaveData {
    #[serde(default)]
    pub use_override: bool,
    #[serde(default)]
    pub color_scheme: Option<ColorSchemeBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColorSchemeBody {
    #[serde(default)]
    pub color_scheme_id: String,
    pub saber_a_color: ColorSaveData,
    pub saber_b_color: ColorSaveData,
    pub environment_color0: ColorSaveData,
    pub environment_color1: ColorSaveData,
    pub obstacles_color: ColorSaveData,
    #[serde(default)]
    pub environment_color0_boost: Option<ColorSaveData>,
    #[serde(default)]
    pub environment_color1_boost: Option<ColorSaveData>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorSaveData {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}
