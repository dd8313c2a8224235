//! Level data model: descriptor save data, scan candidates and loaded entries.

mod entry;
mod save_data;

pub use entry::{
    BeatmapDifficulty, CUSTOM_LEVEL_PREFIX_ID, CandidatePath, DifficultyBeatmap, DifficultySet,
    LoadedEntry, sanitize_for_id,
};
pub(crate) use entry::folder_name;
pub use save_data::{
    ColorSaveData, ColorSchemeBody, ColorSchemeSaveData, DifficultyBeatmapSaveData,
    DifficultyBeatmapSetSaveData, LevelInfoSaveData,
};
