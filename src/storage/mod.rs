pub mod level_index;

pub use level_index::LevelIndex;
