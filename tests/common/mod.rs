//! Level fixtures shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use songdex::{LoaderEvent, RefreshSummary, Settings, SettingsStore, SongLoader};
use tempfile::TempDir;

pub fn info_json(song_name: &str) -> String {
    format!(
        r#"{{
    "_version": "2.0.0",
    "_songName": "{song_name}",
    "_songAuthorName": "Artist",
    "_levelAuthorName": "Mapper",
    "_beatsPerMinute": 128,
    "_environmentName": "DefaultEnvironment",
    "_difficultyBeatmapSets": [
        {{
            "_beatmapCharacteristicName": "Standard",
            "_difficultyBeatmaps": [
                {{"_difficulty": "Expert", "_difficultyRank": 7, "_beatmapFilename": "Expert.dat"}}
            ]
        }}
    ]
}}"#
    )
}

/// Write a level folder with one difficulty file.
pub fn write_level(root: &Path, folder: &str, song_name: &str) -> PathBuf {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Info.dat"), info_json(song_name)).unwrap();
    fs::write(dir.join("Expert.dat"), format!("notes for {song_name}")).unwrap();
    dir
}

pub struct Fixture {
    pub temp: TempDir,
    pub stable: PathBuf,
    pub wip: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let stable = temp.path().join("CustomLevels");
        let wip = temp.path().join("CustomWIPLevels");
        fs::create_dir_all(&stable).unwrap();
        fs::create_dir_all(&wip).unwrap();
        Self { temp, stable, wip }
    }

    pub fn settings(&self, threads: usize) -> Settings {
        let mut settings = Settings::default();
        settings.songs.preferred_level_path = self.stable.clone();
        settings.songs.preferred_wip_level_path = self.wip.clone();
        settings.songs.root_level_paths.clear();
        settings.songs.root_wip_level_paths.clear();
        settings.indexing.parallel_threads = threads;
        settings
    }

    pub fn store(&self, threads: usize) -> Arc<SettingsStore> {
        Arc::new(SettingsStore::in_memory(self.settings(threads)))
    }

    pub fn loader(&self) -> SongLoader {
        SongLoader::new(self.store(4))
    }

    /// Loader with one worker so levels load in path order.
    pub fn sequential_loader(&self) -> SongLoader {
        SongLoader::new(self.store(1))
    }
}

/// Refresh and wait until `SongsLoaded` has been published, so later
/// subscribers only see events caused by the test itself.
pub fn settle(loader: &SongLoader, full: bool) -> Arc<RefreshSummary> {
    let mut events = loader.subscribe();
    let summary = loader.refresh_songs(full).wait().unwrap();
    loop {
        if let LoaderEvent::SongsLoaded { .. } = events.blocking_recv().unwrap() {
            return summary;
        }
    }
}
