//! Level commands (refresh, list, find, delete).
//!
//! The index lives in memory, so every command runs a refresh first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};

use crate::indexing::{RefreshHandle, RefreshSummary};
use crate::level::LoadedEntry;
use crate::service::SongLoader;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

fn wait_with_progress(
    loader: &SongLoader,
    handle: &RefreshHandle,
    show_progress: bool,
) -> anyhow::Result<std::sync::Arc<RefreshSummary>> {
    loop {
        if let Some(result) = handle.wait_timeout(PROGRESS_INTERVAL) {
            return result.context("refresh failed");
        }
        if show_progress {
            eprintln!(
                "  {} {:>3.0}%",
                loader.refresh_phase(),
                loader.load_progress() * 100.0
            );
        }
    }
}

/// Load the index, creating the preferred directories first.
pub fn load(loader: &SongLoader, full: bool, show_progress: bool) -> anyhow::Result<std::sync::Arc<RefreshSummary>> {
    loader.ensure_song_directories()?;
    let handle = loader.refresh_songs(full);
    wait_with_progress(loader, &handle, show_progress)
}

pub fn run_refresh(loader: &SongLoader, full: bool, show_progress: bool) -> anyhow::Result<()> {
    let summary = load(loader, full, show_progress)?;

    println!(
        "Refresh #{} ({})",
        summary.generation,
        if summary.full { "full" } else { "incremental" }
    );
    println!("  Discovered: {}", summary.discovered);
    println!("  Loaded:     {}", summary.loaded);
    println!("  Removed:    {}", summary.removed);
    println!("  Failed:     {}", summary.failed.len());
    for path in &summary.failed {
        println!("    {}", path.display());
    }
    println!("  Total:      {}", summary.levels.len());
    println!("  Time:       {:.2?}", summary.duration);

    let packs = loader.custom_level_pack_collection();
    println!("  Packs:      {} stable, {} WIP", packs.stable.len(), packs.wip.len());
    Ok(())
}

pub fn run_list(loader: &SongLoader, wip: bool) -> anyhow::Result<()> {
    load(loader, false, false)?;
    let pack = if wip {
        loader.custom_wip_level_pack()
    } else {
        loader.custom_level_pack()
    };

    println!("{} ({} levels)", pack.name, pack.len());
    for level in &pack.levels {
        println!("  {}", describe(level));
    }
    Ok(())
}

pub fn run_find(
    loader: &SongLoader,
    id: Option<&str>,
    hash: Option<&str>,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    load(loader, false, false)?;
    let found = match (id, hash, path) {
        (Some(id), _, _) => loader.get_level_by_level_id(id),
        (_, Some(hash), _) => loader.get_level_by_hash(hash),
        (_, _, Some(path)) => loader.get_level_by_path(absolute(path)),
        _ => bail!("one of --id, --hash or --path is required"),
    };

    let Some(level) = found else {
        bail!("level not found");
    };

    println!("{}", describe(&level));
    println!("  id:       {}", level.id);
    println!("  hash:     {}", level.hash);
    println!("  path:     {}", level.path.display());
    println!("  wip:      {}", level.is_wip);
    println!("  bpm:      {}", level.beats_per_minute);
    println!("  env:      {}", level.environment.serialized_name);
    for set in &level.difficulty_sets {
        let names: Vec<String> = set.difficulties.iter().map(|d| d.difficulty.to_string()).collect();
        println!("  {}: {}", set.characteristic.serialized_name, names.join(", "));
    }
    Ok(())
}

pub fn run_delete(loader: &SongLoader, path: &Path) -> anyhow::Result<()> {
    load(loader, false, false)?;
    let path = absolute(path);
    loader
        .delete_song(&path)
        .with_context(|| format!("deleting {}", path.display()))?;
    println!("Deleted {}", path.display());
    Ok(())
}

fn describe(level: &LoadedEntry) -> String {
    let mut title = level.song_name.clone();
    if !level.song_sub_name.is_empty() {
        title.push(' ');
        title.push_str(&level.song_sub_name);
    }
    format!(
        "{title} - {} [{}] ({} difficulties)",
        level.song_author_name,
        level.level_author_name,
        level.difficulty_count()
    )
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
