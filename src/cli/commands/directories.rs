//! Level root management commands (add-path, remove-path, list-paths).

use std::path::{Path, PathBuf};

use crate::config::SettingsStore;

fn kind(wip: bool) -> &'static str {
    if wip { "WIP" } else { "stable" }
}

/// Add a level root, persisting the settings file on change.
pub fn run_add_path(store: &SettingsStore, path: &Path, wip: bool) -> anyhow::Result<()> {
    let path = absolute(path);
    if !path.is_dir() {
        tracing::warn!("[config] {} does not exist yet", path.display());
    }
    if store.add_level_path(path.clone(), wip)? {
        println!("Added {} root: {}", kind(wip), path.display());
    } else {
        println!("{} is already a {} root", path.display(), kind(wip));
    }
    Ok(())
}

/// Remove a level root, persisting the settings file on change.
pub fn run_remove_path(store: &SettingsStore, path: &Path, wip: bool) -> anyhow::Result<()> {
    let path = absolute(path);
    if store.remove_level_path(&path, wip)? {
        println!("Removed {} root: {}", kind(wip), path.display());
    } else if path == store.preferred_path(wip) {
        println!(
            "{} is the preferred {} path and is always scanned",
            path.display(),
            kind(wip)
        );
    } else {
        println!("{} is not a {} root", path.display(), kind(wip));
    }
    Ok(())
}

/// Print every configured root, marking the preferred ones.
pub fn run_list_paths(store: &SettingsStore) {
    let (stable, wip) = store.roots();
    for (is_wip, roots) in [(false, stable), (true, wip)] {
        let preferred = store.preferred_path(is_wip);
        println!("{} roots:", kind(is_wip));
        for root in roots {
            let marker = if root == preferred { " (preferred)" } else { "" };
            let missing = if root.is_dir() { "" } else { " [missing]" };
            println!("  {}{marker}{missing}", root.display());
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
