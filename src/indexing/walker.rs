//! File system walker for discovering level directories
//!
//! A level directory is any directory holding one of the configured
//! descriptor files. The walker:
//! - Descends each root recursively, skipping hidden directories
//! - Stops descending once a level directory is found
//! - Logs and skips directories it cannot read
//!
//! Only directory listings and descriptor existence checks happen here;
//! descriptors are parsed later by the loader.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::IndexingConfig;
use crate::level::CandidatePath;

/// Outcome of collecting one group of roots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectReport {
    /// Roots that were walked
    pub scanned_roots: usize,
    /// Roots that were missing or unreadable
    pub unreadable_roots: Vec<PathBuf>,
    /// Candidates found, including ones already in the set
    pub found: usize,
    /// Candidates dropped because their path was already collected
    pub duplicates: usize,
    /// Subdirectories skipped because they could not be read
    pub skipped_entries: usize,
}

impl CollectReport {
    pub fn merge(&mut self, other: CollectReport) {
        self.scanned_roots += other.scanned_roots;
        self.unreadable_roots.extend(other.unreadable_roots);
        self.found += other.found;
        self.duplicates += other.duplicates;
        self.skipped_entries += other.skipped_entries;
    }
}

/// Walks level roots to find candidate level directories
#[derive(Debug, Clone)]
pub struct PathCollector {
    descriptor_files: Vec<String>,
    max_depth: Option<usize>,
    follow_links: bool,
}

impl PathCollector {
    /// Create a new collector with the given indexing settings
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            descriptor_files: config.descriptor_files.clone(),
            max_depth: config.max_depth,
            follow_links: config.follow_links,
        }
    }

    /// Collect candidates under `roots`, tagging each with `is_wip`.
    pub fn collect(&self, roots: &[PathBuf], is_wip: bool) -> BTreeSet<CandidatePath> {
        let mut out = BTreeSet::new();
        self.collect_into(roots, is_wip, &mut out);
        out
    }

    /// Collect into an existing set.
    ///
    /// Paths already in `out` keep their existing tag, so callers control
    /// precedence through the order in which they collect root groups.
    pub fn collect_into(
        &self,
        roots: &[PathBuf],
        is_wip: bool,
        out: &mut BTreeSet<CandidatePath>,
    ) -> CollectReport {
        let mut report = CollectReport::default();

        for root in roots {
            if !root.is_dir() {
                tracing::warn!("[collect] level root {} is not a readable directory", root.display());
                report.unreadable_roots.push(root.clone());
                continue;
            }
            if let Err(e) = std::fs::read_dir(root) {
                tracing::warn!("[collect] cannot list level root {}: {e}", root.display());
                report.unreadable_roots.push(root.clone());
                continue;
            }
            report.scanned_roots += 1;
            self.walk_root(root, is_wip, out, &mut report);
        }

        report
    }

    fn walk_root(
        &self,
        root: &Path,
        is_wip: bool,
        out: &mut BTreeSet<CandidatePath>,
        report: &mut CollectReport,
    ) {
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut entries = walker.into_iter();
        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    tracing::warn!("[collect] skipping {path}: {e}");
                    report.skipped_entries += 1;
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            // Skip hidden directories (names starting with .)
            if entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
            {
                entries.skip_current_dir();
                continue;
            }

            if self.has_descriptor(entry.path()) {
                report.found += 1;
                if !out.insert(CandidatePath::new(entry.path(), is_wip)) {
                    crate::debug_event!(
                        "collect",
                        "duplicate",
                        "{} already collected",
                        entry.path().display()
                    );
                    report.duplicates += 1;
                }
                // Levels do not nest
                entries.skip_current_dir();
            }
        }
    }

    fn has_descriptor(&self, dir: &Path) -> bool {
        self.descriptor_files
            .iter()
            .any(|name| dir.join(name).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_level(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Info.dat"), r#"{"_songName":"x"}"#).unwrap();
        dir
    }

    fn collector() -> PathCollector {
        PathCollector::new(&IndexingConfig::default())
    }

    #[test]
    fn test_collect_level_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let a = make_level(root, "A");
        let nested = make_level(root, "pack/B");
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("stray.dat"), "{}").unwrap();

        let found = collector().collect(&[root.to_path_buf()], false);
        let paths: Vec<_> = found.iter().map(|c| c.path.clone()).collect();

        assert_eq!(paths, vec![a, nested]);
        assert!(found.iter().all(|c| !c.is_wip));
    }

    #[test]
    fn test_lowercase_descriptor_is_recognised() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Lower");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("info.dat"), "{}").unwrap();

        let found = collector().collect(&[temp_dir.path().to_path_buf()], true);
        assert_eq!(found.len(), 1);
        assert!(found.iter().next().unwrap().is_wip);
    }

    #[test]
    fn test_levels_do_not_nest_and_hidden_dirs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let outer = make_level(root, "Outer");
        make_level(&outer, "Inner");
        make_level(root, ".hidden/Level");

        let found = collector().collect(&[root.to_path_buf()], false);
        assert_eq!(found.len(), 1);
        assert_eq!(found.iter().next().unwrap().path, outer);
    }

    #[test]
    fn test_duplicate_roots_yield_one_candidate_per_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        make_level(&root, "A");
        make_level(&root, "B");

        let collector = collector();
        let mut set = BTreeSet::new();
        let stable = collector.collect_into(&[root.clone(), root.clone()], false, &mut set);
        let wip = collector.collect_into(&[root.clone()], true, &mut set);

        assert_eq!(set.len(), 2);
        assert_eq!(stable.found, 4);
        assert_eq!(stable.duplicates, 2);
        assert_eq!(wip.duplicates, 2);
        // First-seen tag wins: stable roots were collected first
        assert!(set.iter().all(|c| !c.is_wip));
    }

    #[test]
    fn test_missing_root_is_reported_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");
        make_level(temp_dir.path(), "A");

        let mut set = BTreeSet::new();
        let report = collector().collect_into(
            &[missing.clone(), temp_dir.path().to_path_buf()],
            false,
            &mut set,
        );

        assert_eq!(report.unreadable_roots, vec![missing]);
        assert_eq!(report.scanned_roots, 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_max_depth_limits_search() {
        let temp_dir = TempDir::new().unwrap();
        make_level(temp_dir.path(), "a/b/c/Deep");
        make_level(temp_dir.path(), "Shallow");

        let config = IndexingConfig {
            max_depth: Some(2),
            ..IndexingConfig::default()
        };
        let found = PathCollector::new(&config).collect(&[temp_dir.path().to_path_buf()], false);
        assert_eq!(found.len(), 1);
    }
}
