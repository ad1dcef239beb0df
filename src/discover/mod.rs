//! Document discovery: find configuration sources under a directory.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use once_cell::sync::Lazy;
use walkdir::WalkDir;

use crate::errors::DiscoveryError;

/// Directory name the archival step moves consumed sources into.
pub const ARCHIVE_DIR: &str = "imported";

/// Version-control metadata directories are never descended into.
static VCS_DIRS: Lazy<Vec<&'static str>> = Lazy::new(|| vec![".git", ".hg", ".svn", ".jj"]);

#[derive(Debug, Clone, Default)]
pub struct DiscoveryStats {
    pub files_seen: usize,
    pub files_matched: usize,
    pub dirs_skipped: usize,
}

/// Scans a source directory for documents matching a glob name pattern.
///
/// Matches are ordered lexicographically by path so repeated runs fold
/// sources in the same order and merges stay reproducible.
pub struct DocumentDiscovery {
    source_dir: PathBuf,
    name_pattern: String,
    follow_symlinks: bool,
    exclude_paths: Vec<PathBuf>,
    stats: DiscoveryStats,
}

impl DocumentDiscovery {
    pub fn new(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            name_pattern: crate::settings::DEFAULT_PATTERN.to_string(),
            follow_symlinks: false,
            exclude_paths: Vec::new(),
            stats: DiscoveryStats::default(),
        }
    }

    /// Glob matched against file names (e.g. `*config`, `*.yaml`).
    pub fn name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = pattern.into();
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Paths never reported as sources, regardless of pattern; a directory
    /// here is not descended into. The caller excludes the active
    /// configuration so a re-run cannot fold the merged file into itself
    /// and later archive it, and excludes the backup directory so wide
    /// patterns cannot re-discover snapshots.
    pub fn exclude_path(mut self, path: PathBuf) -> Self {
        self.exclude_paths.push(path);
        self
    }

    fn skip_dir(name: &str) -> bool {
        VCS_DIRS.contains(&name) || name == ARCHIVE_DIR
    }

    /// Run the scan. An empty match set is not an error.
    pub fn discover(&mut self) -> Result<Vec<PathBuf>, DiscoveryError> {
        self.stats = DiscoveryStats::default();

        if !self.source_dir.exists() {
            return Err(DiscoveryError::Missing(self.source_dir.clone()));
        }
        if !self.source_dir.is_dir() {
            return Err(DiscoveryError::NotADirectory(self.source_dir.clone()));
        }
        // Surface unreadable directories as DiscoveryError instead of the
        // silent skip walkdir would otherwise do at the root.
        std::fs::read_dir(&self.source_dir).map_err(|e| DiscoveryError::Unreadable {
            path: self.source_dir.clone(),
            source: e,
        })?;

        let matcher: GlobMatcher = Glob::new(&self.name_pattern)
            .map_err(|e| DiscoveryError::BadPattern {
                pattern: self.name_pattern.clone(),
                source: e,
            })?
            .compile_matcher();

        let excludes = self.exclude_paths.clone();
        let mut dirs_skipped = 0usize;
        let walker = WalkDir::new(&self.source_dir)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| {
                if entry.file_type().is_dir() && entry.depth() > 0 {
                    if excludes.iter().any(|p| p == entry.path()) {
                        dirs_skipped += 1;
                        return false;
                    }
                    if let Some(name) = entry.file_name().to_str() {
                        if Self::skip_dir(name) {
                            dirs_skipped += 1;
                            return false;
                        }
                    }
                }
                true
            });

        let mut matched: Vec<PathBuf> = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if entry.file_type().is_dir() {
                continue;
            }
            self.stats.files_seen += 1;

            let file_name = match entry.file_name().to_str() {
                Some(n) => n,
                None => continue,
            };
            if !matcher.is_match(file_name) {
                continue;
            }
            if self.exclude_paths.iter().any(|p| p == entry.path()) {
                continue;
            }
            matched.push(entry.path().to_path_buf());
        }
        self.stats.dirs_skipped = dirs_skipped;
        self.stats.files_matched = matched.len();

        matched.sort();
        Ok(matched)
    }

    pub fn stats(&self) -> &DiscoveryStats {
        &self.stats
    }
}
