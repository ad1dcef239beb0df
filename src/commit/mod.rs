//! Commit lifecycle: backup, atomic publish, archival.
//!
//! Ordering contract: nothing mutates the active configuration until the
//! atomic rename, and the rename is the last fallible step of the commit
//! proper. Archival happens after it and can only degrade to warnings.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::discover::ARCHIVE_DIR;
use crate::document;
use crate::domain::{BackupRecord, MergedConfig};
use crate::errors::{ArchivalWarning, CommitError, CommitStage};
use crate::utils::{backup_file_name, disambiguate, short_digest};

/// Suffix appended to archived source files to mark provenance.
pub const IMPORTED_SUFFIX: &str = ".imported";

/// What a successful commit did.
#[derive(Debug)]
pub struct CommitOutcome {
    pub backup: BackupRecord,
    /// (original, archived) pairs for every source that was moved.
    pub archived: Vec<(PathBuf, PathBuf)>,
    pub warnings: Vec<ArchivalWarning>,
}

/// Advisory lock file scoped to one commit against one active path.
/// Created with `create_new`, so a second committer fails instead of
/// racing; removed on drop.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(active_path: &Path) -> Result<Self, CommitError> {
        let path = lock_path(active_path);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(LockGuard { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(CommitError::Locked(path))
            }
            Err(e) => Err(CommitError::Stage { stage: CommitStage::Lock, source: e }),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}

pub fn lock_path(active_path: &Path) -> PathBuf {
    let mut name = active_path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    active_path.with_file_name(name)
}

/// Atomically replace `path` with `content`: temp file in the same
/// directory, then rename. For edits that bypass the full commit
/// lifecycle (no backup, no archival), like context switches.
pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Publish `merged` as the new active configuration.
///
/// 1. Snapshot the current active file into `backup_dir` (skipped when no
///    active file exists yet).
/// 2. Serialize to a temp file next to `active_path`.
/// 3. Atomically rename the temp file onto `active_path`.
/// 4. Move every consumed source into the `imported/` subarea.
///
/// Failure in 1–3 leaves the previous active file byte-identical and no
/// source archived. Failure in 4 is reported as warnings on the outcome.
pub fn commit(
    merged: &MergedConfig,
    active_path: &Path,
    backup_dir: &Path,
    sources: &[PathBuf],
) -> Result<CommitOutcome, CommitError> {
    let _lock = LockGuard::acquire(active_path)?;

    let backup = back_up_active(active_path, backup_dir)?;

    let content = document::render(merged).map_err(CommitError::Render)?;

    let dir = active_path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| CommitError::Stage { stage: CommitStage::Serialize, source: e })?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CommitError::Stage { stage: CommitStage::Serialize, source: e })?;

    tmp.persist(active_path)
        .map_err(|e| CommitError::Stage { stage: CommitStage::Rename, source: e.error })?;
    debug!(active = %active_path.display(), "published merged configuration");

    // Past the rename: the active configuration is already valid, so
    // archival failures must not roll anything back.
    let (archived, warnings) = archive_sources(sources);

    Ok(CommitOutcome { backup, archived, warnings })
}

fn back_up_active(active_path: &Path, backup_dir: &Path) -> Result<BackupRecord, CommitError> {
    let created_at = Utc::now();
    if !active_path.exists() {
        // First run; nothing to snapshot.
        return Ok(BackupRecord {
            original: active_path.to_path_buf(),
            backup: None,
            created_at,
            digest: None,
        });
    }

    fs::create_dir_all(backup_dir)
        .map_err(|e| CommitError::Stage { stage: CommitStage::Backup, source: e })?;

    let active_name = active_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("config");
    let backup_path = backup_dir.join(backup_file_name(active_name, created_at));
    if backup_path.exists() {
        return Err(CommitError::BackupCollision(backup_path));
    }

    let bytes = fs::read(active_path)
        .map_err(|e| CommitError::Stage { stage: CommitStage::Backup, source: e })?;
    fs::copy(active_path, &backup_path)
        .map_err(|e| CommitError::Stage { stage: CommitStage::Backup, source: e })?;
    debug!(backup = %backup_path.display(), "snapshotted active configuration");

    Ok(BackupRecord {
        original: active_path.to_path_buf(),
        backup: Some(backup_path),
        created_at,
        digest: Some(short_digest(&bytes)),
    })
}

/// Move consumed sources into `imported/` beside each source, suffixed with
/// `.imported` and disambiguated on collision. Never overwrites.
fn archive_sources(sources: &[PathBuf]) -> (Vec<(PathBuf, PathBuf)>, Vec<ArchivalWarning>) {
    let mut archived = Vec::new();
    let mut warnings = Vec::new();

    for source in sources {
        match archive_one(source) {
            Ok(target) => archived.push((source.clone(), target)),
            Err(reason) => {
                warn!(source = %source.display(), %reason, "archival failed");
                warnings.push(ArchivalWarning { source: source.display().to_string(), reason });
            }
        }
    }
    (archived, warnings)
}

fn archive_one(source: &Path) -> Result<PathBuf, String> {
    let parent = source.parent().ok_or_else(|| "source has no parent directory".to_string())?;
    let archive_dir = parent.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive_dir).map_err(|e| e.to_string())?;

    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| "source has no file name".to_string())?;
    let candidate = archive_dir.join(format!("{name}{IMPORTED_SUFFIX}"));
    let target = disambiguate(&candidate);
    fs::rename(source, &target).map_err(|e| e.to_string())?;
    Ok(target)
}
