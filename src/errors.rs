//! Failure taxonomy for the discover → merge → commit pipeline.
//!
//! Errors raised before the atomic rename in [`crate::commit`] leave no
//! observable state change; everything after it is reported as a warning
//! value rather than an error, because the active configuration is already
//! valid at that point.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Source directory problems surfaced by [`crate::discover`].
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("source directory does not exist: {0}")]
    Missing(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("source directory is not readable: {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid name pattern '{pattern}'")]
    BadPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Structural problems in a single configuration document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML in {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no recognizable configuration structure in {path}")]
    UnknownFormat { path: PathBuf },

    #[error("{section} entry #{index} in {path} has no name")]
    UnnamedEntry {
        path: PathBuf,
        section: &'static str,
        index: usize,
    },

    #[error("malformed profile line {line} in {path}")]
    ProfileLine { path: PathBuf, line: usize },

    #[error("merged configuration mixes kubeconfig and cloud-profile entries")]
    MixedKinds,

    #[error("failed to serialize merged configuration")]
    Serialize(#[source] serde_yaml::Error),
}

/// A parse failure wrapped with the identity of the offending source.
///
/// Any one bad source aborts the whole merge; a partially merged credential
/// set could silently drop access to a cluster or profile.
#[derive(Debug, Error)]
#[error("cannot merge {source_id}")]
pub struct MergeError {
    pub source_id: String,
    #[source]
    pub cause: ParseError,
}

/// The step of [`crate::commit`] that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitStage {
    Lock,
    Backup,
    Serialize,
    Rename,
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitStage::Lock => "lock",
            CommitStage::Backup => "backup",
            CommitStage::Serialize => "serialize",
            CommitStage::Rename => "rename",
        };
        f.write_str(name)
    }
}

/// Commit failures. All of these abort before the active configuration is
/// mutated; the pre-merge file stays byte-identical.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("another commit holds the lock file {0}")]
    Locked(PathBuf),

    #[error("backup target already exists: {0}")]
    BackupCollision(PathBuf),

    #[error("commit stage '{stage}' failed")]
    Stage {
        stage: CommitStage,
        #[source]
        source: io::Error,
    },

    #[error("serializing merged configuration failed")]
    Render(#[source] ParseError),
}

impl CommitError {
    /// The pipeline stage this error maps to.
    pub fn stage(&self) -> CommitStage {
        match self {
            CommitError::Locked(_) => CommitStage::Lock,
            CommitError::BackupCollision(_) => CommitStage::Backup,
            CommitError::Stage { stage, .. } => *stage,
            CommitError::Render(_) => CommitStage::Serialize,
        }
    }
}

/// Account listing problems surfaced by [`crate::reconcile`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to read account listing {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid account listing {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Non-fatal: a consumed source could not be moved into the archive after
/// the active configuration was already published.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivalWarning {
    pub source: String,
    pub reason: String,
}

impl fmt::Display for ArchivalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not archive {}: {}", self.source, self.reason)
    }
}

/// Non-fatal: an account was skipped because the caller could not enumerate
/// its sub-resources.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSkipWarning {
    pub account_id: String,
    pub reason: String,
}

impl fmt::Display for PermissionSkipWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped account {}: {}", self.account_id, self.reason)
    }
}
