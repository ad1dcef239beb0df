//! Core data model: configuration documents, entries, and merge results.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_yaml::Value;

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Category of a configuration entry.
///
/// The kubeconfig kinds mirror the named lists of the Kubernetes client
/// config format; `CloudProfile` covers cloud CLI profile stanzas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    Cluster,
    Credential,
    Context,
    CloudProfile,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Cluster => "cluster",
            EntryKind::Credential => "credential",
            EntryKind::Context => "context",
            EntryKind::CloudProfile => "cloud-profile",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unique address of an entry within a document or merged configuration.
pub type EntryKey = (EntryKind, String);

/// One named configuration entry.
///
/// The body is the external tool's payload, carried opaquely: for
/// kubeconfig kinds it is the full list item (including its `name` key) so
/// unknown fields survive a merge round-trip; for cloud profiles it is the
/// stanza's key/value mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub body: Value,
}

impl Entry {
    pub fn key(&self) -> EntryKey {
        (self.kind, self.name.clone())
    }
}

/// Display identity of a document source, used for ordering and reporting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn from_path(path: &Path) -> Self {
        SourceId(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One source file's worth of configuration entries.
///
/// Immutable once loaded for the duration of a merge pass.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub source: SourceId,
    pub path: Option<PathBuf>,
    pub entries: BTreeMap<EntryKey, Entry>,
    /// `current-context` of a kubeconfig document, when present.
    pub preferred_context: Option<String>,
    /// Short content digest of the on-disk bytes this document came from.
    pub digest: String,
}

impl ConfigDocument {
    /// An empty document, used as the fold seed when no active
    /// configuration exists yet.
    pub fn empty(source: SourceId) -> Self {
        ConfigDocument {
            source,
            path: None,
            entries: BTreeMap::new(),
            preferred_context: None,
            digest: String::new(),
        }
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.key(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry counts per kind, in kind order.
    pub fn kind_counts(&self) -> BTreeMap<EntryKind, usize> {
        let mut counts = BTreeMap::new();
        for (kind, _) in self.entries.keys() {
            *counts.entry(*kind).or_insert(0) += 1;
        }
        counts
    }
}

/// The single reconciled configuration produced by folding all documents.
///
/// Owned exclusively by the merge operation; becomes the active
/// configuration only after [`crate::commit`] completes the atomic rename.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub entries: BTreeMap<EntryKey, Entry>,
    pub current_context: Option<String>,
    /// Sources in fold order (active first, then discovery order).
    pub folded: Vec<SourceId>,
}

impl MergedConfig {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, kind: EntryKind, name: &str) -> bool {
        self.entries.contains_key(&(kind, name.to_string()))
    }

    pub fn entries_of(&self, kind: EntryKind) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(move |e| e.kind == kind)
    }
}

/// Where an entry in the merged configuration came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutcome {
    pub kind: EntryKind,
    pub name: String,
    pub winning_source: SourceId,
}

/// A key that more than one document defined. The last folded source wins;
/// the earlier ones are shadowed, in fold order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collision {
    pub kind: EntryKind,
    pub name: String,
    pub winning_source: SourceId,
    pub shadowed_sources: Vec<SourceId>,
}

/// What the merge did, entry by entry. This is the unit an observer or test
/// inspects to verify merge correctness.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub entries: Vec<EntryOutcome>,
    pub shadowed: Vec<Collision>,
    pub documents_folded: usize,
}

impl MergeReport {
    pub fn entries_merged(&self) -> usize {
        self.entries.len()
    }

    pub fn entries_shadowed(&self) -> usize {
        self.shadowed.len()
    }

    pub fn to_report_value(&self) -> serde_json::Value {
        json!({
            "documents_folded": self.documents_folded,
            "entries_merged": self.entries_merged(),
            "entries_shadowed": self.entries_shadowed(),
        })
    }
}

/// Snapshot of the previously active configuration, taken before commit
/// mutates anything. Retained indefinitely under the backup directory.
#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub original: PathBuf,
    /// `None` on a first run, when there was no active file to snapshot.
    pub backup: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    /// Short content digest of the snapshotted bytes.
    pub digest: Option<String>,
}

impl BackupRecord {
    pub fn first_run(&self) -> bool {
        self.backup.is_none()
    }
}
