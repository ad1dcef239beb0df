//! Last-write-wins folding of configuration documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document;
use crate::domain::{ConfigDocument, EntryKey, MergeReport, MergedConfig, SourceId};
use crate::errors::MergeError;

/// Fold the active document first, then each source in order, into a new
/// [`MergedConfig`]. A later document's entry overwrites an earlier one
/// with the same `(kind, name)`; every overwrite is recorded as a
/// collision in the report.
pub fn merge_documents(
    active: Option<ConfigDocument>,
    sources: Vec<ConfigDocument>,
) -> (MergedConfig, MergeReport) {
    let mut entries = BTreeMap::new();
    let mut history: BTreeMap<EntryKey, Vec<SourceId>> = BTreeMap::new();
    let mut current_context = None;
    let mut folded = Vec::new();

    let docs = active.into_iter().chain(sources);
    let mut documents_folded = 0usize;
    for doc in docs {
        documents_folded += 1;
        debug!(source = %doc.source, entries = doc.entries.len(), "folding document");
        for (key, entry) in &doc.entries {
            history.entry(key.clone()).or_default().push(doc.source.clone());
            entries.insert(key.clone(), entry.clone());
        }
        if doc.preferred_context.is_some() {
            current_context = doc.preferred_context.clone();
        }
        folded.push(doc.source.clone());
    }

    let mut report = MergeReport { documents_folded, ..MergeReport::default() };
    for ((kind, name), mut sources_seen) in history {
        let Some(winning_source) = sources_seen.pop() else { continue };
        if !sources_seen.is_empty() {
            report.shadowed.push(crate::domain::Collision {
                kind,
                name: name.clone(),
                winning_source: winning_source.clone(),
                shadowed_sources: sources_seen,
            });
        }
        report.entries.push(crate::domain::EntryOutcome { kind, name, winning_source });
    }

    (MergedConfig { entries, current_context, folded }, report)
}

/// Load the active document (when the file exists) and every source path,
/// then fold them. Any structural parse failure aborts the whole merge —
/// no partial result is published.
pub fn load_and_merge(
    active_path: &Path,
    source_paths: &[PathBuf],
) -> Result<(MergedConfig, MergeReport), MergeError> {
    let active = if active_path.exists() {
        Some(document::load(active_path).map_err(|cause| MergeError {
            source_id: active_path.display().to_string(),
            cause,
        })?)
    } else {
        None
    };

    let mut sources = Vec::with_capacity(source_paths.len());
    for path in source_paths {
        let doc = document::load(path)
            .map_err(|cause| MergeError { source_id: path.display().to_string(), cause })?;
        sources.push(doc);
    }

    Ok(merge_documents(active, sources))
}
