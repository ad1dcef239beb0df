//! Loading and serializing configuration documents.
//!
//! Two on-disk shapes are understood, both owned by their external tools:
//! kubeconfig-style YAML (named `clusters` / `contexts` / `users` lists)
//! and cloud CLI profile stanzas (`[profile NAME]` sections). cfgmerge does
//! not invent a format; it only defines a merge strategy over these.

pub mod kubeconfig;
pub mod profile;

use std::fs;
use std::path::Path;

use crate::domain::{ConfigDocument, EntryKind, MergedConfig, SourceId};
use crate::errors::ParseError;
use crate::utils::short_digest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Kubeconfig,
    Profiles,
}

/// Decide which parser a file gets. Extensions win; otherwise the first
/// significant line decides: a section header means profile stanzas,
/// anything else is treated as kubeconfig YAML.
pub fn detect_format(path: &Path, content: &str) -> DocumentFormat {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("yaml") | Some("yml") => return DocumentFormat::Kubeconfig,
        Some("ini") | Some("profiles") => return DocumentFormat::Profiles,
        _ => {}
    }
    let first = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with(';'));
    match first {
        Some(line) if line.starts_with('[') => DocumentFormat::Profiles,
        _ => DocumentFormat::Kubeconfig,
    }
}

/// Load one file into a [`ConfigDocument`]. Structural failures surface as
/// [`ParseError`]; the caller decides whether that aborts a merge.
pub fn load(path: &Path) -> Result<ConfigDocument, ParseError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ParseError::Io { path: path.to_path_buf(), source: e })?;

    let mut doc = match detect_format(path, &content) {
        DocumentFormat::Kubeconfig => kubeconfig::parse(path, &content)?,
        DocumentFormat::Profiles => profile::parse(path, &content)?,
    };
    doc.source = SourceId::from_path(path);
    doc.path = Some(path.to_path_buf());
    doc.digest = short_digest(content.as_bytes());
    Ok(doc)
}

/// Serialize a merged configuration back into its external format.
///
/// A merged configuration that mixes kubeconfig entries with cloud-profile
/// entries has no single on-disk home and is rejected.
pub fn render(merged: &MergedConfig) -> Result<String, ParseError> {
    let has_kube = merged
        .entries
        .keys()
        .any(|(kind, _)| matches!(kind, EntryKind::Cluster | EntryKind::Credential | EntryKind::Context));
    let has_profiles = merged.entries.keys().any(|(kind, _)| *kind == EntryKind::CloudProfile);

    match (has_kube, has_profiles) {
        (true, true) => Err(ParseError::MixedKinds),
        (false, true) => Ok(profile::render(merged)),
        _ => kubeconfig::render(merged),
    }
}
