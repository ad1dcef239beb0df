//! Kubeconfig-style YAML documents.
//!
//! Each entry body is the full list item (name included), so fields this
//! tool knows nothing about survive a merge round-trip untouched.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::domain::{ConfigDocument, Entry, EntryKind, MergedConfig, SourceId};
use crate::errors::ParseError;

const SECTIONS: [(&str, EntryKind); 3] = [
    ("clusters", EntryKind::Cluster),
    ("contexts", EntryKind::Context),
    ("users", EntryKind::Credential),
];

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

pub fn parse(path: &Path, content: &str) -> Result<ConfigDocument, ParseError> {
    let raw: Value = serde_yaml::from_str(content)
        .map_err(|e| ParseError::Yaml { path: path.to_path_buf(), source: e })?;

    // An empty file deserializes to null; treat it as a document with no
    // entries rather than a structural failure.
    let mapping = match raw {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        _ => return Err(ParseError::UnknownFormat { path: path.to_path_buf() }),
    };

    let mut doc = ConfigDocument::empty(SourceId::from_path(path));
    for (section, kind) in SECTIONS {
        let Some(value) = mapping.get(&key(section)) else { continue };
        let Value::Sequence(items) = value else {
            // `clusters: null` appears in freshly-initialized kubeconfigs.
            if value.is_null() {
                continue;
            }
            return Err(ParseError::UnknownFormat { path: path.to_path_buf() });
        };
        for (index, item) in items.iter().enumerate() {
            let name = item.get("name").and_then(Value::as_str).ok_or_else(|| {
                ParseError::UnnamedEntry { path: path.to_path_buf(), section, index }
            })?;
            doc.insert(Entry { kind, name: name.to_string(), body: item.clone() });
        }
    }

    doc.preferred_context = mapping
        .get(&key("current-context"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(doc)
}

/// Serialize in kubectl's field order. Entries come out of the BTreeMap
/// sorted by name, which keeps repeated merges byte-identical.
pub fn render(merged: &MergedConfig) -> Result<String, ParseError> {
    let mut root = Mapping::new();
    root.insert(key("apiVersion"), key("v1"));

    for (section, kind) in SECTIONS {
        let items: Vec<Value> = merged.entries_of(kind).map(|e| e.body.clone()).collect();
        root.insert(key(section), Value::Sequence(items));
    }

    // A preferred context that did not survive the merge would dangle;
    // drop it instead of pointing at a missing entry.
    if let Some(cc) = &merged.current_context {
        if merged.contains(EntryKind::Context, cc) {
            root.insert(key("current-context"), key(cc));
        }
    }

    root.insert(key("kind"), key("Config"));
    root.insert(key("preferences"), Value::Mapping(Mapping::new()));

    // Reorder to kubectl's output order: apiVersion, clusters, contexts,
    // current-context, kind, preferences, users.
    let order = ["apiVersion", "clusters", "contexts", "current-context", "kind", "preferences", "users"];
    let mut ordered = Mapping::new();
    for field in order {
        if let Some(v) = root.get(&key(field)) {
            ordered.insert(key(field), v.clone());
        }
    }

    serde_yaml::to_string(&Value::Mapping(ordered)).map_err(ParseError::Serialize)
}
