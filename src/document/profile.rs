//! Cloud CLI profile documents (`[profile NAME]` stanzas).

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::domain::{ConfigDocument, Entry, EntryKind, MergedConfig, SourceId};
use crate::errors::ParseError;

/// Parse an INI-style profile file. Sections named `[profile NAME]` and the
/// bare `[default]` section both become `CloudProfile` entries; keys keep
/// their file order inside the stanza body.
pub fn parse(path: &Path, content: &str) -> Result<ConfigDocument, ParseError> {
    let mut doc = ConfigDocument::empty(SourceId::from_path(path));
    let mut current: Option<(String, Mapping)> = None;

    for (lineno, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let Some(header) = rest.strip_suffix(']') else {
                return Err(ParseError::ProfileLine { path: path.to_path_buf(), line: lineno + 1 });
            };
            let header = header.trim();
            let name = header.strip_prefix("profile ").map(str::trim).unwrap_or(header);
            if name.is_empty() {
                return Err(ParseError::ProfileLine { path: path.to_path_buf(), line: lineno + 1 });
            }
            flush(&mut doc, current.take());
            current = Some((name.to_string(), Mapping::new()));
        } else if let Some((key, value)) = line.split_once('=') {
            let Some((_, body)) = current.as_mut() else {
                return Err(ParseError::ProfileLine { path: path.to_path_buf(), line: lineno + 1 });
            };
            body.insert(
                Value::String(key.trim().to_string()),
                Value::String(value.trim().to_string()),
            );
        } else {
            return Err(ParseError::ProfileLine { path: path.to_path_buf(), line: lineno + 1 });
        }
    }
    flush(&mut doc, current.take());
    Ok(doc)
}

fn flush(doc: &mut ConfigDocument, section: Option<(String, Mapping)>) {
    if let Some((name, body)) = section {
        doc.insert(Entry {
            kind: EntryKind::CloudProfile,
            name,
            body: Value::Mapping(body),
        });
    }
}

pub fn render(merged: &MergedConfig) -> String {
    let stanzas: Vec<String> = merged
        .entries_of(EntryKind::CloudProfile)
        .map(|entry| {
            let body = entry.body.as_mapping().cloned().unwrap_or_default();
            render_section(&entry.name, &body)
        })
        .collect();
    stanzas.join("\n")
}

/// One stanza in the cloud CLI's own syntax. The unnamed `default` profile
/// keeps its bare header.
pub fn render_section(name: &str, body: &Mapping) -> String {
    let header =
        if name == "default" { "[default]".to_string() } else { format!("[profile {name}]") };
    let mut out = header;
    out.push('\n');
    for (key, value) in body {
        let key = key.as_str().unwrap_or_default();
        let value = match value {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other).unwrap_or_default().trim_end().to_string(),
        };
        out.push_str(&format!("{key} = {value}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# generated
[default]
region = us-east-1

[profile dev-sandbox]
role_arn = arn:aws:iam::111111111111:role/Admin
source_profile = default
";

    #[test]
    fn parse_extracts_profiles_with_bare_default() {
        let doc = parse(Path::new("profiles"), SAMPLE).expect("parse");
        assert_eq!(doc.entries.len(), 2);
        assert!(doc.entries.contains_key(&(EntryKind::CloudProfile, "default".to_string())));
        assert!(doc
            .entries
            .contains_key(&(EntryKind::CloudProfile, "dev-sandbox".to_string())));
    }

    #[test]
    fn parse_rejects_key_outside_section() {
        let err = parse(Path::new("profiles"), "region = us-east-1\n").unwrap_err();
        match err {
            ParseError::ProfileLine { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_rejects_unterminated_header() {
        let err = parse(Path::new("profiles"), "[profile dev\n").unwrap_err();
        assert!(matches!(err, ParseError::ProfileLine { line: 1, .. }));
    }

    #[test]
    fn render_round_trips() {
        let doc = parse(Path::new("profiles"), SAMPLE).expect("parse");
        let merged = MergedConfig {
            current_context: None,
            folded: vec![doc.source.clone()],
            entries: doc.entries,
        };
        let rendered = render(&merged);
        assert!(rendered.contains("[default]"));
        assert!(rendered.contains("[profile dev-sandbox]"));
        assert!(rendered.contains("role_arn = arn:aws:iam::111111111111:role/Admin"));

        let again = parse(Path::new("profiles"), &rendered).expect("reparse");
        assert_eq!(again.entries.len(), 2);
    }
}
