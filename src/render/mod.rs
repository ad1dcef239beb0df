//! Merge summary and machine-readable report output.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use console::style;
use serde_json::{json, Map, Value};

use crate::commit::CommitOutcome;
use crate::domain::{MergeReport, REPORT_SCHEMA_VERSION};

/// Print the human summary. Always runs — dry-run and archival warnings
/// included — so every invocation ends with the same accounting.
pub fn print_summary(report: &MergeReport, outcome: Option<&CommitOutcome>, dry_run: bool) {
    println!("{}", style("Merge summary:").bold());
    println!("  Documents folded: {}", report.documents_folded);
    println!("  Entries merged: {}", report.entries_merged());
    println!("  Entries shadowed: {}", report.entries_shadowed());

    if !report.shadowed.is_empty() {
        println!("{}", style("Shadowed entries:").bold());
        for collision in &report.shadowed {
            let shadowed: Vec<&str> =
                collision.shadowed_sources.iter().map(|s| s.as_str()).collect();
            println!(
                "  {}/{}: kept {} (shadowed: {})",
                collision.kind,
                collision.name,
                collision.winning_source,
                shadowed.join(", ")
            );
        }
    }

    if let Some(outcome) = outcome {
        match &outcome.backup.backup {
            Some(path) => println!("Backup: {}", path.display()),
            None => println!("Backup: none (no previous active configuration)"),
        }
        if !outcome.archived.is_empty() {
            println!("{}", style("Archived sources:").bold());
            for (from, to) in &outcome.archived {
                println!("  {} -> {}", from.display(), to.display());
            }
        }
        if !outcome.warnings.is_empty() {
            println!("{}", style("Warnings:").yellow().bold());
            for warning in &outcome.warnings {
                println!("  {}", warning);
            }
        }
    }

    if dry_run {
        println!("{}", style("Dry run: nothing was committed.").yellow());
    }
}

/// Write the JSON report an observer or test inspects for correctness.
pub fn write_report_json(
    report_path: &Path,
    report: &MergeReport,
    outcome: Option<&CommitOutcome>,
    include_timestamp: bool,
) -> Result<()> {
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::String(REPORT_SCHEMA_VERSION.to_string()),
    );
    if include_timestamp {
        root.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    root.insert("stats".to_string(), report.to_report_value());
    root.insert("entries".to_string(), serde_json::to_value(&report.entries)?);
    root.insert("shadowed".to_string(), serde_json::to_value(&report.shadowed)?);

    if let Some(outcome) = outcome {
        root.insert("backup".to_string(), serde_json::to_value(&outcome.backup)?);
        let archived: Vec<Value> = outcome
            .archived
            .iter()
            .map(|(from, to)| {
                json!({"source": from.display().to_string(), "archived": to.display().to_string()})
            })
            .collect();
        root.insert("archived".to_string(), Value::Array(archived));
        root.insert("warnings".to_string(), serde_json::to_value(&outcome.warnings)?);
    }

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(root))?)?;
    Ok(())
}
