//! Merge command: the discover → merge → commit pipeline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::commit;
use crate::discover::DocumentDiscovery;
use crate::merge::load_and_merge;
use crate::render::{print_summary, write_report_json};
use crate::settings::{load_settings, DEFAULT_BACKUP_DIR, DEFAULT_PATTERN};

#[derive(Args)]
pub struct MergeArgs {
    /// Directory scanned for source documents
    #[arg(short = 's', long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// The active configuration file to replace
    #[arg(short = 'a', long, value_name = "FILE")]
    pub active_path: Option<PathBuf>,

    /// Where pre-merge snapshots are kept (default: <source-dir>/backups)
    #[arg(short = 'b', long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Glob matched against source file names
    #[arg(short = 'p', long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Produce the merge report without committing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write the machine-readable report to this path
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Omit the generated_at timestamp from the JSON report
    #[arg(long)]
    pub no_timestamp: bool,

    /// Path to a settings file (cfgmerge.toml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

/// Exit codes: 0 success, 1 discovery/merge failure, 2 commit failure with
/// the active configuration left untouched.
pub fn run(args: MergeArgs) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: MergeArgs) -> Result<ExitCode> {
    let settings = load_settings(args.settings.as_deref(), Path::new("."))?;

    let source_dir = args
        .source_dir
        .or(settings.source_dir)
        .context("--source-dir is required (or source_dir in cfgmerge.toml)")?;
    let active_path = args
        .active_path
        .or(settings.active_path)
        .context("--active-path is required (or active_path in cfgmerge.toml)")?;
    let backup_dir = args
        .backup_dir
        .or(settings.backup_dir)
        .unwrap_or_else(|| source_dir.join(DEFAULT_BACKUP_DIR));
    let pattern = args
        .pattern
        .or(settings.pattern)
        .unwrap_or_else(|| DEFAULT_PATTERN.to_string());
    let follow_symlinks = args.follow_symlinks || settings.follow_symlinks;

    let mut discovery = DocumentDiscovery::new(source_dir)
        .name_pattern(pattern)
        .follow_symlinks(follow_symlinks)
        .exclude_path(active_path.clone())
        .exclude_path(backup_dir.clone());

    let sources = match discovery.discover() {
        Ok(sources) => sources,
        Err(err) => {
            eprintln!("Discovery failed: {err}");
            return Ok(ExitCode::from(1));
        }
    };
    info!(sources = sources.len(), "discovery complete");

    let (merged, report) = match load_and_merge(&active_path, &sources) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Merge failed: {err}: {}", err.cause);
            return Ok(ExitCode::from(1));
        }
    };

    if args.dry_run {
        print_summary(&report, None, true);
        if let Some(report_path) = &args.report_json {
            write_report_json(report_path, &report, None, !args.no_timestamp)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    match commit::commit(&merged, &active_path, &backup_dir, &sources) {
        Ok(outcome) => {
            print_summary(&report, Some(&outcome), false);
            if let Some(report_path) = &args.report_json {
                write_report_json(report_path, &report, Some(&outcome), !args.no_timestamp)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Commit failed during {}: {err}", err.stage());
            print_summary(&report, None, false);
            Ok(ExitCode::from(2))
        }
    }
}
