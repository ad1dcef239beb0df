//! Info command: inspect a source directory without merging.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use crate::discover::DocumentDiscovery;
use crate::document;
use crate::merge::merge_documents;
use crate::settings::DEFAULT_PATTERN;
use crate::utils::env_join;

#[derive(Args)]
pub struct InfoArgs {
    /// Directory scanned for source documents
    #[arg(short = 's', long, value_name = "DIR")]
    pub source_dir: PathBuf,

    /// Glob matched against source file names
    #[arg(short = 'p', long, value_name = "GLOB", default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let mut discovery = DocumentDiscovery::new(args.source_dir.clone())
        .name_pattern(args.pattern)
        .follow_symlinks(args.follow_symlinks);
    let paths = discovery.discover()?;
    let stats = discovery.stats().clone();

    println!("Source directory: {}", args.source_dir.display());
    println!("{}", style("Documents:").bold());

    let mut documents = Vec::new();
    for path in &paths {
        match document::load(path) {
            Ok(doc) => {
                let counts: Vec<String> = doc
                    .kind_counts()
                    .into_iter()
                    .map(|(kind, n)| format!("{n} {kind}"))
                    .collect();
                let detail =
                    if counts.is_empty() { "empty".to_string() } else { counts.join(", ") };
                println!("  {} ({detail}) [{}]", path.display(), doc.digest);
                documents.push(doc);
            }
            Err(err) => {
                println!("  {} {}", path.display(), style(format!("({err})")).red());
            }
        }
    }

    // Fold in memory to show the collisions a real merge would resolve.
    let (_, report) = merge_documents(None, documents);
    if !report.shadowed.is_empty() {
        println!("{}", style("Would-be collisions:").bold());
        for collision in &report.shadowed {
            println!(
                "  {}/{}: {} would win over {} other(s)",
                collision.kind,
                collision.name,
                collision.winning_source,
                collision.shadowed_sources.len()
            );
        }
    }

    println!("{}", style("Statistics:").bold());
    println!("  Files seen: {}", stats.files_seen);
    println!("  Files matched: {}", stats.files_matched);
    println!("  Directories skipped: {}", stats.dirs_skipped);
    println!("  Entries after merge: {}", report.entries_merged());

    if !paths.is_empty() {
        println!("Env value for external merge tooling:");
        println!("  {}", env_join(&paths));
    }

    Ok(())
}
