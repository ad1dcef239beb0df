//! Command-line interface for cfgmerge
//!
//! Provides the `merge` pipeline plus `reconcile`, `contexts`, `info`, and
//! `completions` subcommands.

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod contexts;
mod info;
mod merge;
mod reconcile;

/// Merge credential configuration documents and reconcile cloud CLI profiles
#[derive(Parser)]
#[command(name = "cfgmerge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, merge, and commit configuration documents
    Merge(merge::MergeArgs),

    /// Synthesize CLI profiles for organization accounts that lack one
    Reconcile(reconcile::ReconcileArgs),

    /// List, switch, or delete contexts in the active configuration
    Contexts(contexts::ContextsArgs),

    /// Inspect a source directory without merging
    Info(info::InfoArgs),

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Merge(args) => merge::run(args),
        Commands::Reconcile(args) => to_exit(reconcile::run(args)),
        Commands::Contexts(args) => to_exit(contexts::run(args)),
        Commands::Info(args) => to_exit(info::run(args)),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::SUCCESS
        }
    }
}

fn to_exit(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
