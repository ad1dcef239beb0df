//! Reconcile command: synthesize missing cloud CLI profiles.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use crate::reconcile::{
    read_profile_names, reconcile_profiles, render_new_profiles, AccountSource,
    FileAccountSource, ReconcileOptions,
};

#[derive(Args)]
pub struct ReconcileArgs {
    /// JSON account listing exported by the organization tool
    #[arg(long, value_name = "FILE")]
    pub accounts: PathBuf,

    /// Cloud CLI profile file to reconcile against (and append to)
    #[arg(long, value_name = "FILE")]
    pub profiles: PathBuf,

    /// Role assumed in each member account
    #[arg(long, value_name = "ROLE", default_value = "OrganizationAccountAccessRole")]
    pub role: String,

    /// Default region for synthesized profiles
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Emit SSO profiles against this start URL instead of role stanzas
    #[arg(long, value_name = "URL")]
    pub sso_start_url: Option<String>,

    /// Show what would be appended without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: ReconcileArgs) -> Result<()> {
    let records = FileAccountSource::new(args.accounts.clone())
        .list()
        .context("failed to load account listing")?;
    let existing = read_profile_names(&args.profiles)
        .context("failed to read existing profiles")?;

    let options = ReconcileOptions {
        role: args.role,
        region: args.region,
        sso_start_url: args.sso_start_url,
    };
    let outcome = reconcile_profiles(&records, &existing, &options);

    println!("{}", style("Reconcile summary:").bold());
    println!("  Accounts listed: {}", records.len());
    println!("  Profiles already present: {}", outcome.already_present.len());
    println!("  Profiles to create: {}", outcome.profiles.len());
    for profile in &outcome.profiles {
        println!("    {} ({})", profile.name, profile.account_id);
    }
    if !outcome.warnings.is_empty() {
        println!("{}", style("Warnings:").yellow().bold());
        for warning in &outcome.warnings {
            println!("  {}", warning);
        }
    }

    if outcome.profiles.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    let stanzas = render_new_profiles(&outcome.profiles);
    if args.dry_run {
        println!("{}", style("Dry run: stanzas that would be appended:").yellow());
        println!("{stanzas}");
        return Ok(());
    }

    // Append-only: existing stanzas are never rewritten.
    let mut content = if args.profiles.exists() {
        fs::read_to_string(&args.profiles)
            .with_context(|| format!("failed to read {}", args.profiles.display()))?
    } else {
        String::new()
    };
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(&stanzas);
    fs::write(&args.profiles, content)
        .with_context(|| format!("failed to write {}", args.profiles.display()))?;

    println!("Appended {} profile(s) to {}", outcome.profiles.len(), args.profiles.display());
    Ok(())
}
