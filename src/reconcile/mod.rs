//! Reconcile an organization's account listing against existing CLI
//! profiles: synthesize a profile for every account that lacks one.
//!
//! Account listings come in through [`AccountSource`], the seam behind
//! which the actual cloud CLI lives. The crate ships a file-backed
//! implementation reading a listing exported by that CLI; tests use
//! in-memory sources.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::document::profile::render_section;
use crate::errors::{PermissionSkipWarning, ReconcileError};

/// One account as enumerated from the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Enumeration result for one account. Listings may carry per-account
/// access failures recorded by whatever enumerated them; those become
/// warnings, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountRecord {
    Available(AccountDescriptor),
    Denied { id: String, reason: String },
}

/// A synthesized CLI profile for one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDescriptor {
    pub name: String,
    pub account_id: String,
    /// What the profile authenticates against (an assumable role ARN).
    pub auth_target: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_start_url: Option<String>,
}

impl ProfileDescriptor {
    /// Stanza body in the cloud CLI's key vocabulary.
    pub fn stanza_body(&self) -> Mapping {
        let mut body = Mapping::new();
        if let Some(url) = &self.sso_start_url {
            body.insert(str_value("sso_start_url"), str_value(url));
            body.insert(str_value("sso_account_id"), str_value(&self.account_id));
            body.insert(str_value("sso_role_name"), str_value(&self.role));
        } else {
            body.insert(str_value("role_arn"), str_value(&self.auth_target));
            body.insert(str_value("source_profile"), str_value("default"));
        }
        if let Some(region) = &self.region {
            body.insert(str_value("region"), str_value(region));
        }
        body
    }
}

fn str_value(s: &str) -> Value {
    Value::String(s.to_string())
}

/// How profiles are derived from accounts.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Role assumed in each member account.
    pub role: String,
    pub region: Option<String>,
    pub sso_start_url: Option<String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            role: "OrganizationAccountAccessRole".to_string(),
            region: None,
            sso_start_url: None,
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Profiles to create, in account-listing order.
    pub profiles: Vec<ProfileDescriptor>,
    /// Accounts skipped because a profile already exists.
    pub already_present: Vec<String>,
    pub warnings: Vec<PermissionSkipWarning>,
}

/// Source of account listings — the generic seam in front of the external
/// cloud CLI.
pub trait AccountSource {
    fn list(&self) -> Result<Vec<AccountRecord>, ReconcileError>;
}

/// Reads a JSON account listing exported by the organization tool:
/// `[{"id": "...", "name": "...", "region": "...", "error": "..."}]`.
/// Records with an `error` field are accounts the exporter could not
/// enumerate.
pub struct FileAccountSource {
    path: PathBuf,
}

impl FileAccountSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[derive(Deserialize)]
struct RawAccount {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AccountSource for FileAccountSource {
    fn list(&self) -> Result<Vec<AccountRecord>, ReconcileError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| ReconcileError::Io { path: self.path.clone(), source: e })?;
        let raw: Vec<RawAccount> = serde_json::from_str(&content)
            .map_err(|e| ReconcileError::Json { path: self.path.clone(), source: e })?;

        Ok(raw
            .into_iter()
            .map(|acct| match acct.error {
                Some(reason) => AccountRecord::Denied { id: acct.id, reason },
                None => AccountRecord::Available(AccountDescriptor {
                    id: acct.id,
                    name: acct.name,
                    region: acct.region,
                }),
            })
            .collect())
    }
}

/// Synthesize a [`ProfileDescriptor`] for every available account whose
/// derived profile name is not in `existing`. Denied accounts become
/// warnings. Derivation fans out per account and results are collected
/// back in listing order.
pub fn reconcile_profiles(
    records: &[AccountRecord],
    existing: &BTreeSet<String>,
    options: &ReconcileOptions,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    let derived: Vec<Option<ProfileDescriptor>> = records
        .par_iter()
        .map(|record| match record {
            AccountRecord::Available(account) => Some(derive_profile(account, options)),
            AccountRecord::Denied { .. } => None,
        })
        .collect();

    for (record, profile) in records.iter().zip(derived) {
        match (record, profile) {
            (AccountRecord::Denied { id, reason }, _) => {
                outcome.warnings.push(PermissionSkipWarning {
                    account_id: id.clone(),
                    reason: reason.clone(),
                });
            }
            (AccountRecord::Available(_), Some(profile)) => {
                if existing.contains(&profile.name) {
                    debug!(profile = %profile.name, "profile already present");
                    outcome.already_present.push(profile.name);
                } else {
                    outcome.profiles.push(profile);
                }
            }
            (AccountRecord::Available(_), None) => {}
        }
    }
    outcome
}

fn derive_profile(account: &AccountDescriptor, options: &ReconcileOptions) -> ProfileDescriptor {
    let name = if account.name.is_empty() {
        account.id.clone()
    } else {
        crate::utils::slug(&account.name)
    };
    ProfileDescriptor {
        name,
        account_id: account.id.clone(),
        auth_target: format!("arn:aws:iam::{}:role/{}", account.id, options.role),
        role: options.role.clone(),
        region: account.region.clone().or_else(|| options.region.clone()),
        sso_start_url: options.sso_start_url.clone(),
    }
}

/// Profile names already present in a cloud CLI config file. A missing
/// file is an empty set, not an error.
pub fn read_profile_names(path: &Path) -> Result<BTreeSet<String>, ReconcileError> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| ReconcileError::Io { path: path.to_path_buf(), source: e })?;

    let mut names = BTreeSet::new();
    for line in content.lines() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let header = header.trim();
            let name = header.strip_prefix("profile ").map(str::trim).unwrap_or(header);
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Render the stanzas to append for the synthesized profiles.
pub fn render_new_profiles(profiles: &[ProfileDescriptor]) -> String {
    profiles
        .iter()
        .map(|p| render_section(&p.name, &p.stanza_body()))
        .collect::<Vec<_>>()
        .join("\n")
}
