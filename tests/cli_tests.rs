//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cfgmerge() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cfgmerge"))
}

fn kube_doc(context: &str, cluster: &str) -> String {
    format!(
        "apiVersion: v1\nkind: Config\nclusters:\n  - name: {cluster}\n    cluster:\n      server: https://{cluster}.example:6443\ncontexts:\n  - name: {context}\n    context:\n      cluster: {cluster}\n      user: {context}-admin\nusers:\n  - name: {context}-admin\n    user:\n      token: secret-{context}\ncurrent-context: {context}\n"
    )
}

fn write_sources(dir: &Path) {
    fs::write(dir.join("default.config"), kube_doc("ctx-a", "alpha")).expect("write default");
    fs::write(dir.join("new.config"), kube_doc("ctx-b", "beta")).expect("write new");
}

#[test]
fn test_cli_version() {
    let mut cmd = cfgmerge();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("cfgmerge"));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let mut cmd = cfgmerge();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("contexts"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_merge_requires_source_dir() {
    let tmp = TempDir::new().expect("tmp");
    let mut cmd = cfgmerge();
    cmd.current_dir(tmp.path());
    cmd.args(["merge", "--active-path", "config"]);
    cmd.assert().failure().stderr(predicate::str::contains("--source-dir is required"));
}

#[test]
fn test_merge_end_to_end() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    write_sources(tmp.path());
    fs::write(&active, kube_doc("ctx-old", "old")).expect("write active");

    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().to_str().expect("utf8"),
        "--active-path",
        active.to_str().expect("utf8"),
    ]);
    cmd.assert().success().stdout(predicate::str::contains("Merge summary:"));

    // Active config now carries every context.
    let merged = fs::read_to_string(&active).expect("read active");
    for name in ["ctx-old", "ctx-a", "ctx-b"] {
        assert!(merged.contains(&format!("name: {name}")), "missing {name} in:\n{merged}");
    }

    // Pre-merge state snapshotted.
    let backups: Vec<_> = fs::read_dir(tmp.path().join("backups"))
        .expect("backup dir")
        .map(|e| e.expect("entry").path())
        .collect();
    assert_eq!(backups.len(), 1);
    let backup = fs::read_to_string(&backups[0]).expect("read backup");
    assert_eq!(backup, kube_doc("ctx-old", "old"));

    // Sources archived with provenance suffix, never deleted.
    assert!(!tmp.path().join("default.config").exists());
    assert!(!tmp.path().join("new.config").exists());
    assert!(tmp.path().join("imported/default.config.imported").exists());
    assert!(tmp.path().join("imported/new.config.imported").exists());
}

#[test]
fn test_merge_dry_run_commits_nothing() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    write_sources(tmp.path());
    fs::write(&active, kube_doc("ctx-old", "old")).expect("write active");

    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().to_str().expect("utf8"),
        "--active-path",
        active.to_str().expect("utf8"),
        "--dry-run",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Merge summary:"))
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(fs::read_to_string(&active).expect("read"), kube_doc("ctx-old", "old"));
    assert!(tmp.path().join("default.config").exists());
    assert!(tmp.path().join("new.config").exists());
    assert!(!tmp.path().join("backups").exists());
}

#[test]
fn test_malformed_source_aborts_with_exit_1_and_no_mutation() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    write_sources(tmp.path());
    fs::write(tmp.path().join("broken.config"), "clusters: [ {").expect("write broken");
    fs::write(&active, kube_doc("ctx-old", "old")).expect("write active");

    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().to_str().expect("utf8"),
        "--active-path",
        active.to_str().expect("utf8"),
    ]);
    cmd.assert().code(1).stderr(predicate::str::contains("Merge failed"));

    // Active byte-identical, nothing archived.
    assert_eq!(fs::read_to_string(&active).expect("read"), kube_doc("ctx-old", "old"));
    assert!(tmp.path().join("default.config").exists());
    assert!(tmp.path().join("new.config").exists());
    assert!(!tmp.path().join("imported").exists());
}

#[test]
fn test_missing_source_dir_exits_1() {
    let tmp = TempDir::new().expect("tmp");
    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().join("absent").to_str().expect("utf8"),
        "--active-path",
        tmp.path().join("config").to_str().expect("utf8"),
    ]);
    cmd.assert().code(1).stderr(predicate::str::contains("Discovery failed"));
}

#[test]
fn test_held_lock_exits_2_and_leaves_active_untouched() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    write_sources(tmp.path());
    fs::write(&active, kube_doc("ctx-old", "old")).expect("write active");
    fs::write(tmp.path().join("config.lock"), "").expect("write lock");

    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().to_str().expect("utf8"),
        "--active-path",
        active.to_str().expect("utf8"),
    ]);
    cmd.assert().code(2).stderr(predicate::str::contains("Commit failed during lock"));

    assert_eq!(fs::read_to_string(&active).expect("read"), kube_doc("ctx-old", "old"));
    assert!(tmp.path().join("default.config").exists());
}

#[test]
fn test_last_write_wins_is_reported() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    // Same context name in both sources; the later one must win.
    fs::write(tmp.path().join("a.config"), kube_doc("shared", "alpha")).expect("write a");
    fs::write(tmp.path().join("b.config"), kube_doc("shared", "beta")).expect("write b");

    let report = tmp.path().join("out/report.json");
    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().to_str().expect("utf8"),
        "--active-path",
        active.to_str().expect("utf8"),
        "--report-json",
        report.to_str().expect("utf8"),
        "--no-timestamp",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("Shadowed entries:"));

    let merged = fs::read_to_string(&active).expect("read active");
    assert!(merged.contains("cluster: beta"), "later source must win:\n{merged}");

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report")).expect("json");
    assert!(parsed.get("generated_at").is_none());
    let shadowed = parsed["shadowed"].as_array().expect("shadowed array");
    assert!(shadowed
        .iter()
        .any(|c| c["name"] == "shared" && c["winning_source"].as_str().unwrap().ends_with("b.config")));
}

#[test]
fn test_merge_is_idempotent_across_runs() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    write_sources(tmp.path());

    let run = || {
        let mut cmd = cfgmerge();
        cmd.args([
            "merge",
            "--source-dir",
            tmp.path().to_str().expect("utf8"),
            "--active-path",
            active.to_str().expect("utf8"),
        ]);
        cmd.assert().success();
    };

    run();
    let first = fs::read_to_string(&active).expect("read");
    // Second run: sources are archived, so only the active file folds.
    run();
    let second = fs::read_to_string(&active).expect("read");
    similar_asserts::assert_eq!(first, second);
}

#[test]
fn test_archival_never_overwrites_across_runs() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");

    for round in 0..2 {
        fs::write(tmp.path().join("new.config"), kube_doc(&format!("ctx-{round}"), "gamma"))
            .expect("write source");
        let mut cmd = cfgmerge();
        cmd.args([
            "merge",
            "--source-dir",
            tmp.path().to_str().expect("utf8"),
            "--active-path",
            active.to_str().expect("utf8"),
        ]);
        cmd.assert().success();
    }

    assert!(tmp.path().join("imported/new.config.imported").exists());
    assert!(tmp.path().join("imported/new.config.imported-1").exists());
}

#[test]
fn test_info_reports_documents_and_collisions() {
    let tmp = TempDir::new().expect("tmp");
    fs::write(tmp.path().join("a.config"), kube_doc("shared", "alpha")).expect("write a");
    fs::write(tmp.path().join("b.config"), kube_doc("shared", "beta")).expect("write b");

    let mut cmd = cfgmerge();
    cmd.args(["info", "--source-dir", tmp.path().to_str().expect("utf8")]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Documents:"))
        .stdout(predicate::str::contains("Would-be collisions:"))
        .stdout(predicate::str::contains("Statistics:"));
}

#[test]
fn test_reconcile_appends_missing_profiles() {
    let tmp = TempDir::new().expect("tmp");
    let accounts = tmp.path().join("accounts.json");
    let profiles = tmp.path().join("aws-config");
    fs::write(
        &accounts,
        r#"[
            {"id": "111111111111", "name": "Dev Sandbox"},
            {"id": "222222222222", "name": "Prod"},
            {"id": "333333333333", "name": "Locked", "error": "AccessDenied"}
        ]"#,
    )
    .expect("write accounts");
    fs::write(&profiles, "[profile prod]\nrole_arn = existing\n").expect("write profiles");

    let mut cmd = cfgmerge();
    cmd.args([
        "reconcile",
        "--accounts",
        accounts.to_str().expect("utf8"),
        "--profiles",
        profiles.to_str().expect("utf8"),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Profiles to create: 1"))
        .stdout(predicate::str::contains("skipped account 333333333333"));

    let content = fs::read_to_string(&profiles).expect("read profiles");
    // Existing stanza untouched, new one appended.
    assert!(content.contains("role_arn = existing"));
    assert!(content.contains("[profile dev-sandbox]"));
    assert!(content.contains("role_arn = arn:aws:iam::111111111111:role/OrganizationAccountAccessRole"));
    assert!(!content.contains("[profile locked]"));
}

#[test]
fn test_reconcile_dry_run_writes_nothing() {
    let tmp = TempDir::new().expect("tmp");
    let accounts = tmp.path().join("accounts.json");
    let profiles = tmp.path().join("aws-config");
    fs::write(&accounts, r#"[{"id": "111111111111", "name": "Dev"}]"#).expect("write accounts");

    let mut cmd = cfgmerge();
    cmd.args([
        "reconcile",
        "--accounts",
        accounts.to_str().expect("utf8"),
        "--profiles",
        profiles.to_str().expect("utf8"),
        "--dry-run",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("Dry run"));
    assert!(!profiles.exists());
}

#[test]
fn test_contexts_list_and_use() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    fs::write(&active, kube_doc("ctx-a", "alpha")).expect("write active");

    let mut cmd = cfgmerge();
    cmd.args(["contexts", "--active-path", active.to_str().expect("utf8"), "--list"]);
    cmd.assert().success().stdout(predicate::str::contains("* ctx-a"));

    // Merge in a second context, then switch to it non-interactively.
    fs::write(tmp.path().join("more.config"), kube_doc("ctx-b", "beta")).expect("write source");
    let mut cmd = cfgmerge();
    cmd.args([
        "merge",
        "--source-dir",
        tmp.path().to_str().expect("utf8"),
        "--active-path",
        active.to_str().expect("utf8"),
    ]);
    cmd.assert().success();

    let mut cmd = cfgmerge();
    cmd.args([
        "contexts",
        "--active-path",
        active.to_str().expect("utf8"),
        "--use",
        "ctx-a",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("Switched to 'ctx-a'"));
    let content = fs::read_to_string(&active).expect("read");
    assert!(content.contains("current-context: ctx-a"));
}

#[test]
fn test_contexts_delete_by_name() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    fs::write(&active, kube_doc("ctx-a", "alpha")).expect("write active");

    let mut cmd = cfgmerge();
    cmd.args([
        "contexts",
        "--active-path",
        active.to_str().expect("utf8"),
        "--delete",
        "ctx-a",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("Deleted 'ctx-a'"));

    let content = fs::read_to_string(&active).expect("read");
    assert!(content.contains("contexts: []"));
    assert!(!content.contains("current-context"));
    // Cluster and credential entries are left in place; only the context
    // entry is removed.
    assert!(content.contains("name: ctx-a-admin"));
}

#[test]
fn test_contexts_rejects_unknown_name() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    fs::write(&active, kube_doc("ctx-a", "alpha")).expect("write active");

    let mut cmd = cfgmerge();
    cmd.args([
        "contexts",
        "--active-path",
        active.to_str().expect("utf8"),
        "--use",
        "ghost",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("no such context"));
}

#[test]
fn test_settings_file_supplies_defaults() {
    let tmp = TempDir::new().expect("tmp");
    let active = tmp.path().join("config");
    write_sources(tmp.path());
    fs::write(
        tmp.path().join("cfgmerge.toml"),
        format!(
            "source_dir = '{}'\nactive_path = '{}'\n",
            tmp.path().display(),
            active.display()
        ),
    )
    .expect("write settings");

    let mut cmd = cfgmerge();
    cmd.current_dir(tmp.path());
    cmd.arg("merge");
    cmd.assert().success().stdout(predicate::str::contains("Merge summary:"));
    assert!(active.exists());
}
