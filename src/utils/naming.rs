//! Collision-free file naming for backups and archives.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Timestamped backup name for the active file, seconds precision:
/// `config` → `config.20260807-142501.bak`.
pub fn backup_file_name(active_name: &str, now: DateTime<Utc>) -> String {
    format!("{}.{}.bak", active_name, now.format("%Y%m%d-%H%M%S"))
}

/// Return `candidate` if nothing occupies it, otherwise append `-1`, `-2`,
/// … until a free name is found. Archived files are never overwritten.
pub fn disambiguate(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }
    let mut n = 1u32;
    loop {
        let next = PathBuf::from(format!("{}-{}", candidate.display(), n));
        if !next.exists() {
            return next;
        }
        n += 1;
    }
}

/// Lowercase, hyphen-separated form of an account or profile name.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn backup_name_includes_seconds() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 14, 25, 1).unwrap();
        assert_eq!(backup_file_name("config", at), "config.20260807-142501.bak");
    }

    #[test]
    fn disambiguate_returns_candidate_when_free() {
        let tmp = TempDir::new().expect("tmp");
        let candidate = tmp.path().join("a.imported");
        assert_eq!(disambiguate(&candidate), candidate);
    }

    #[test]
    fn disambiguate_appends_counter_on_collision() {
        let tmp = TempDir::new().expect("tmp");
        let candidate = tmp.path().join("a.imported");
        fs::write(&candidate, "x").expect("write");

        let first = disambiguate(&candidate);
        assert_eq!(first, tmp.path().join("a.imported-1"));

        fs::write(&first, "y").expect("write");
        assert_eq!(disambiguate(&candidate), tmp.path().join("a.imported-2"));
    }

    #[test]
    fn slug_normalizes_account_names() {
        assert_eq!(slug("Dev Sandbox (us-east-1)"), "dev-sandbox-us-east-1");
        assert_eq!(slug("prod"), "prod");
        assert_eq!(slug("  Spaced  "), "spaced");
    }
}
