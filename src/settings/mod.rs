//! Tool settings file loading.
//!
//! `cfgmerge.toml` (or `.cfgmerge.toml`) can pin the usual flags so a merge
//! run is just `cfgmerge merge`. Precedence is CLI > settings file >
//! built-in defaults; the CLI side applies it with `Option::or`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default glob for kubeconfig-style source files.
pub const DEFAULT_PATTERN: &str = "*config";

/// Default backup directory name, created under the source directory.
pub const DEFAULT_BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub source_dir: Option<PathBuf>,
    pub active_path: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub pattern: Option<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// Load settings from an explicit path, or auto-discover in `search_dir`.
///
/// An explicitly passed file that fails to parse is an error; a bad
/// auto-discovered file only warns and falls back to defaults, so a stray
/// half-written settings file cannot brick the tool.
pub fn load_settings(explicit: Option<&Path>, search_dir: &Path) -> Result<Settings> {
    let explicit_provided = explicit.is_some();
    let discovered = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_settings(search_dir),
    };

    let Some(settings_file) = discovered else {
        return Ok(Settings::default());
    };

    let content = fs::read_to_string(&settings_file)
        .with_context(|| format!("Failed reading settings file: {}", settings_file.display()))?;

    match toml::from_str::<Settings>(&content) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            if explicit_provided {
                Err(e).with_context(|| {
                    format!("Invalid settings file: {}", settings_file.display())
                })
            } else {
                tracing::warn!(
                    "Failed to parse auto-discovered settings {}: {}",
                    settings_file.display(),
                    e
                );
                Ok(Settings::default())
            }
        }
    }
}

fn discover_settings(search_dir: &Path) -> Option<PathBuf> {
    let candidates = ["cfgmerge.toml", ".cfgmerge.toml"];
    for candidate in candidates {
        let path = search_dir.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_file_present() {
        let tmp = TempDir::new().expect("tmp");
        let settings = load_settings(None, tmp.path()).expect("settings");
        assert!(settings.source_dir.is_none());
        assert!(!settings.follow_symlinks);
    }

    #[test]
    fn auto_discovers_dotfile_variant() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join(".cfgmerge.toml"), "pattern = '*.yaml'\n").expect("write");
        let settings = load_settings(None, tmp.path()).expect("settings");
        assert_eq!(settings.pattern.as_deref(), Some("*.yaml"));
    }

    #[test]
    fn explicit_bad_settings_is_an_error() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "pattern = 123\n").expect("write");
        assert!(load_settings(Some(&path), tmp.path()).is_err());
    }

    #[test]
    fn auto_discovered_bad_settings_falls_back_to_defaults() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("cfgmerge.toml"), "pattern = 123\n").expect("write");
        let settings = load_settings(None, tmp.path()).expect("settings");
        assert!(settings.pattern.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected_for_explicit_files() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("typo.toml");
        fs::write(&path, "sorce_dir = '/tmp'\n").expect("write");
        assert!(load_settings(Some(&path), tmp.path()).is_err());
    }
}
