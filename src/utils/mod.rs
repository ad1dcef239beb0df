//! Small shared helpers.

mod hashing;
mod naming;

pub use hashing::short_digest;
pub use naming::{backup_file_name, disambiguate, slug};

use std::path::Path;

/// Join paths with the platform's search-path separator, the form an
/// external tool expects in a `KUBECONFIG`-style environment variable.
///
/// cfgmerge itself never reads such variables; this only formats the value
/// for callers that drive the external tool directly.
pub fn env_join<P: AsRef<Path>>(paths: &[P]) -> String {
    let sep = if cfg!(windows) { ';' } else { ':' };
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}
