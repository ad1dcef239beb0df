//! Stable content digests for documents and backups.

use sha2::{Digest, Sha256};

/// SHA-256 of the content, truncated to 16 hex chars. Enough to identify a
/// document body in reports without dragging full digests around.
pub fn short_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
