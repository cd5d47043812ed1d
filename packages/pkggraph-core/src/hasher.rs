//! Deterministic per-package content hashing.
//!
//! The digest covers a package's own file tree only: any subtree named
//! `node_modules` is pruned so nested installations never influence their
//! parent's fingerprint. Relative paths are normalized to `/` and sorted
//! byte-lexicographically before hashing, which makes the digest independent
//! of traversal order and platform.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Result, ScanError};
use crate::NESTED_INSTALL_DIR;

/// Compute the SHA-256 content digest of a package directory.
///
/// Per file, in sorted order, the digest absorbs the normalized relative
/// path, a NUL separator, the raw file bytes and a second NUL. The framing
/// keeps `("a", "bc")` and `("ab", "c")` distinct where plain concatenation
/// would collide.
///
/// Errors are returned to the caller, who records the package as "hash
/// unavailable" and moves on; a failed hash never aborts the scan.
pub fn hash_package_dir(dir: &Path) -> Result<String> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            // Prune nested installations, but never the package root itself
            // (a package may legitimately be named like the install dir).
            e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == NESTED_INSTALL_DIR)
        })
    {
        let entry = entry.map_err(ScanError::walk)?;
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(dir)
                .map_err(ScanError::walk)?;
            files.push((normalize_rel_path(rel), entry.path().to_path_buf()));
        }
    }

    files.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (rel, full) in &files {
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        let content = fs::read(full)?;
        hasher.update(&content);
        hasher.update([0u8]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Join path components with `/` regardless of platform separator.
fn normalize_rel_path(rel: &Path) -> String {
    let mut normalized = String::new();
    for (i, component) in rel.components().enumerate() {
        if i > 0 {
            normalized.push('/');
        }
        normalized.push_str(&component.as_os_str().to_string_lossy());
    }
    normalized
}
