//! License artifact detection.
//!
//! Detection order: the fixed canonical filename list first, then a
//! case-insensitive fallback scan over the (sorted) directory entries. A
//! found file always wins over a manifest `license` field.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::manifest::PackageManifest;

/// Canonical license filenames, tried in order.
pub const LICENSE_FILENAMES: [&str; 9] = [
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENSE.MD",
    "license",
    "license.md",
    "COPYING",
    "COPYING.md",
    "UNLICENSE",
];

/// Lowercased names accepted by the fallback scan.
pub const LICENSE_FALLBACK: [&str; 5] =
    ["license", "license.md", "license.txt", "copying", "unlicense"];

/// Captured license text is clipped to this many bytes.
pub const LICENSE_TEXT_CAP: usize = 1000;

/// Where a package's license information came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseSource {
    /// A license artifact exists on disk.
    File,
    /// Only the manifest declares a license.
    Manifest,
    /// Neither a file nor a manifest field; flagged for reporting.
    None,
}

impl LicenseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseSource::File => "file",
            LicenseSource::Manifest => "manifest",
            LicenseSource::None => "none",
        }
    }
}

impl std::fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of license detection for one package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseInfo {
    pub source: LicenseSource,
    /// License filename (file source) or the manifest string (manifest
    /// source).
    pub reference: Option<String>,
    /// Bounded text prefix when an artifact was read.
    pub text: Option<String>,
}

impl LicenseInfo {
    pub fn is_missing(&self) -> bool {
        self.source == LicenseSource::None
    }
}

/// Locate a license artifact in `dir`, canonical names first, then the
/// case-insensitive fallback over sorted entries.
pub fn find_license_file(dir: &Path) -> Option<PathBuf> {
    for name in LICENSE_FILENAMES {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(_) => return None,
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort_unstable();

    for name in names {
        if LICENSE_FALLBACK.contains(&name.to_lowercase().as_str()) {
            return Some(dir.join(name));
        }
    }
    None
}

/// Derive a package's license info from its directory and manifest.
pub fn detect_license(dir: &Path, manifest: &PackageManifest) -> LicenseInfo {
    if let Some(path) = find_license_file(dir) {
        let reference = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let text = match fs::read(&path) {
            Ok(bytes) => Some(clip_text(&bytes)),
            Err(e) => {
                warn!("failed to read license file {}: {}", path.display(), e);
                None
            }
        };
        return LicenseInfo {
            source: LicenseSource::File,
            reference,
            text,
        };
    }

    if let Some(field) = manifest.license_field() {
        return LicenseInfo {
            source: LicenseSource::Manifest,
            reference: Some(field.to_string()),
            text: None,
        };
    }

    LicenseInfo {
        source: LicenseSource::None,
        reference: None,
        text: None,
    }
}

/// Lossy-decode and clip to at most `LICENSE_TEXT_CAP` bytes, cutting on a
/// char boundary.
fn clip_text(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > LICENSE_TEXT_CAP {
        let mut cut = LICENSE_TEXT_CAP;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest_with_license(license: Option<&str>) -> PackageManifest {
        let json = match license {
            Some(l) => format!(r#"{{"name": "x", "license": "{}"}}"#, l),
            None => r#"{"name": "x"}"#.to_string(),
        };
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_canonical_order_license_beats_copying() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("COPYING"), b"gpl").unwrap();
        std::fs::write(dir.path().join("LICENSE"), b"mit").unwrap();
        let found = find_license_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "LICENSE");
    }

    #[test]
    fn test_fallback_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("LiCeNsE.TxT"), b"mit").unwrap();
        let found = find_license_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "LiCeNsE.TxT");
    }

    #[test]
    fn test_fallback_ignores_unrelated_names() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), b"docs").unwrap();
        std::fs::write(dir.path().join("LICENSES.txt"), b"plural").unwrap();
        assert!(find_license_file(dir.path()).is_none());
    }

    #[test]
    fn test_file_beats_manifest_field() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("LICENSE"), b"from file").unwrap();
        let info = detect_license(dir.path(), &manifest_with_license(Some("ISC")));
        assert_eq!(info.source, LicenseSource::File);
        assert_eq!(info.reference.as_deref(), Some("LICENSE"));
        assert_eq!(info.text.as_deref(), Some("from file"));
        assert!(!info.is_missing());
    }

    #[test]
    fn test_manifest_fallback() {
        let dir = TempDir::new().unwrap();
        let info = detect_license(dir.path(), &manifest_with_license(Some("MIT")));
        assert_eq!(info.source, LicenseSource::Manifest);
        assert_eq!(info.reference.as_deref(), Some("MIT"));
        assert!(info.text.is_none());
    }

    #[test]
    fn test_missing_license() {
        let dir = TempDir::new().unwrap();
        let info = detect_license(dir.path(), &manifest_with_license(None));
        assert_eq!(info.source, LicenseSource::None);
        assert!(info.reference.is_none());
        assert!(info.is_missing());
    }

    #[test]
    fn test_text_truncated_to_cap() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("LICENSE"), vec![b'x'; 5000]).unwrap();
        let info = detect_license(dir.path(), &manifest_with_license(None));
        assert_eq!(info.text.unwrap().len(), LICENSE_TEXT_CAP);
    }

    #[test]
    fn test_text_truncation_multibyte_safe() {
        let dir = TempDir::new().unwrap();
        // One ASCII byte shifts every 2-byte char onto an odd offset, so
        // the cap lands mid-char and must back up to a boundary.
        let content = format!("a{}", "é".repeat(2000));
        std::fs::write(dir.path().join("LICENSE"), content).unwrap();
        let info = detect_license(dir.path(), &manifest_with_license(None));
        let text = info.text.unwrap();
        assert!(text.len() <= LICENSE_TEXT_CAP);
        assert_eq!(text.chars().last(), Some('é'));
    }

    #[test]
    fn test_source_tag_serialization() {
        assert_eq!(
            serde_json::to_string(&LicenseSource::File).unwrap(),
            "\"file\""
        );
        assert_eq!(
            serde_json::to_string(&LicenseSource::Manifest).unwrap(),
            "\"manifest\""
        );
        assert_eq!(
            serde_json::to_string(&LicenseSource::None).unwrap(),
            "\"none\""
        );
    }
}
