//! Explicit `package.json` schema.
//!
//! The recognized fields form a named schema with documented defaulting
//! rules:
//! - `version` defaults to `0.0.0` at identity-building time,
//! - declared dependencies are the union of `dependencies` and
//!   `optionalDependencies` (the latter wins name collisions),
//! - peer and dev dependencies are ignored by design.
//!
//! An absent, unreadable or malformed manifest all read as `None`; the
//! distinction is deliberately not surfaced beyond a debug trace.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Per-package metadata file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Version assumed when the manifest omits one.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Recognized manifest fields. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,

    pub version: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,

    /// Kept as raw JSON: real manifests carry strings here but old ones
    /// carry objects, and a non-string value must not poison the parse.
    #[serde(default)]
    pub license: Option<Value>,
}

impl PackageManifest {
    /// A manifest is usable only with a non-empty `name`; anything else is
    /// silently excluded from indexing and traversal.
    pub fn usable_name(&self) -> Option<&str> {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    pub fn version_or_default(&self) -> &str {
        match self.version.as_deref() {
            Some(version) if !version.is_empty() => version,
            _ => DEFAULT_VERSION,
        }
    }

    /// Union of runtime and optional dependencies, name to declared range.
    /// Optional entries override runtime entries sharing a name.
    pub fn declared_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        for (name, range) in &self.optional_dependencies {
            merged.insert(name.clone(), range.clone());
        }
        merged
    }

    /// The manifest `license` field, counted only when it is a non-empty
    /// string.
    pub fn license_field(&self) -> Option<&str> {
        match self.license.as_ref() {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Read and parse `<dir>/package.json`.
///
/// Absent, unreadable and malformed manifests are indistinguishable to
/// callers: all yield `None`.
pub fn read_manifest(dir: &Path) -> Option<PackageManifest> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("no readable manifest at {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_slice::<PackageManifest>(&bytes) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            debug!("malformed manifest at {}: {}", path.display(), e);
            None
        }
    }
}
