//! Builders that materialize installed package trees in a tempdir.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Builder for a single `package.json`.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    name: Option<String>,
    version: Option<String>,
    dependencies: BTreeMap<String, String>,
    optional_dependencies: BTreeMap<String, String>,
    license: Option<String>,
}

impl ManifestBuilder {
    pub fn new(name: &str) -> Self {
        ManifestBuilder {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// A manifest with no `name` field at all.
    pub fn anonymous() -> Self {
        ManifestBuilder::default()
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn dep(mut self, name: &str, range: &str) -> Self {
        self.dependencies
            .insert(name.to_string(), range.to_string());
        self
    }

    pub fn optional_dep(mut self, name: &str, range: &str) -> Self {
        self.optional_dependencies
            .insert(name.to_string(), range.to_string());
        self
    }

    pub fn license(mut self, license: &str) -> Self {
        self.license = Some(license.to_string());
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut manifest = serde_json::Map::new();
        if let Some(name) = &self.name {
            manifest.insert("name".into(), name.as_str().into());
        }
        if let Some(version) = &self.version {
            manifest.insert("version".into(), version.as_str().into());
        }
        if !self.dependencies.is_empty() {
            manifest.insert(
                "dependencies".into(),
                serde_json::to_value(&self.dependencies).unwrap(),
            );
        }
        if !self.optional_dependencies.is_empty() {
            manifest.insert(
                "optionalDependencies".into(),
                serde_json::to_value(&self.optional_dependencies).unwrap(),
            );
        }
        if let Some(license) = &self.license {
            manifest.insert("license".into(), license.as_str().into());
        }
        serde_json::Value::Object(manifest)
    }
}

/// A tempdir-backed install tree. Paths are relative to the tree root, so
/// `install("a/node_modules/b", ...)` materializes a nested install.
pub struct PackageTree {
    root: TempDir,
}

impl PackageTree {
    pub fn new() -> Self {
        PackageTree {
            root: TempDir::new().expect("create tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write a package directory with its manifest and a small source file.
    pub fn install(&self, rel: &str, manifest: ManifestBuilder) -> &Self {
        let dir = self.root.path().join(rel);
        fs::create_dir_all(&dir).expect("create package dir");
        fs::write(
            dir.join("package.json"),
            serde_json::to_vec_pretty(&manifest.to_json()).expect("serialize manifest"),
        )
        .expect("write manifest");
        fs::write(dir.join("index.js"), format!("// {rel}\n")).expect("write source");
        self
    }

    /// Write an arbitrary file (license texts, extra sources) at `rel`.
    pub fn write_file(&self, rel: &str, content: &[u8]) -> &Self {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write file");
        self
    }
}

impl Default for PackageTree {
    fn default() -> Self {
        Self::new()
    }
}
