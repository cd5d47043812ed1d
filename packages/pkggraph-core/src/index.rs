//! Package identity index.
//!
//! Identity is `name@version`. The first successfully processed install
//! claims an identity permanently; later installs with the same identity are
//! never registered and never overwrite. `by_name` keeps every id registered
//! under a name, in registration order, for edge resolution.
//!
//! The index has a single writer: all mutation happens on the coordinating
//! thread during fan-in (see `resolver`).

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::license::LicenseSource;
use crate::manifest::PackageManifest;

/// Stable identity of an installed package: `name@version`.
///
/// Scoped names keep their leading `@`, so `@scope/pkg@1.2.0` is a valid id;
/// the version separator is always the last `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(name: &str, version: &str) -> Self {
        PackageId(format!("{name}@{version}"))
    }

    /// Identity from a manifest. `None` when the manifest has no usable
    /// name; the version defaults when absent.
    pub fn from_manifest(manifest: &PackageManifest) -> Option<Self> {
        let name = manifest.usable_name()?;
        Some(Self::new(name, manifest.version_or_default()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> String {
        id.0
    }
}

/// One resolved package install. Built once at registration time and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageNode {
    pub id: PackageId,
    pub name: String,
    pub version: String,
    /// Install directory the identity was claimed from.
    pub path: String,
    /// Directory content digest; `None` when hashing failed for this
    /// package.
    pub content_hash: Option<String>,
    /// License filename (file source) or manifest license string.
    pub license: Option<String>,
    pub license_source: LicenseSource,
    pub missing_license: bool,
    /// Names of declared runtime and optional dependencies.
    pub declared_dependencies: BTreeSet<String>,
    /// Declared version ranges keyed by name; consumed by the strict edge
    /// policy only, never serialized.
    #[serde(skip)]
    pub declared_ranges: BTreeMap<String, String>,
}

/// First-claim identity index.
#[derive(Debug, Default)]
pub struct PackageIndex {
    nodes: BTreeMap<PackageId, PackageNode>,
    by_name: HashMap<String, Vec<PackageId>>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-if-absent. Returns `true` when `node` claimed a fresh
    /// identity; `false` means the identity was already claimed and the
    /// existing node is left untouched.
    pub fn register(&mut self, node: PackageNode) -> bool {
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                self.by_name
                    .entry(node.name.clone())
                    .or_default()
                    .push(node.id.clone());
                slot.insert(node);
                true
            }
        }
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &PackageId) -> Option<&PackageNode> {
        self.nodes.get(id)
    }

    /// Every id registered under `name`, oldest first.
    pub fn ids_for_name(&self, name: &str) -> &[PackageId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First id ever registered under `name`.
    pub fn first_id_for_name(&self, name: &str) -> Option<&PackageId> {
        self.ids_for_name(name).first()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.values()
    }

    /// Consume the index, yielding the id-ordered node map for document
    /// assembly.
    pub fn into_nodes(self) -> BTreeMap<PackageId, PackageNode> {
        self.nodes
    }
}
