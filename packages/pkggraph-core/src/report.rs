//! Scan reporting: diagnostic summary and the structured document.
//!
//! The two outputs never mix. `ScanSummary` goes to the logging channel
//! (stderr); `GraphDocument` is the machine-readable result and is the only
//! thing written to stdout.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::graph::{DependencyGraph, Edge};
use crate::index::{PackageId, PackageIndex, PackageNode};

/// The serialized scan result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub generated_at: DateTime<Utc>,
    pub node_modules_root: String,
    /// Registered packages, keyed by id.
    pub nodes: BTreeMap<PackageId, PackageNode>,
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn new(root: &Path, index: PackageIndex, edges: Vec<Edge>) -> Self {
        GraphDocument {
            generated_at: Utc::now(),
            node_modules_root: root.display().to_string(),
            nodes: index.into_nodes(),
            edges,
        }
    }

    /// Pretty-printed JSON (2-space indent).
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Diagnostic counters for one finished scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub package_count: usize,
    /// Packages with neither a license artifact nor a manifest field.
    pub missing_licenses: Vec<(PackageId, String)>,
    pub unresolved_dependencies: usize,
    pub cycle_count: usize,
}

impl ScanSummary {
    pub fn collect(index: &PackageIndex, graph: &DependencyGraph, unresolved: usize) -> Self {
        let missing_licenses = index
            .nodes()
            .filter(|n| n.missing_license)
            .map(|n| (n.id.clone(), n.path.clone()))
            .collect();
        ScanSummary {
            package_count: index.node_count(),
            missing_licenses,
            unresolved_dependencies: unresolved,
            cycle_count: graph.cycles().len(),
        }
    }

    pub fn missing_license_count(&self) -> usize {
        self.missing_licenses.len()
    }

    /// Emit the summary as diagnostics.
    pub fn emit(&self) {
        info!("scanned {} packages", self.package_count);
        info!(
            "packages missing license file or license field: {}",
            self.missing_license_count()
        );
        for (id, path) in &self.missing_licenses {
            warn!("missing license: {} at {}", id, path);
        }
        if self.unresolved_dependencies > 0 {
            info!(
                "declared dependencies without an installed candidate: {}",
                self.unresolved_dependencies
            );
        }
        if self.cycle_count > 0 {
            info!("dependency cycles: {}", self.cycle_count);
        }
    }
}
