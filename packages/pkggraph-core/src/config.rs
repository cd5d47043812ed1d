//! Scan configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::EdgePolicy;

/// Default install root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "node_modules";

/// Configuration for a single scan.
///
/// Workers perform hashing, license detection and manifest reads; index
/// mutation stays on the coordinating thread regardless of the pool size.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root of the installation tree to audit.
    pub root: PathBuf,

    /// Worker threads for the per-wave fan-out (default: all CPUs).
    pub workers: usize,

    /// Edge target selection policy.
    pub edge_policy: EdgePolicy,

    /// Abort the scan once this much time has elapsed.
    pub timeout: Option<Duration>,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: num_cpus::get(),
            edge_policy: EdgePolicy::FirstRegistered,
            timeout: None,
        }
    }

    /// Set the worker pool size (clamped to at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}
