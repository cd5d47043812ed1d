//! pkggraph-core - resolution-and-identity engine for installed package
//! trees.
//!
//! Scans a `node_modules`-style root, discovers every reachable install via
//! nested-then-root lookup, assigns stable `name@version` identities with
//! first-claim dedup, hashes each package's content, records license
//! provenance, and derives a dependency graph under an explicit edge
//! policy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pkggraph_core::{ScanConfig, Scanner};
//!
//! let outcome = Scanner::new(ScanConfig::new("node_modules")).run()?;
//! println!("{}", outcome.document.to_json_pretty()?);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod graph;
pub mod hasher;
pub mod index;
pub mod license;
pub mod manifest;
pub mod report;
pub mod resolver;
pub mod scan;

/// Directory name hosting nested installs. Pruned from content hashes and
/// searched first during dependency resolution.
pub const NESTED_INSTALL_DIR: &str = "node_modules";

pub use cancel::CancelToken;
pub use config::{ScanConfig, DEFAULT_ROOT};
pub use error::{Result, ScanError};
pub use graph::{DependencyGraph, Edge, EdgePolicy};
pub use hasher::hash_package_dir;
pub use index::{PackageId, PackageIndex, PackageNode};
pub use license::{detect_license, find_license_file, LicenseInfo, LicenseSource};
pub use manifest::{read_manifest, PackageManifest};
pub use report::{GraphDocument, ScanSummary};
pub use resolver::{Resolution, Resolver};
pub use scan::{ScanOutcome, Scanner};
