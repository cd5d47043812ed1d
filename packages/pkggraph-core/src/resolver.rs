//! Nested-lookup traversal to the reachability fixed point.
//!
//! Discovery runs in waves. Fan-out: every directory in the current wave is
//! scanned on a bounded rayon pool (manifest, content hash, license,
//! dependency candidate resolution). Fan-in: the coordinating thread walks
//! the wave's results in order and is the only writer of the `ScanContext`,
//! which owns all mutable traversal state. A package expands only when it
//! newly claimed its identity; already-dispatched directories are never
//! dispatched again, so the traversal terminates.
//!
//! Registration order is therefore deterministic for a given tree: sorted
//! seeds, then wave order, with each package's candidates in declared-name
//! order. Worker count never affects the outcome.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::hasher::hash_package_dir;
use crate::index::{PackageId, PackageIndex, PackageNode};
use crate::license::{detect_license, LicenseInfo};
use crate::manifest::{read_manifest, PackageManifest};
use crate::NESTED_INSTALL_DIR;

/// Worker output for one dispatched install directory.
#[derive(Debug)]
struct ScannedPackage {
    path: PathBuf,
    manifest: PackageManifest,
    content_hash: Option<String>,
    license: LicenseInfo,
    /// Existing install candidates for declared names, in declared-name
    /// order.
    resolved: Vec<PathBuf>,
    /// Declared names with no installed candidate.
    unresolved: Vec<String>,
}

/// Outcome of running discovery to the fixed point.
#[derive(Debug)]
pub struct Resolution {
    pub index: PackageIndex,
    /// Declared dependencies of registered packages that had no installed
    /// candidate.
    pub unresolved_dependencies: usize,
    pub waves: usize,
}

/// Mutable traversal state: the identity index, the dispatched-path guard
/// and the next wave's frontier. Owned by the coordinating thread and
/// threaded through each fan-in step; workers never see it.
struct ScanContext {
    index: PackageIndex,
    dispatched: HashSet<PathBuf>,
    frontier: Vec<PathBuf>,
    unresolved_dependencies: usize,
    waves: usize,
}

impl ScanContext {
    fn seeded(root: &Path) -> Result<Self> {
        let frontier = seed_dirs(root)?;
        let dispatched = frontier.iter().cloned().collect();
        Ok(ScanContext {
            index: PackageIndex::new(),
            dispatched,
            frontier,
            unresolved_dependencies: 0,
            waves: 0,
        })
    }

    /// Take the next wave of directories to scan, if any remain.
    fn next_wave(&mut self) -> Option<Vec<PathBuf>> {
        if self.frontier.is_empty() {
            return None;
        }
        self.waves += 1;
        Some(std::mem::take(&mut self.frontier))
    }

    /// Fan-in one scanned install. The first claim of an identity registers
    /// the node and dispatches its unseen candidates; a duplicate is
    /// dropped whole, its resolution results included.
    fn absorb(&mut self, pkg: ScannedPackage) {
        let Some(id) = PackageId::from_manifest(&pkg.manifest) else {
            return;
        };
        if self.index.contains(&id) {
            debug!(
                "identity {} already claimed, skipping {}",
                id,
                pkg.path.display()
            );
            return;
        }

        for name in &pkg.unresolved {
            debug!("{}: dependency {} is not installed", id, name);
        }
        self.unresolved_dependencies += pkg.unresolved.len();

        self.index.register(build_node(&id, &pkg));
        for candidate in pkg.resolved {
            if self.dispatched.insert(candidate.clone()) {
                self.frontier.push(candidate);
            }
        }
    }

    fn into_resolution(self) -> Resolution {
        Resolution {
            index: self.index,
            unresolved_dependencies: self.unresolved_dependencies,
            waves: self.waves,
        }
    }
}

pub struct Resolver<'a> {
    root: &'a Path,
    cancel: &'a CancelToken,
    pool: rayon::ThreadPool,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a ScanConfig, cancel: &'a CancelToken) -> Result<Resolver<'a>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| ScanError::Pool(e.to_string()))?;
        Ok(Resolver {
            root: config.root(),
            cancel,
            pool,
        })
    }

    /// Expand the index to its reachability fixed point, starting from the
    /// top-level installs under the root.
    ///
    /// A token that is already tripped aborts before anything is seeded,
    /// even when the root holds no packages at all.
    pub fn resolve(&self) -> Result<Resolution> {
        self.cancel.check()?;
        let mut ctx = ScanContext::seeded(self.root)?;

        while let Some(wave) = ctx.next_wave() {
            self.cancel.check()?;
            debug!("wave {}: scanning {} directories", ctx.waves, wave.len());
            for pkg in self.scan_wave(&wave)?.into_iter().flatten() {
                ctx.absorb(pkg);
            }
        }

        debug!(
            "fixed point after {} waves: {} packages",
            ctx.waves,
            ctx.index.node_count()
        );
        Ok(ctx.into_resolution())
    }

    fn scan_wave(&self, wave: &[PathBuf]) -> Result<Vec<Option<ScannedPackage>>> {
        self.pool.install(|| {
            wave.par_iter()
                .map(|dir| self.scan_package_dir(dir))
                .collect()
        })
    }

    /// Scan one install directory. `Ok(None)` means no usable manifest;
    /// hash failures degrade to a missing hash. Only cancellation is an
    /// error.
    fn scan_package_dir(&self, dir: &Path) -> Result<Option<ScannedPackage>> {
        self.cancel.check()?;

        let Some(manifest) = read_manifest(dir) else {
            debug!("no readable manifest in {}", dir.display());
            return Ok(None);
        };
        if manifest.usable_name().is_none() {
            debug!("manifest without a name in {}", dir.display());
            return Ok(None);
        }

        let content_hash = match hash_package_dir(dir) {
            Ok(digest) => Some(digest),
            Err(e) if !e.is_fatal() => {
                warn!("error hashing {}: {}", dir.display(), e);
                None
            }
            Err(e) => return Err(e),
        };
        let license = detect_license(dir, &manifest);

        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        for name in manifest.declared_dependencies().keys() {
            match resolve_install_path(self.root, dir, name) {
                Some(path) => resolved.push(path),
                None => unresolved.push(name.clone()),
            }
        }

        Ok(Some(ScannedPackage {
            path: dir.to_path_buf(),
            manifest,
            content_hash,
            license,
            resolved,
            unresolved,
        }))
    }
}

fn build_node(id: &PackageId, pkg: &ScannedPackage) -> PackageNode {
    let declared_ranges = pkg.manifest.declared_dependencies();
    let declared_dependencies: BTreeSet<String> = declared_ranges.keys().cloned().collect();
    PackageNode {
        id: id.clone(),
        name: pkg.manifest.usable_name().unwrap_or_default().to_string(),
        version: pkg.manifest.version_or_default().to_string(),
        path: pkg.path.display().to_string(),
        content_hash: pkg.content_hash.clone(),
        license: pkg.license.reference.clone(),
        license_source: pkg.license.source,
        missing_license: pkg.license.is_missing(),
        declared_dependencies,
        declared_ranges,
    }
}

/// Install candidate for a declared dependency: the package's own nested
/// install dir first, then the scan root. First existing path wins.
fn resolve_install_path(root: &Path, pkg_dir: &Path, name: &str) -> Option<PathBuf> {
    let nested = pkg_dir.join(NESTED_INSTALL_DIR).join(name);
    if nested.exists() {
        return Some(nested);
    }
    let top = root.join(name);
    if top.exists() {
        return Some(top);
    }
    None
}

/// Top-level install directories under `root`, sorted by name. A directory
/// whose name starts with `@` is a scope: its subdirectories are the
/// installs.
pub(crate) fn seed_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut seeds = Vec::new();
    for (name, path) in sorted_subdirs(root)? {
        if name.starts_with('@') {
            for (_, member) in sorted_subdirs(&path)? {
                seeds.push(member);
            }
        } else {
            seeds.push(path);
        }
    }
    Ok(seeds)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        out.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    out.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}
