//! Scan orchestration.
//!
//! `Scanner::run` is the library entry point: validate the root, resolve to
//! the reachability fixed point, derive edges under the configured policy,
//! emit the diagnostic summary and assemble the document.

use std::time::Instant;

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::graph::DependencyGraph;
use crate::report::{GraphDocument, ScanSummary};
use crate::resolver::Resolver;

/// Completed scan: the document plus its diagnostic summary.
#[derive(Debug)]
pub struct ScanOutcome {
    pub document: GraphDocument,
    pub summary: ScanSummary,
}

pub struct Scanner {
    config: ScanConfig,
    cancel: CancelToken,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        let cancel = match config.timeout {
            Some(timeout) => CancelToken::with_timeout(timeout),
            None => CancelToken::new(),
        };
        Scanner { config, cancel }
    }

    /// Handle another thread can use to cancel this scan.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(self) -> Result<ScanOutcome> {
        let started = Instant::now();
        let root = self.config.root();
        if !root.is_dir() {
            return Err(ScanError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        info!(
            "scanning {} with {} workers",
            root.display(),
            self.config.workers
        );
        let resolution = Resolver::new(&self.config, &self.cancel)?.resolve()?;

        let graph = DependencyGraph::build(&resolution.index, self.config.edge_policy);
        let summary = ScanSummary::collect(
            &resolution.index,
            &graph,
            resolution.unresolved_dependencies,
        );
        summary.emit();
        debug!(
            "{} waves, {} edges, {:?} elapsed",
            resolution.waves,
            graph.edge_count(),
            started.elapsed()
        );

        let document = GraphDocument::new(root, resolution.index, graph.into_edges());
        Ok(ScanOutcome { document, summary })
    }
}
