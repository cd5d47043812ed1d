//! Dependency graph derivation.
//!
//! Edges are derived only after resolution reaches its fixed point, from
//! each node's declared dependency names. The graph itself is a
//! `petgraph::DiGraph` so cycle diagnostics come from `tarjan_scc`; cycles
//! (including self-loops) are valid states, never errors.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::{PackageId, PackageIndex};

/// How a declared dependency name is turned into an edge target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Target is the first id ever registered under the declared name;
    /// declared version ranges are ignored. The default, and a documented
    /// simplification: with several installed versions of a name, every
    /// dependent points at the first-registered one.
    FirstRegistered,
    /// Target is the first registration-order candidate whose installed
    /// version satisfies the declared range. Unparseable ranges or
    /// versions, and ranges no candidate satisfies, yield no edge.
    StrictSemver,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        EdgePolicy::FirstRegistered
    }
}

/// One dependency edge: `from` declared `declared_name` and it resolved to
/// the installed package `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: PackageId,
    pub to: PackageId,
    pub declared_name: String,
}

/// Derived dependency graph over registered packages.
pub struct DependencyGraph {
    graph: DiGraph<PackageId, String>,
    id_to_node: HashMap<PackageId, NodeIndex>,
    edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Derive edges for every registered node under `policy`, nodes in id
    /// order and declared names in set order.
    pub fn build(index: &PackageIndex, policy: EdgePolicy) -> Self {
        let mut graph = DiGraph::new();
        let mut id_to_node = HashMap::new();

        for node in index.nodes() {
            let idx = graph.add_node(node.id.clone());
            id_to_node.insert(node.id.clone(), idx);
        }

        let mut edges = Vec::new();
        for node in index.nodes() {
            for name in &node.declared_dependencies {
                let target = match policy {
                    EdgePolicy::FirstRegistered => index.first_id_for_name(name).cloned(),
                    EdgePolicy::StrictSemver => {
                        let range = node
                            .declared_ranges
                            .get(name)
                            .map(String::as_str)
                            .unwrap_or("");
                        strict_target(index, name, range)
                    }
                };
                let Some(target) = target else {
                    continue;
                };
                if let (Some(&from_idx), Some(&to_idx)) =
                    (id_to_node.get(&node.id), id_to_node.get(&target))
                {
                    graph.add_edge(from_idx, to_idx, name.clone());
                    edges.push(Edge {
                        from: node.id.clone(),
                        to: target,
                        declared_name: name.clone(),
                    });
                }
            }
        }

        DependencyGraph {
            graph,
            id_to_node,
            edges,
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.id_to_node.contains_key(id)
    }

    /// Dependency cycles: strongly connected components of size > 1, plus
    /// self-loops.
    pub fn cycles(&self) -> Vec<Vec<PackageId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || scc
                        .first()
                        .map_or(false, |&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|scc| scc.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .collect()
    }
}

/// Strict policy target: first registration-order candidate whose parsed
/// version satisfies the declared range.
fn strict_target(index: &PackageIndex, name: &str, range: &str) -> Option<PackageId> {
    let req = parse_range(range)?;
    for id in index.ids_for_name(name) {
        let Some(node) = index.get(id) else {
            continue;
        };
        let Ok(version) = Version::parse(&node.version) else {
            debug!("{}: installed version {:?} is not semver", id, node.version);
            continue;
        };
        if req.matches(&version) {
            return Some(id.clone());
        }
    }
    None
}

/// Parse a declared range. npm writes space-separated comparator sets
/// (`>=1.2.0 <2.0.0`); those are retried comma-normalized. Alternation
/// (`||`) stays unsupported.
fn parse_range(range: &str) -> Option<VersionReq> {
    if let Ok(req) = VersionReq::parse(range) {
        return Some(req);
    }
    if range.contains(' ') && !range.contains("||") {
        let normalized = range.split_whitespace().collect::<Vec<_>>().join(", ");
        if let Ok(req) = VersionReq::parse(&normalized) {
            return Some(req);
        }
    }
    debug!("unparseable version range {:?}", range);
    None
}
