//! Structural path validation.
//!
//! A successful optimizer result must satisfy every check here; the
//! experiment harness re-validates independently of the algorithms.

use crate::graph::{NetworkGraph, NodeId};
use thiserror::Error;

/// A reason a candidate path is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathViolation {
    #[error("path has fewer than 2 nodes")]
    TooShort,

    #[error("path starts at {found}, expected {expected}")]
    WrongSource { expected: NodeId, found: NodeId },

    #[error("path ends at {found}, expected {expected}")]
    WrongDestination { expected: NodeId, found: NodeId },

    #[error("node {0} appears more than once")]
    RepeatedNode(NodeId),

    #[error("no edge between {0} and {1}")]
    MissingEdge(NodeId, NodeId),

    #[error("bottleneck bandwidth {found} Mbps below demand {required} Mbps")]
    BandwidthBelowDemand { found: f64, required: f64 },
}

/// Full check: simple-path structure, endpoints, edge existence, and the
/// bandwidth demand.
pub fn check_path(
    graph: &NetworkGraph,
    path: &[NodeId],
    source: NodeId,
    destination: NodeId,
    demand: f64,
) -> Result<(), PathViolation> {
    if path.len() < 2 {
        return Err(PathViolation::TooShort);
    }
    if path[0] != source {
        return Err(PathViolation::WrongSource {
            expected: source,
            found: path[0],
        });
    }
    let last = *path.last().expect("len checked above");
    if last != destination {
        return Err(PathViolation::WrongDestination {
            expected: destination,
            found: last,
        });
    }

    let mut seen = vec![false; graph.node_count()];
    for &v in path {
        if !graph.contains_node(v) {
            return Err(PathViolation::MissingEdge(v, v));
        }
        if seen[v] {
            return Err(PathViolation::RepeatedNode(v));
        }
        seen[v] = true;
    }

    let mut min_bw = f64::INFINITY;
    for pair in path.windows(2) {
        match graph.edge(pair[0], pair[1]) {
            Some(edge) => min_bw = min_bw.min(edge.bandwidth),
            None => return Err(PathViolation::MissingEdge(pair[0], pair[1])),
        }
    }
    if demand > 0.0 && min_bw < demand {
        return Err(PathViolation::BandwidthBelowDemand {
            found: min_bw,
            required: demand,
        });
    }
    Ok(())
}

/// Cheap structural check used inside operators: simple and connected, no
/// endpoint or bandwidth conditions.
pub fn is_simple_path(graph: &NetworkGraph, path: &[NodeId]) -> bool {
    if path.len() < 2 {
        return false;
    }
    let mut seen = vec![false; graph.node_count()];
    for &v in path {
        if !graph.contains_node(v) || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    path.windows(2).all(|pair| graph.has_edge(pair[0], pair[1]))
}
