//! Yen's k shortest simple paths.
//!
//! Enumerates simple paths between two nodes in non-decreasing order of the
//! chosen edge-weight scheme, restricted to edges that satisfy the bandwidth
//! demand. The ordering guarantee is what the k-path benchmark and the
//! prefix-stability property rely on; a plain DFS enumerator would deliver
//! paths in topological order instead.
//!
//! # Reference
//!
//! Yen, J. Y. (1971). "Finding the k shortest loopless paths in a network",
//! *Management Science* 17(11), 712-716.

use super::shortest::{shortest_path_filtered, shortest_path_with_cost, EdgeWeightScheme};
use crate::graph::{NetworkGraph, NodeId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Hard ceiling on `k`; enumeration beyond this is never useful for the
/// benchmark and guards against runaway callers.
pub const K_MAX: usize = 500;

#[derive(Debug, Clone)]
struct Candidate {
    cost: f64,
    path: Vec<NodeId>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.path == other.path
    }
}
impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost; lexicographic path order as a deterministic
        // tie-break.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.path.cmp(&self.path))
    }
}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The `k` cheapest simple paths from `source` to `destination` under
/// `scheme`, every edge carrying at least `demand` Mbps.
///
/// Returns fewer than `k` paths when the graph runs out. Paths are returned
/// with their weight sums, sorted ascending; truncating to any prefix gives
/// the same result as asking for a smaller `k`.
pub fn k_simple_paths(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    demand: f64,
    k: usize,
    scheme: EdgeWeightScheme,
) -> Vec<(Vec<NodeId>, f64)> {
    let k = k.min(K_MAX);
    if k == 0 || source == destination {
        return Vec::new();
    }

    let Some(first) = shortest_path_with_cost(graph, source, destination, scheme, demand) else {
        return Vec::new();
    };

    let mut accepted: Vec<(Vec<NodeId>, f64)> = vec![first];
    let mut candidates: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut seen: HashSet<Vec<NodeId>> = HashSet::new();
    seen.insert(accepted[0].0.clone());

    while accepted.len() < k {
        let (prev_path, _) = accepted
            .last()
            .expect("accepted starts non-empty")
            .clone();

        // Each node of the previous path (bar the terminal) spawns a spur.
        for spur_idx in 0..prev_path.len() - 1 {
            let spur_node = prev_path[spur_idx];
            let root = &prev_path[..=spur_idx];

            // Edges leaving the spur node along any accepted path sharing
            // this root are banned, as are the root's internal nodes.
            let mut banned_edges: HashSet<(NodeId, NodeId)> = HashSet::new();
            for (path, _) in &accepted {
                if path.len() > spur_idx && path[..=spur_idx] == *root {
                    let (a, b) = (path[spur_idx], path[spur_idx + 1]);
                    banned_edges.insert((a.min(b), a.max(b)));
                }
            }
            let banned_nodes: HashSet<NodeId> = root[..spur_idx].iter().copied().collect();

            let spur = shortest_path_filtered(
                graph,
                spur_node,
                destination,
                scheme,
                demand,
                |u, v| {
                    !banned_nodes.contains(&u)
                        && !banned_nodes.contains(&v)
                        && !banned_edges.contains(&(u.min(v), u.max(v)))
                },
            );

            if let Some((spur_path, _)) = spur {
                let mut total: Vec<NodeId> = root[..spur_idx].to_vec();
                total.extend_from_slice(&spur_path);
                if seen.insert(total.clone()) {
                    let cost = path_cost(graph, &total, scheme);
                    candidates.push(Candidate { cost, path: total });
                }
            }
        }

        match candidates.pop() {
            Some(Candidate { cost, path }) => accepted.push((path, cost)),
            None => break,
        }
    }

    accepted
}

fn path_cost(graph: &NetworkGraph, path: &[NodeId], scheme: EdgeWeightScheme) -> f64 {
    path.windows(2)
        .map(|pair| {
            scheme.weight(
                graph
                    .edge(pair[0], pair[1])
                    .expect("spur concatenation only uses existing edges"),
            )
        })
        .sum()
}
