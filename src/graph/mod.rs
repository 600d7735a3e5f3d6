//! Network topology model.
//!
//! [`NetworkGraph`] is an undirected graph with QoS attributes on nodes and
//! edges. It is built once — from the CSV deck loaders in [`loader`] or the
//! seeded Erdős–Rényi generator — and is logically read-only for the
//! duration of any optimizer call. The only sanctioned mutation is
//! [`NetworkGraph::remove_edge`] between calls (chaos testing); after it the
//! graph may be disconnected, which optimizers must answer with a `NoPath`
//! failure rather than a panic.

mod loader;

pub use loader::{load_deck, write_deck, DemandPair};

use crate::error::RouteError;
use crate::random::create_rng;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Node identifier. Nodes are contiguous `0..node_count()`.
pub type NodeId = usize;

/// Attribute ranges used by the random generator and sanity-checked by the
/// loaders.
pub const PROCESSING_DELAY_RANGE: (f64, f64) = (0.5, 2.0);
pub const NODE_RELIABILITY_RANGE: (f64, f64) = (0.95, 0.999);
pub const BANDWIDTH_RANGE: (f64, f64) = (100.0, 1000.0);
pub const LINK_DELAY_RANGE: (f64, f64) = (3.0, 15.0);
pub const LINK_RELIABILITY_RANGE: (f64, f64) = (0.95, 0.999);

/// Per-node QoS attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAttrs {
    /// Processing delay in milliseconds.
    pub processing_delay: f64,
    /// Probability the node forwards correctly.
    pub reliability: f64,
}

/// Per-edge QoS attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAttrs {
    /// Capacity in Mbps.
    pub bandwidth: f64,
    /// Link delay in milliseconds.
    pub delay: f64,
    /// Probability the link delivers correctly.
    pub reliability: f64,
}

/// Undirected QoS topology with a neighbor cache.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    nodes: Vec<NodeAttrs>,
    edges: FxHashMap<(NodeId, NodeId), EdgeAttrs>,
    adjacency: Vec<Vec<NodeId>>,
}

fn edge_key(u: NodeId, v: NodeId) -> (NodeId, NodeId) {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

impl NetworkGraph {
    /// Builds a graph from node attributes and an edge list.
    ///
    /// Edge endpoints must reference existing nodes; self-loops and duplicate
    /// edges are rejected.
    pub fn from_parts(
        nodes: Vec<NodeAttrs>,
        edge_list: Vec<(NodeId, NodeId, EdgeAttrs)>,
    ) -> Result<Self, RouteError> {
        let n = nodes.len();
        let mut edges = FxHashMap::default();
        let mut adjacency = vec![Vec::new(); n];

        for (u, v, attrs) in edge_list {
            if u >= n || v >= n {
                return Err(RouteError::Graph(format!(
                    "edge ({u}, {v}) references a node outside 0..{n}"
                )));
            }
            if u == v {
                return Err(RouteError::Graph(format!("self-loop on node {u}")));
            }
            if edges.insert(edge_key(u, v), attrs).is_some() {
                return Err(RouteError::Graph(format!("duplicate edge ({u}, {v})")));
            }
            adjacency[u].push(v);
            adjacency[v].push(u);
        }

        for nbrs in &mut adjacency {
            nbrs.sort_unstable();
        }

        Ok(Self {
            nodes,
            edges,
            adjacency,
        })
    }

    /// Generates a connected Erdős–Rényi `G(n, p)` topology with attributes
    /// drawn uniformly from the documented ranges.
    ///
    /// Retries with incremented seeds until the sample is connected; as a
    /// last resort splices the components together with bridge edges.
    pub fn generate(n: usize, p: f64, seed: u64) -> Result<Self, RouteError> {
        if n < 2 {
            return Err(RouteError::InvalidInput(
                "node count must be at least 2".into(),
            ));
        }
        if !(0.0 < p && p <= 1.0) {
            return Err(RouteError::InvalidInput(format!(
                "connection probability must be in (0, 1], got {p}"
            )));
        }

        const MAX_ATTEMPTS: u64 = 100;
        for attempt in 0..MAX_ATTEMPTS {
            let graph = Self::sample_gnp(n, p, seed.wrapping_add(attempt));
            if graph.is_connected() {
                return Ok(graph);
            }
        }

        // Connectivity was never sampled; bridge the components of the
        // original sample instead.
        let mut graph = Self::sample_gnp(n, p, seed);
        let mut rng = create_rng(seed ^ 0x5bd1_e995);
        let components = graph.connected_components();
        for pair in components.windows(2) {
            let u = pair[0][0];
            let v = pair[1][0];
            graph.insert_edge(u, v, random_edge_attrs(&mut rng));
        }
        Ok(graph)
    }

    fn sample_gnp(n: usize, p: f64, seed: u64) -> Self {
        let mut rng = create_rng(seed);
        let nodes: Vec<NodeAttrs> = (0..n)
            .map(|_| NodeAttrs {
                processing_delay: rng
                    .random_range(PROCESSING_DELAY_RANGE.0..PROCESSING_DELAY_RANGE.1),
                reliability: rng.random_range(NODE_RELIABILITY_RANGE.0..NODE_RELIABILITY_RANGE.1),
            })
            .collect();

        let mut edges = FxHashMap::default();
        let mut adjacency = vec![Vec::new(); n];
        for u in 0..n {
            for v in (u + 1)..n {
                if rng.random_range(0.0..1.0) < p {
                    edges.insert((u, v), random_edge_attrs(&mut rng));
                    adjacency[u].push(v);
                    adjacency[v].push(u);
                }
            }
        }

        Self {
            nodes,
            edges,
            adjacency,
        }
    }

    fn insert_edge(&mut self, u: NodeId, v: NodeId, attrs: EdgeAttrs) {
        let key = edge_key(u, v);
        if self.edges.insert(key, attrs).is_none() {
            self.adjacency[u].push(v);
            self.adjacency[v].push(u);
            self.adjacency[u].sort_unstable();
            self.adjacency[v].sort_unstable();
        }
    }

    /// Removes an edge (chaos testing). Returns whether the edge existed.
    ///
    /// Must only be called between optimizer calls; the graph is shared
    /// read-only during a call.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        if self.edges.remove(&edge_key(u, v)).is_some() {
            self.adjacency[u].retain(|&x| x != v);
            self.adjacency[v].retain(|&x| x != u);
            true
        } else {
            false
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, v: NodeId) -> bool {
        v < self.nodes.len()
    }

    /// Node attributes. Panics on an unknown id; callers validate ids at the
    /// optimizer boundary.
    pub fn node(&self, v: NodeId) -> &NodeAttrs {
        &self.nodes[v]
    }

    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<&EdgeAttrs> {
        self.edges.get(&edge_key(u, v))
    }

    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.edges.contains_key(&edge_key(u, v))
    }

    /// Neighbors of `v`, sorted ascending. The slice is the neighbor cache —
    /// no allocation per call.
    pub fn neighbors(&self, v: NodeId) -> &[NodeId] {
        &self.adjacency[v]
    }

    /// Iterates all edges as `(u, v, attrs)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &EdgeAttrs)> {
        self.edges.iter().map(|(&(u, v), attrs)| (u, v, attrs))
    }

    pub fn average_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        2.0 * self.edges.len() as f64 / self.nodes.len() as f64
    }

    /// BFS reachability, optionally restricted to edges with
    /// `bandwidth >= demand`.
    pub fn has_path(&self, source: NodeId, destination: NodeId, demand: f64) -> bool {
        if !self.contains_node(source) || !self.contains_node(destination) {
            return false;
        }
        if source == destination {
            return true;
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        visited[source] = true;
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &v in self.neighbors(u) {
                if visited[v] {
                    continue;
                }
                if demand > 0.0 {
                    let bw = self.edge(u, v).map_or(0.0, |e| e.bandwidth);
                    if bw < demand {
                        continue;
                    }
                }
                if v == destination {
                    return true;
                }
                visited[v] = true;
                queue.push_back(v);
            }
        }
        false
    }

    /// Hop distance between two nodes, ignoring bandwidth.
    pub fn hop_distance(&self, source: NodeId, destination: NodeId) -> Option<usize> {
        if !self.contains_node(source) || !self.contains_node(destination) {
            return None;
        }
        if source == destination {
            return Some(0);
        }
        let mut dist = vec![usize::MAX; self.nodes.len()];
        let mut queue = VecDeque::new();
        dist[source] = 0;
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &v in self.neighbors(u) {
                if dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    if v == destination {
                        return Some(dist[v]);
                    }
                    queue.push_back(v);
                }
            }
        }
        None
    }

    pub fn is_connected(&self) -> bool {
        match self.nodes.len() {
            0 => true,
            _ => self.connected_components().len() == 1,
        }
    }

    fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut components = Vec::new();
        for start in 0..n {
            if visited[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::new();
            visited[start] = true;
            queue.push_back(start);
            while let Some(u) = queue.pop_front() {
                component.push(u);
                for &v in self.neighbors(u) {
                    if !visited[v] {
                        visited[v] = true;
                        queue.push_back(v);
                    }
                }
            }
            components.push(component);
        }
        components
    }
}

fn random_edge_attrs<R: Rng>(rng: &mut R) -> EdgeAttrs {
    EdgeAttrs {
        bandwidth: rng.random_range(BANDWIDTH_RANGE.0..BANDWIDTH_RANGE.1),
        delay: rng.random_range(LINK_DELAY_RANGE.0..LINK_DELAY_RANGE.1),
        reliability: rng.random_range(LINK_RELIABILITY_RANGE.0..LINK_RELIABILITY_RANGE.1),
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    /// A 4-node line 0–1–2–3 with uniform edges.
    pub fn line4() -> NetworkGraph {
        let nodes = vec![
            NodeAttrs {
                processing_delay: 1.0,
                reliability: 0.99,
            };
            4
        ];
        let edge = EdgeAttrs {
            bandwidth: 500.0,
            delay: 10.0,
            reliability: 0.99,
        };
        NetworkGraph::from_parts(nodes, vec![(0, 1, edge), (1, 2, edge), (2, 3, edge)])
            .expect("line4 fixture is well-formed")
    }

    /// Two disjoint 2-hop routes S=0 → D=3: via node 1 (narrow) and via
    /// node 2 (wide). Bandwidths are 200 on the narrow route, 800 on the
    /// wide one.
    pub fn diamond() -> NetworkGraph {
        let nodes = vec![
            NodeAttrs {
                processing_delay: 1.0,
                reliability: 0.99,
            };
            4
        ];
        let narrow = EdgeAttrs {
            bandwidth: 200.0,
            delay: 5.0,
            reliability: 0.99,
        };
        let wide = EdgeAttrs {
            bandwidth: 800.0,
            delay: 8.0,
            reliability: 0.99,
        };
        NetworkGraph::from_parts(
            nodes,
            vec![(0, 1, narrow), (1, 3, narrow), (0, 2, wide), (2, 3, wide)],
        )
        .expect("diamond fixture is well-formed")
    }

    /// Fast-but-lossy direct route (0–1–3) vs slow-but-reliable detour
    /// (0–2–3).
    pub fn tradeoff() -> NetworkGraph {
        let nodes = vec![
            NodeAttrs {
                processing_delay: 1.0,
                reliability: 0.999,
            };
            4
        ];
        let lossy = EdgeAttrs {
            bandwidth: 500.0,
            delay: 4.0,
            reliability: 0.80,
        };
        let reliable = EdgeAttrs {
            bandwidth: 500.0,
            delay: 14.0,
            reliability: 0.999,
        };
        NetworkGraph::from_parts(
            nodes,
            vec![(0, 1, lossy), (1, 3, lossy), (0, 2, reliable), (2, 3, reliable)],
        )
        .expect("tradeoff fixture is well-formed")
    }
}
