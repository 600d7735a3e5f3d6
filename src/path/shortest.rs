//! Weighted shortest paths with a shared LRU cache.
//!
//! Dijkstra over one of four edge-weight schemes, restricted to edges that
//! satisfy the bandwidth demand. [`SpCache`] is the process-wide cache from
//! the shared-resource policy: interior mutability under a mutex, bounded at
//! 5000 entries, keyed by `(source, destination, scheme, demand)`.
//! Concurrent misses are benign — both callers compute the same path and the
//! last insert wins.

use crate::graph::{EdgeAttrs, NetworkGraph, NodeId};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Mutex;

/// Edge-weight schemes selectable for shortest-path queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeWeightScheme {
    /// Uniform weight 1 — hop count.
    Hops,
    /// Link delay in milliseconds.
    Delay,
    /// `−ln(link_reliability)` — a shortest path maximizes reliability.
    NegLogReliability,
    /// `1000 / bandwidth` — penalizes narrow links.
    InverseBandwidth,
}

impl EdgeWeightScheme {
    pub fn weight(&self, edge: &EdgeAttrs) -> f64 {
        match self {
            Self::Hops => 1.0,
            Self::Delay => edge.delay,
            Self::NegLogReliability => -edge.reliability.max(1e-3).ln(),
            Self::InverseBandwidth => 1000.0 / edge.bandwidth.max(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    cost: f64,
    node: NodeId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.node == other.node
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost; node id as the deterministic tie-break.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra from `source` to `destination` under a weight scheme, using only
/// edges with `bandwidth >= demand`. Returns the path and its weight sum.
pub fn shortest_path_with_cost(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    scheme: EdgeWeightScheme,
    demand: f64,
) -> Option<(Vec<NodeId>, f64)> {
    shortest_path_filtered(graph, source, destination, scheme, demand, |_, _| true)
}

/// Dijkstra variant with an extra edge predicate, used by Yen's spur search.
pub fn shortest_path_filtered<F>(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    scheme: EdgeWeightScheme,
    demand: f64,
    admit: F,
) -> Option<(Vec<NodeId>, f64)>
where
    F: Fn(NodeId, NodeId) -> bool,
{
    if !graph.contains_node(source) || !graph.contains_node(destination) {
        return None;
    }
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev = vec![usize::MAX; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    heap.push(HeapEntry {
        cost: 0.0,
        node: source,
    });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        if node == destination {
            break;
        }
        for &next in graph.neighbors(node) {
            if settled[next] || !admit(node, next) {
                continue;
            }
            let edge = graph
                .edge(node, next)
                .expect("neighbor cache is consistent with edge set");
            if demand > 0.0 && edge.bandwidth < demand {
                continue;
            }
            let candidate = cost + scheme.weight(edge);
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = node;
                heap.push(HeapEntry {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    if dist[destination].is_infinite() {
        return None;
    }
    let mut path = vec![destination];
    let mut node = destination;
    while node != source {
        node = prev[node];
        path.push(node);
    }
    path.reverse();
    Some((path, dist[destination]))
}

/// Convenience wrapper without the cost.
pub fn shortest_path(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    scheme: EdgeWeightScheme,
    demand: f64,
) -> Option<Vec<NodeId>> {
    shortest_path_with_cost(graph, source, destination, scheme, demand).map(|(p, _)| p)
}

type CacheKey = (NodeId, NodeId, EdgeWeightScheme, u64);

struct CacheInner {
    entries: FxHashMap<CacheKey, (Option<Vec<NodeId>>, u64)>,
    tick: u64,
}

/// Bounded LRU cache for shortest-path queries.
///
/// Negative results (no path) are cached too — a disconnected pair is the
/// expensive case worth remembering.
pub struct SpCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

pub const SP_CACHE_CAPACITY: usize = 5000;

impl Default for SpCache {
    fn default() -> Self {
        Self::with_capacity(SP_CACHE_CAPACITY)
    }
}

impl SpCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: FxHashMap::default(),
                tick: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Cached shortest-path lookup.
    pub fn shortest_path(
        &self,
        graph: &NetworkGraph,
        source: NodeId,
        destination: NodeId,
        scheme: EdgeWeightScheme,
        demand: f64,
    ) -> Option<Vec<NodeId>> {
        let key = (source, destination, scheme, demand.to_bits());

        {
            let mut inner = self.inner.lock().expect("sp-cache mutex not poisoned");
            inner.tick += 1;
            let tick = inner.tick;
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.1 = tick;
                return entry.0.clone();
            }
        }

        // Miss: compute outside the lock so concurrent misses don't serialize
        // the Dijkstra work.
        let result = shortest_path(graph, source, destination, scheme, demand);

        let mut inner = self.inner.lock().expect("sp-cache mutex not poisoned");
        inner.tick += 1;
        let tick = inner.tick;
        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(&key) {
            if let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.1)
                .map(|(k, _)| *k)
            {
                inner.entries.remove(&oldest);
            }
        }
        inner.entries.insert(key, (result.clone(), tick));
        result
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("sp-cache mutex not poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("sp-cache mutex not poisoned");
        inner.entries.clear();
        inner.tick = 0;
    }
}
