//! Guided and uniform random walks.
//!
//! Walks are the workhorse of population seeding and mutation repair. At
//! each step the frontier is the unvisited neighbors whose incident edge
//! satisfies the bandwidth demand; a direct step to the destination is
//! always taken when available. The guided variant biases the choice toward
//! low-delay links by roulette over `1 / (1 + link_delay)`.

use crate::graph::{NetworkGraph, NodeId};
use rand::Rng;

/// Probability that a guided-walk step uses the delay-biased roulette
/// instead of a uniform draw.
pub const P_GUIDED: f64 = 0.7;

/// Default walk cap: `min(|V|, 2 · hop_distance(s, d))`, falling back to
/// `|V|` when the pair is disconnected.
pub fn default_max_len(graph: &NetworkGraph, source: NodeId, destination: NodeId) -> usize {
    let n = graph.node_count();
    match graph.hop_distance(source, destination) {
        Some(d) if d > 0 => n.min((2 * d).max(4)),
        _ => n,
    }
}

/// Delay-guided random walk. Returns `None` on a dead end or when the cap
/// is exhausted.
pub fn guided_walk<R: Rng>(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    demand: f64,
    max_len: usize,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    walk_impl(graph, source, destination, demand, max_len, true, rng)
}

/// Uniform random walk over the feasible frontier.
pub fn random_walk<R: Rng>(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    demand: f64,
    max_len: usize,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    walk_impl(graph, source, destination, demand, max_len, false, rng)
}

/// Walk between two interior nodes while avoiding a set of forbidden nodes.
/// Used by segment-replacement mutation; the forbidden set holds the rest of
/// the host path so the spliced result stays simple.
pub fn segment_walk<R: Rng>(
    graph: &NetworkGraph,
    from: NodeId,
    to: NodeId,
    demand: f64,
    forbidden: &[bool],
    max_len: usize,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    let mut visited = forbidden.to_vec();
    visited[from] = true;
    walk_from(graph, from, to, demand, max_len, true, &mut visited, rng)
}

fn walk_impl<R: Rng>(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    demand: f64,
    max_len: usize,
    guided: bool,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    if !graph.contains_node(source) || !graph.contains_node(destination) {
        return None;
    }
    let mut visited = vec![false; graph.node_count()];
    visited[source] = true;
    walk_from(graph, source, destination, demand, max_len, guided, &mut visited, rng)
}

#[allow(clippy::too_many_arguments)]
fn walk_from<R: Rng>(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    demand: f64,
    max_len: usize,
    guided: bool,
    visited: &mut [bool],
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    let mut path = vec![source];
    let mut current = source;

    for _ in 0..max_len {
        if current == destination {
            return Some(path);
        }

        let frontier: Vec<NodeId> = graph
            .neighbors(current)
            .iter()
            .copied()
            .filter(|&v| {
                !visited[v]
                    && (demand <= 0.0
                        || graph
                            .edge(current, v)
                            .is_some_and(|e| e.bandwidth >= demand))
            })
            .collect();

        if frontier.is_empty() {
            return None;
        }
        if frontier.contains(&destination) {
            path.push(destination);
            return Some(path);
        }

        let next = if guided && rng.random_range(0.0..1.0) < P_GUIDED {
            roulette_by_inverse_delay(graph, current, &frontier, rng)
        } else {
            frontier[rng.random_range(0..frontier.len())]
        };

        path.push(next);
        visited[next] = true;
        current = next;
    }

    None
}

fn roulette_by_inverse_delay<R: Rng>(
    graph: &NetworkGraph,
    current: NodeId,
    frontier: &[NodeId],
    rng: &mut R,
) -> NodeId {
    let weights: Vec<f64> = frontier
        .iter()
        .map(|&v| {
            let delay = graph.edge(current, v).map_or(1.0, |e| e.delay);
            1.0 / (1.0 + delay)
        })
        .collect();
    let total: f64 = weights.iter().sum();
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative >= threshold {
            return frontier[i];
        }
    }
    frontier[frontier.len() - 1] // floating-point fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::{diamond, line4};
    use crate::graph::NetworkGraph;
    use crate::random::create_rng;

    #[test]
    fn test_walk_on_line_finds_the_only_path() {
        let g = line4();
        let mut rng = create_rng(42);
        let path = guided_walk(&g, 0, 3, 100.0, g.node_count(), &mut rng)
            .expect("the line has a path");
        assert_eq!(path, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_walk_respects_bandwidth() {
        let g = diamond();
        let mut rng = create_rng(42);
        for _ in 0..50 {
            let path = random_walk(&g, 0, 3, 500.0, 10, &mut rng)
                .expect("wide route satisfies 500 Mbps");
            assert_eq!(path, vec![0, 2, 3], "only the wide route carries 500");
        }
    }

    #[test]
    fn test_walk_fails_when_infeasible() {
        let g = diamond();
        let mut rng = create_rng(42);
        assert!(guided_walk(&g, 0, 3, 900.0, 10, &mut rng).is_none());
    }

    #[test]
    fn test_walk_is_deterministic_per_seed() {
        let g = NetworkGraphFixture::medium();
        let a: Vec<_> = {
            let mut rng = create_rng(7);
            (0..10)
                .map(|_| guided_walk(&g, 0, g.node_count() - 1, 0.0, g.node_count(), &mut rng))
                .collect()
        };
        let b: Vec<_> = {
            let mut rng = create_rng(7);
            (0..10)
                .map(|_| guided_walk(&g, 0, g.node_count() - 1, 0.0, g.node_count(), &mut rng))
                .collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_segment_walk_avoids_forbidden_nodes() {
        let g = diamond();
        let mut rng = create_rng(1);
        let mut forbidden = vec![false; g.node_count()];
        forbidden[1] = true;
        let path = segment_walk(&g, 0, 3, 0.0, &forbidden, 10, &mut rng)
            .expect("route via 2 remains");
        assert_eq!(path, vec![0, 2, 3]);
    }

    #[test]
    fn test_default_max_len_bounds() {
        let g = line4();
        let cap = default_max_len(&g, 0, 3);
        assert!(cap >= 3 && cap <= g.node_count() + 2);
    }

    struct NetworkGraphFixture;
    impl NetworkGraphFixture {
        fn medium() -> NetworkGraph {
            NetworkGraph::generate(40, 0.15, 99).expect("generation succeeds")
        }
    }
}
