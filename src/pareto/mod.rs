//! Pareto analysis and the k-path optimality benchmark.
//!
//! The weighted-sum optimizers return a single winner; this module provides
//! the auxiliary lenses: fast non-dominated sorting over `(delay,
//! 1 − reliability, resource_cost)` objective vectors, a diverse solution
//! pool for front extraction, and a bounded k-simple-path enumeration that
//! serves as the optimality benchmark (`gap = (algo − benchmark) /
//! benchmark`).
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"

use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::{evaluate, PathMetrics, Weights};
use crate::path::shortest::{shortest_path, EdgeWeightScheme};
use crate::path::yen::k_simple_paths;
use crate::random::create_rng;
use rand::Rng;
use std::collections::HashSet;

/// Result of fast non-dominated sorting.
///
/// `ranks[i]` is the Pareto rank of solution `i`; rank 0 is the front.
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    pub ranks: Vec<usize>,
    /// Indices grouped by front: `fronts[0]` holds the rank-0 indices.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sort (Deb et al., 2002). All objectives are
/// minimized. O(m·n²).
///
/// # Panics
/// Panics if `objectives` is empty.
pub fn non_dominated_sort(objectives: &[Vec<f64>]) -> NondominatedSortResult {
    let n = objectives.len();
    assert!(n > 0, "objectives must not be empty");

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];
    let mut front_0 = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            match objective_dominance(&objectives[i], &objectives[j]) {
                Some(true) => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Some(false) => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                None => {}
            }
        }
        if domination_count[i] == 0 {
            ranks[i] = 0;
            front_0.push(i);
        }
    }

    let mut fronts = vec![front_0];
    loop {
        let current = fronts.last().expect("fronts starts with front_0");
        let mut next = Vec::new();
        for &i in current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len();
                    next.push(j);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        fronts.push(next);
    }

    NondominatedSortResult { ranks, fronts }
}

/// `Some(true)` if `a` dominates `b`, `Some(false)` if `b` dominates `a`.
fn objective_dominance(a: &[f64], b: &[f64]) -> Option<bool> {
    let mut a_better = false;
    let mut b_better = false;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va < vb {
            a_better = true;
        } else if vb < va {
            b_better = true;
        }
    }
    match (a_better, b_better) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

/// A candidate solution in the Pareto pool.
#[derive(Debug, Clone)]
pub struct ParetoSolution {
    pub path: Vec<NodeId>,
    pub metrics: PathMetrics,
    /// How many pool members dominate this one (0 on the front).
    pub domination_count: usize,
}

/// Front extraction over a diverse solution pool.
#[derive(Debug, Clone)]
pub struct ParetoAnalysis {
    /// The non-dominated solutions.
    pub front: Vec<ParetoSolution>,
    /// Every distinct solution generated, front members included.
    pub pool: Vec<ParetoSolution>,
}

/// Builds a diverse solution pool between `source` and `destination` and
/// extracts its dominance front.
///
/// Pool strategies: the four single-scheme shortest paths, a seeded sweep of
/// random weight mixes over per-edge weighted Dijkstra, and the k-simple-path
/// enumeration by delay.
pub fn pareto_front(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    demand: f64,
    n_random_sweeps: usize,
    k_paths: usize,
    seed: u64,
) -> ParetoAnalysis {
    let mut paths: Vec<Vec<NodeId>> = Vec::new();
    let mut seen: HashSet<Vec<NodeId>> = HashSet::new();
    let mut push = |path: Vec<NodeId>, paths: &mut Vec<Vec<NodeId>>| {
        if path.len() >= 2 && seen.insert(path.clone()) {
            paths.push(path);
        }
    };

    for scheme in [
        EdgeWeightScheme::Hops,
        EdgeWeightScheme::Delay,
        EdgeWeightScheme::NegLogReliability,
        EdgeWeightScheme::InverseBandwidth,
    ] {
        if let Some(path) = shortest_path(graph, source, destination, scheme, demand) {
            push(path, &mut paths);
        }
    }

    let mut rng = create_rng(seed);
    for _ in 0..n_random_sweeps {
        let weights = random_weights(&mut rng);
        if let Some(path) = mixed_cost_dijkstra(graph, source, destination, &weights, demand) {
            push(path, &mut paths);
        }
    }

    for (path, _) in k_simple_paths(graph, source, destination, demand, k_paths, EdgeWeightScheme::Delay)
    {
        push(path, &mut paths);
    }

    let balanced = Weights::balanced();
    let pool_metrics: Vec<PathMetrics> = paths
        .iter()
        .map(|p| evaluate(graph, p, &balanced, 0.0).metrics)
        .collect();
    let objectives: Vec<Vec<f64>> = pool_metrics
        .iter()
        .map(|m| vec![m.total_delay, 1.0 - m.total_reliability, m.resource_cost])
        .collect();

    if objectives.is_empty() {
        return ParetoAnalysis {
            front: Vec::new(),
            pool: Vec::new(),
        };
    }

    let mut domination_counts = vec![0usize; objectives.len()];
    for i in 0..objectives.len() {
        for j in 0..objectives.len() {
            if i != j && objective_dominance(&objectives[j], &objectives[i]) == Some(true) {
                domination_counts[i] += 1;
            }
        }
    }

    let pool: Vec<ParetoSolution> = paths
        .into_iter()
        .zip(pool_metrics)
        .zip(domination_counts)
        .map(|((path, metrics), domination_count)| ParetoSolution {
            path,
            metrics,
            domination_count,
        })
        .collect();

    let front = pool
        .iter()
        .filter(|s| s.domination_count == 0)
        .cloned()
        .collect();

    ParetoAnalysis { front, pool }
}

/// Per-edge weighted Dijkstra used by the random weight sweeps: each edge
/// costs the weighted sum of its normalized delay, unreliability, and
/// inverse bandwidth.
fn mixed_cost_dijkstra(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    weights: &Weights,
    demand: f64,
) -> Option<Vec<NodeId>> {
    use std::cmp::Ordering;
    use std::collections::BinaryHeap;

    #[derive(PartialEq)]
    struct Entry(f64, NodeId);
    impl Eq for Entry {}
    impl Ord for Entry {
        fn cmp(&self, other: &Self) -> Ordering {
            other
                .0
                .partial_cmp(&self.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| other.1.cmp(&self.1))
        }
    }
    impl PartialOrd for Entry {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    let n = graph.node_count();
    if source >= n || destination >= n {
        return None;
    }
    let mut dist = vec![f64::INFINITY; n];
    let mut prev = vec![usize::MAX; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    heap.push(Entry(0.0, source));

    while let Some(Entry(cost, node)) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        if node == destination {
            break;
        }
        for &next in graph.neighbors(node) {
            if settled[next] {
                continue;
            }
            let edge = graph
                .edge(node, next)
                .expect("neighbor cache is consistent with edge set");
            if demand > 0.0 && edge.bandwidth < demand {
                continue;
            }
            let step = weights.delay * (edge.delay / 200.0)
                + weights.reliability * ((1.0 - edge.reliability) * 10.0)
                + weights.resource * ((1000.0 / edge.bandwidth.max(1.0)) / 200.0);
            let candidate = cost + step;
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = node;
                heap.push(Entry(candidate, next));
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
    Some(path)
}

/// A random point on the weight simplex (normalized exponentials, the
/// Dirichlet(1,1,1) construction).
fn random_weights<R: Rng>(rng: &mut R) -> Weights {
    let a: f64 = -rng.random_range(1e-9..1.0f64).ln();
    let b: f64 = -rng.random_range(1e-9..1.0f64).ln();
    let c: f64 = -rng.random_range(1e-9..1.0f64).ln();
    let total = a + b + c;
    Weights {
        delay: a / total,
        reliability: b / total,
        resource: 1.0 - a / total - b / total,
    }
}

/// Best path under the kernel cost among the `k` delay-cheapest simple
/// paths. The benchmark the optimality gap is measured against.
pub fn k_path_benchmark(
    graph: &NetworkGraph,
    source: NodeId,
    destination: NodeId,
    weights: &Weights,
    demand: f64,
    k: usize,
) -> Option<(Vec<NodeId>, f64)> {
    k_simple_paths(graph, source, destination, demand, k, EdgeWeightScheme::Delay)
        .into_iter()
        .map(|(path, _)| {
            let cost = evaluate(graph, &path, weights, demand).cost;
            (path, cost)
        })
        .filter(|(_, cost)| cost.is_finite())
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// `(algo − benchmark) / benchmark`; 0 means the algorithm matched the
/// enumeration, negative means it beat the bounded benchmark.
pub fn optimality_gap(algorithm_cost: f64, benchmark_cost: f64) -> f64 {
    if benchmark_cost <= 0.0 {
        return 0.0;
    }
    (algorithm_cost - benchmark_cost) / benchmark_cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::{diamond, tradeoff};
    use crate::graph::NetworkGraph;

    #[test]
    fn test_sort_single_solution() {
        let result = non_dominated_sort(&[vec![1.0, 2.0]]);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts.len(), 1);
    }

    #[test]
    fn test_sort_chain_of_dominance() {
        let objectives = vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ];
        let result = non_dominated_sort(&objectives);
        assert_eq!(result.ranks, vec![0, 1, 2]);
        assert_eq!(result.fronts.len(), 3);
    }

    #[test]
    fn test_sort_mixed_fronts() {
        let objectives = vec![
            vec![1.0, 5.0],
            vec![3.0, 3.0],
            vec![5.0, 1.0],
            vec![4.0, 4.0], // dominated by (3,3)
            vec![6.0, 6.0], // dominated by (4,4) too
        ];
        let result = non_dominated_sort(&objectives);
        assert_eq!(result.ranks[0], 0);
        assert_eq!(result.ranks[1], 0);
        assert_eq!(result.ranks[2], 0);
        assert_eq!(result.ranks[3], 1);
        assert_eq!(result.ranks[4], 2);
    }

    #[test]
    fn test_sort_identical_solutions_share_front() {
        let objectives = vec![vec![2.0, 2.0]; 3];
        let result = non_dominated_sort(&objectives);
        assert!(result.ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_front_on_tradeoff_graph() {
        let g = tradeoff();
        let analysis = pareto_front(&g, 0, 3, 0.0, 10, 20, 42);
        assert!(!analysis.pool.is_empty());
        // Fast-lossy and slow-reliable are mutually non-dominating: both on
        // the front.
        let front_paths: Vec<&Vec<NodeId>> =
            analysis.front.iter().map(|s| &s.path).collect();
        assert!(front_paths.contains(&&vec![0, 1, 3]));
        assert!(front_paths.contains(&&vec![0, 2, 3]));
        for s in &analysis.front {
            assert_eq!(s.domination_count, 0);
        }
    }

    #[test]
    fn test_front_is_deterministic() {
        let g = NetworkGraph::generate(30, 0.2, 4).expect("generation succeeds");
        let a = pareto_front(&g, 0, 29, 0.0, 15, 30, 7);
        let b = pareto_front(&g, 0, 29, 0.0, 15, 30, 7);
        assert_eq!(a.pool.len(), b.pool.len());
        for (x, y) in a.front.iter().zip(&b.front) {
            assert_eq!(x.path, y.path);
        }
    }

    #[test]
    fn test_k_path_benchmark_beats_or_matches_heuristics() {
        let g = diamond();
        let w = Weights::new(0.0, 0.0, 1.0).unwrap();
        let (path, cost) =
            k_path_benchmark(&g, 0, 3, &w, 500.0, 10).expect("feasible route exists");
        assert_eq!(path, vec![0, 2, 3]);
        assert!(cost.is_finite());
    }

    #[test]
    fn test_optimality_gap() {
        assert!((optimality_gap(0.5, 0.4) - 0.25).abs() < 1e-12);
        assert_eq!(optimality_gap(0.4, 0.4), 0.0);
        assert!(optimality_gap(0.3, 0.4) < 0.0);
        assert_eq!(optimality_gap(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_random_weights_on_simplex() {
        let mut rng = create_rng(42);
        for _ in 0..100 {
            let w = random_weights(&mut rng);
            assert!(w.validate().is_ok(), "sampled weights must be valid: {w:?}");
        }
    }
}
