//! Test-case decks.
//!
//! Two deck builders: the fixed 25-scenario deck (node pairs placed relative
//! to the graph size, bandwidth tiers from permissive to maximal, the ten
//! weight scenarios) and a seeded random deck with distance-stratified
//! source/destination pairs. Both are pure functions of their inputs —
//! regeneration yields an identical deck.

use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::Weights;
use crate::random::create_rng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One (S, D, B, weights) scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u32,
    pub source: NodeId,
    pub destination: NodeId,
    pub bandwidth_requirement: f64,
    pub weights: Weights,
    pub description: String,
}

/// Bandwidth tiers in Mbps, permissive to maximal.
pub const BANDWIDTH_TIERS: [f64; 10] = [
    100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0, 1000.0,
];

/// The ten weight scenarios: single-objective, pairwise, balanced, skewed.
pub fn weight_scenarios() -> Vec<(Weights, &'static str)> {
    vec![
        (weights(1.0, 0.0, 0.0), "delay only"),
        (weights(0.0, 1.0, 0.0), "reliability only"),
        (weights(0.0, 0.0, 1.0), "resource only"),
        (weights(0.5, 0.5, 0.0), "delay + reliability"),
        (weights(0.5, 0.0, 0.5), "delay + resource"),
        (weights(0.0, 0.5, 0.5), "reliability + resource"),
        (Weights::balanced(), "balanced"),
        (weights(0.6, 0.2, 0.2), "delay first"),
        (weights(0.2, 0.6, 0.2), "reliability first"),
        (weights(0.2, 0.2, 0.6), "resource first"),
    ]
}

fn weights(delay: f64, reliability: f64, resource: f64) -> Weights {
    Weights::new(delay, reliability, resource).expect("scenario weights sum to 1")
}

/// The fixed 25-scenario deck. Node pairs are placed relative to the graph
/// size so the deck adapts from toy fixtures to the full 250-node topology.
pub fn predefined_cases(graph: &NetworkGraph) -> Vec<TestCase> {
    let n = graph.node_count();
    let at = |fraction: f64| -> NodeId {
        (((n - 1) as f64 * fraction).round() as NodeId).min(n - 1)
    };
    let scenarios = weight_scenarios();
    let scenario = |idx: usize| scenarios[idx % scenarios.len()].clone();

    // (source fraction, destination fraction, bandwidth, scenario index)
    let layout: [(f64, f64, f64, usize); 25] = [
        // Permissive tiers: most routes qualify.
        (0.0, 1.0, 100.0, 6),
        (0.0, 0.5, 150.0, 7),
        (0.25, 0.75, 200.0, 8),
        (0.05, 0.95, 100.0, 9),
        (0.2, 0.8, 150.0, 0),
        // Mid tiers.
        (0.0, 1.0, 300.0, 6),
        (0.1, 0.9, 400.0, 1),
        (0.4, 0.6, 350.0, 3),
        (0.3, 0.7, 450.0, 2),
        (0.12, 0.88, 500.0, 7),
        // Demanding tiers: some routes drop out.
        (0.0, 1.0, 600.0, 6),
        (0.02, 0.98, 650.0, 7),
        (0.45, 0.55, 700.0, 8),
        (0.24, 0.76, 750.0, 4),
        (0.32, 0.68, 800.0, 5),
        // Near-maximal tiers: only the best links survive.
        (0.0, 1.0, 850.0, 6),
        (0.0, 0.4, 900.0, 0),
        (0.4, 1.0, 950.0, 1),
        (0.25, 0.5, 1000.0, 2),
        (0.0, 0.25, 1000.0, 6),
        // Edge scenarios: adjacent-index pairs, baseline and stress.
        (0.0, 0.01, 100.0, 6),
        (0.0, 0.01, 1000.0, 6),
        (0.5, 0.51, 500.0, 6),
        (0.01, 0.99, 300.0, 7),
        (0.33, 0.67, 700.0, 9),
    ];

    layout
        .iter()
        .enumerate()
        .map(|(i, &(sf, df, bandwidth, scenario_idx))| {
            let source = at(sf);
            let mut destination = at(df);
            if destination == source {
                destination = (source + 1) % n;
            }
            let (w, name) = scenario(scenario_idx);
            TestCase {
                id: i as u32 + 1,
                source,
                destination,
                bandwidth_requirement: bandwidth,
                weights: w,
                description: format!("S={source} -> D={destination}, B={bandwidth}Mbps, {name}"),
            }
        })
        .collect()
}

/// A seeded random deck of `n_cases` scenarios with distance-stratified
/// pairs (roughly a third each of short, medium, and long routes).
pub fn generate_cases(graph: &NetworkGraph, n_cases: usize, master_seed: u64) -> Vec<TestCase> {
    let scenarios = weight_scenarios();
    let pairs = stratified_pairs(graph, n_cases, master_seed);

    pairs
        .into_iter()
        .enumerate()
        .map(|(i, (source, destination))| {
            let (w, name) = scenarios[i % scenarios.len()].clone();
            let bandwidth = BANDWIDTH_TIERS[i % BANDWIDTH_TIERS.len()];
            TestCase {
                id: i as u32 + 1,
                source,
                destination,
                bandwidth_requirement: bandwidth,
                weights: w,
                description: format!("S={source} -> D={destination}, B={bandwidth}Mbps, {name}"),
            }
        })
        .collect()
}

/// Samples distinct (S, D) pairs, filling short / medium / long distance
/// buckets before topping up unconditionally.
fn stratified_pairs(
    graph: &NetworkGraph,
    n_pairs: usize,
    master_seed: u64,
) -> Vec<(NodeId, NodeId)> {
    let n = graph.node_count();
    let mut rng = create_rng(master_seed);
    let bucket_target = n_pairs.div_ceil(3);

    let mut pairs: Vec<(NodeId, NodeId)> = Vec::with_capacity(n_pairs);
    let mut counts = [0usize; 3]; // short, medium, long
    let mut attempts = 0usize;

    while pairs.len() < n_pairs && attempts < 1000 {
        attempts += 1;
        let source = rng.random_range(0..n);
        let destination = rng.random_range(0..n);
        if source == destination || pairs.contains(&(source, destination)) {
            continue;
        }
        let Some(distance) = graph.hop_distance(source, destination) else {
            continue;
        };
        let bucket = match distance {
            0..=2 => 0,
            3..=5 => 1,
            _ => 2,
        };
        if counts[bucket] < bucket_target {
            counts[bucket] += 1;
            pairs.push((source, destination));
        }
    }

    // Small or dense graphs may starve a bucket; fill the remainder with any
    // fresh pair.
    while pairs.len() < n_pairs {
        let source = rng.random_range(0..n);
        let destination = rng.random_range(0..n);
        if source != destination && !pairs.contains(&(source, destination)) {
            pairs.push((source, destination));
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::line4;
    use crate::graph::NetworkGraph;

    #[test]
    fn test_predefined_deck_shape() {
        let g = NetworkGraph::generate(250, 0.4, 42).expect("generation succeeds");
        let deck = predefined_cases(&g);
        assert_eq!(deck.len(), 25);
        for case in &deck {
            assert_ne!(case.source, case.destination, "case {}", case.id);
            assert!(case.source < g.node_count());
            assert!(case.destination < g.node_count());
            assert!(case.weights.validate().is_ok(), "case {}", case.id);
            assert!(case.bandwidth_requirement >= 100.0);
        }
        let ids: Vec<u32> = deck.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_predefined_deck_is_reproducible() {
        let g = NetworkGraph::generate(100, 0.2, 7).expect("generation succeeds");
        assert_eq!(predefined_cases(&g), predefined_cases(&g));
    }

    #[test]
    fn test_predefined_deck_works_on_tiny_graphs() {
        let g = line4();
        let deck = predefined_cases(&g);
        assert_eq!(deck.len(), 25);
        for case in &deck {
            assert_ne!(case.source, case.destination);
            assert!(case.destination < 4);
        }
    }

    #[test]
    fn test_generated_deck_is_seeded() {
        let g = NetworkGraph::generate(60, 0.15, 3).expect("generation succeeds");
        let a = generate_cases(&g, 20, 42);
        let b = generate_cases(&g, 20, 42);
        let c = generate_cases(&g, 20, 43);
        assert_eq!(a, b, "same seed, same deck");
        assert_ne!(a, c, "different seed, different deck");
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_generated_pairs_are_distinct() {
        let g = NetworkGraph::generate(40, 0.2, 9).expect("generation succeeds");
        let deck = generate_cases(&g, 30, 1);
        let mut seen = std::collections::HashSet::new();
        for case in &deck {
            assert!(seen.insert((case.source, case.destination)));
            assert_ne!(case.source, case.destination);
        }
    }

    #[test]
    fn test_weight_scenarios_all_valid() {
        let scenarios = weight_scenarios();
        assert_eq!(scenarios.len(), 10);
        for (w, _) in scenarios {
            assert!(w.validate().is_ok());
        }
    }
}
