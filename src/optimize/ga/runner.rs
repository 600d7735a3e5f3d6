//! GA evolutionary loop.

use super::config::GaConfig;
use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::evaluate;
use crate::optimize::{finish, validate_request, OptimizeContext, Optimizer, RouteRequest, RouteResult};
use crate::path::shortest::{EdgeWeightScheme, SpCache};
use crate::path::validity::is_simple_path;
use crate::path::walk::{default_max_len, guided_walk, random_walk, segment_walk};
use crate::random::create_rng;
use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;

/// Diversity below which mutation rewrites whole segments.
const SEGMENT_DIVERSITY: f64 = 0.05;
/// Diversity below which mutation inserts detour nodes.
const INSERTION_DIVERSITY: f64 = 0.15;
/// Individuals sampled for the pairwise diversity estimate.
const DIVERSITY_SAMPLE: usize = 30;

/// Genetic Algorithm optimizer. See the [module docs](super).
pub struct GeneticAlgorithm {
    config: GaConfig,
    /// Shortest-path cache shared across calls on the same instance. Keyed
    /// by (S, D, scheme, demand); stale after a graph mutation, so rebuild
    /// the optimizer (or [`SpCache::clear`]) after chaos edits.
    sp_cache: SpCache,
}

impl GeneticAlgorithm {
    /// # Panics
    /// Panics on an invalid configuration; call [`GaConfig::validate`] first
    /// for a descriptive error.
    pub fn new(config: GaConfig) -> Self {
        config.validate().expect("invalid GaConfig");
        Self {
            config,
            sp_cache: SpCache::default(),
        }
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Drops cached shortest paths (required after graph mutation).
    pub fn clear_cache(&self) {
        self.sp_cache.clear();
    }
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self::new(GaConfig::default())
    }
}

impl Optimizer for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "GeneticAlgorithm"
    }

    fn optimize(
        &self,
        graph: &NetworkGraph,
        request: &RouteRequest,
        seed: u64,
        ctx: &OptimizeContext,
    ) -> RouteResult {
        let start = Instant::now();
        if let Err(failure) = validate_request(graph, request, seed, start) {
            return *failure;
        }

        let config = &self.config;
        let pop_size = config.scaled_population(graph.node_count());
        let parallel = config.parallel_for(graph.node_count(), pop_size);
        let max_len = default_max_len(graph, request.source, request.destination);
        let mut rng = create_rng(seed);

        let mut population =
            seed_population(graph, request, pop_size, max_len, config, &self.sp_cache, &mut rng);
        if population.is_empty() {
            return finish(graph, request, None, seed, start, false);
        }

        let mut best_path: Option<Vec<NodeId>> = None;
        let mut best_cost = f64::INFINITY;
        let mut best_generation = 0usize;
        let mut stagnation = 0usize;
        let mut timed_out = false;

        for generation in 0..config.max_generations {
            if ctx.should_stop() {
                timed_out = true;
                break;
            }

            let mut scored = score_population(graph, request, population, parallel);
            scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            let generation_best = scored[0].1;
            if generation_best < best_cost - config.convergence_threshold {
                stagnation = 0;
            } else {
                stagnation += 1;
            }
            if generation_best < best_cost {
                best_cost = generation_best;
                best_path = Some(scored[0].0.clone());
                best_generation = generation;
            }

            let diversity = population_diversity(&scored, &mut rng);
            let mutation_rate = if diversity < config.diversity_threshold {
                (config.mutation_rate * config.mutation_boost).min(config.mutation_rate_max)
            } else {
                config.mutation_rate
            };

            ctx.report(generation, best_cost);

            if stagnation >= config.convergence_generations {
                break;
            }

            population = evolve(
                graph,
                request,
                &scored,
                pop_size,
                mutation_rate,
                diversity,
                max_len,
                config,
                &mut rng,
            );
        }

        finish(
            graph,
            request,
            best_path.map(|p| (p, best_generation)),
            seed,
            start,
            timed_out,
        )
    }
}

/// Multi-strategy initialization: weighted shortest paths (through the
/// shared cache), then guided and uniform walks, deduplicated. Every member
/// respects the demand.
#[allow(clippy::too_many_arguments)]
fn seed_population(
    graph: &NetworkGraph,
    request: &RouteRequest,
    pop_size: usize,
    max_len: usize,
    config: &GaConfig,
    sp_cache: &SpCache,
    rng: &mut StdRng,
) -> Vec<Vec<NodeId>> {
    let mut population: Vec<Vec<NodeId>> = Vec::with_capacity(pop_size);
    let mut seen: HashSet<Vec<NodeId>> = HashSet::new();

    for scheme in [
        EdgeWeightScheme::Hops,
        EdgeWeightScheme::Delay,
        EdgeWeightScheme::NegLogReliability,
    ] {
        if let Some(path) = sp_cache.shortest_path(
            graph,
            request.source,
            request.destination,
            scheme,
            request.demand,
        ) {
            if seen.insert(path.clone()) {
                population.push(path);
            }
        }
    }

    let guided_target = (pop_size as f64 * config.guided_ratio) as usize;
    let mut attempts = 0usize;
    let max_attempts = pop_size * 10;
    while population.len() < pop_size && attempts < max_attempts {
        let walk = if population.len() < guided_target {
            guided_walk(
                graph,
                request.source,
                request.destination,
                request.demand,
                max_len,
                rng,
            )
        } else {
            random_walk(
                graph,
                request.source,
                request.destination,
                request.demand,
                max_len,
                rng,
            )
        };
        if let Some(path) = walk {
            if seen.insert(path.clone()) {
                population.push(path);
            }
        }
        attempts += 1;
    }

    // Sparse graphs may not have pop_size distinct feasible paths; pad with
    // copies so the generational machinery keeps its invariants.
    if let Some(first) = population.first().cloned() {
        while population.len() < pop_size {
            population.push(first.clone());
        }
    }
    population
}

fn score_population(
    graph: &NetworkGraph,
    request: &RouteRequest,
    population: Vec<Vec<NodeId>>,
    parallel: bool,
) -> Vec<(Vec<NodeId>, f64)> {
    let score = |path: Vec<NodeId>| {
        let cost = evaluate(graph, &path, &request.weights, request.demand).cost;
        (path, cost)
    };
    if parallel {
        population.into_par_iter().map(score).collect()
    } else {
        population.into_iter().map(score).collect()
    }
}

/// Elites pass unchanged; the rest of the next generation comes from
/// tournament parents via crossover and diversity-directed mutation.
#[allow(clippy::too_many_arguments)]
fn evolve(
    graph: &NetworkGraph,
    request: &RouteRequest,
    scored: &[(Vec<NodeId>, f64)],
    pop_size: usize,
    mutation_rate: f64,
    diversity: f64,
    max_len: usize,
    config: &GaConfig,
    rng: &mut StdRng,
) -> Vec<Vec<NodeId>> {
    let elite_count = ((pop_size as f64 * config.elitism_ratio) as usize).min(scored.len());
    let mut next: Vec<Vec<NodeId>> = scored[..elite_count]
        .iter()
        .map(|(p, _)| p.clone())
        .collect();

    while next.len() < pop_size {
        let p1 = tournament(scored, config.tournament_size, rng);
        let p2 = tournament(scored, config.tournament_size, rng);

        let (mut c1, mut c2) = if rng.random_range(0.0..1.0) < config.crossover_rate {
            edge_crossover(graph, p1, p2, rng)
                .unwrap_or_else(|| (p1.to_vec(), p2.to_vec()))
        } else {
            (p1.to_vec(), p2.to_vec())
        };

        if rng.random_range(0.0..1.0) < mutation_rate {
            c1 = mutate(graph, request, c1, diversity, max_len, rng);
        }
        if rng.random_range(0.0..1.0) < mutation_rate {
            c2 = mutate(graph, request, c2, diversity, max_len, rng);
        }

        for child in [c1, c2] {
            if next.len() < pop_size {
                next.push(child);
            }
        }
    }
    next
}

/// k-tournament: best cost among k uniform draws.
fn tournament<'a>(
    scored: &'a [(Vec<NodeId>, f64)],
    k: usize,
    rng: &mut StdRng,
) -> &'a [NodeId] {
    let n = scored.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if scored[idx].1 < scored[best].1 {
            best = idx;
        }
    }
    &scored[best].0
}

/// Edge-based crossover: splice both parents at a shared internal node.
/// Children that are not simple paths are discarded (the caller falls back
/// to the parents).
fn edge_crossover(
    graph: &NetworkGraph,
    p1: &[NodeId],
    p2: &[NodeId],
    rng: &mut StdRng,
) -> Option<(Vec<NodeId>, Vec<NodeId>)> {
    if p1.len() < 3 || p2.len() < 3 {
        return None;
    }
    let internal2: HashSet<NodeId> = p2[1..p2.len() - 1].iter().copied().collect();
    let common: Vec<NodeId> = p1[1..p1.len() - 1]
        .iter()
        .copied()
        .filter(|v| internal2.contains(v))
        .collect();
    if common.is_empty() {
        return None;
    }

    let pivot = common[rng.random_range(0..common.len())];
    let i1 = p1.iter().position(|&v| v == pivot).expect("pivot from p1");
    let i2 = p2.iter().position(|&v| v == pivot).expect("pivot from p2");

    let mut c1 = p1[..=i1].to_vec();
    c1.extend_from_slice(&p2[i2 + 1..]);
    let mut c2 = p2[..=i2].to_vec();
    c2.extend_from_slice(&p1[i1 + 1..]);

    if is_simple_path(graph, &c1) && is_simple_path(graph, &c2) {
        Some((c1, c2))
    } else {
        None
    }
}

/// Diversity-directed mutation. A failed operator returns the original path.
fn mutate(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: Vec<NodeId>,
    diversity: f64,
    max_len: usize,
    rng: &mut StdRng,
) -> Vec<NodeId> {
    let mutated = if diversity < SEGMENT_DIVERSITY && path.len() >= 4 {
        mutate_segment(graph, request, &path, max_len, rng)
    } else if diversity < INSERTION_DIVERSITY && path.len() >= 2 {
        mutate_insert(graph, request, &path, rng)
    } else if path.len() >= 3 {
        mutate_replace(graph, request, &path, rng)
    } else {
        None
    };

    match mutated {
        Some(new_path)
            if is_simple_path(graph, &new_path)
                && feasible(graph, &new_path, request.demand) =>
        {
            new_path
        }
        _ => path,
    }
}

fn feasible(graph: &NetworkGraph, path: &[NodeId], demand: f64) -> bool {
    demand <= 0.0
        || path.windows(2).all(|pair| {
            graph
                .edge(pair[0], pair[1])
                .is_some_and(|e| e.bandwidth >= demand)
        })
}

/// Replace `path[i..=j]`'s interior with a fresh walk from `path[i]` to
/// `path[j]`.
fn mutate_segment(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    max_len: usize,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let i = rng.random_range(0..path.len() - 2);
    let j = rng.random_range(i + 2..path.len());

    let mut forbidden = vec![false; graph.node_count()];
    for (idx, &v) in path.iter().enumerate() {
        if idx < i || idx > j {
            forbidden[v] = true;
        }
    }
    let segment = segment_walk(
        graph,
        path[i],
        path[j],
        request.demand,
        &forbidden,
        max_len,
        rng,
    )?;

    let mut new_path = path[..i].to_vec();
    new_path.extend_from_slice(&segment);
    new_path.extend_from_slice(&path[j + 1..]);
    Some(new_path)
}

/// Insert a shared neighbor between an adjacent pair.
fn mutate_insert(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let i = rng.random_range(0..path.len() - 1);
    let candidates = common_neighbors(graph, path, path[i], path[i + 1], request.demand);
    if candidates.is_empty() {
        return None;
    }
    let detour = candidates[rng.random_range(0..candidates.len())];
    let mut new_path = path[..=i].to_vec();
    new_path.push(detour);
    new_path.extend_from_slice(&path[i + 1..]);
    Some(new_path)
}

/// Swap one internal node for a shared neighbor of its flanks.
fn mutate_replace(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let i = rng.random_range(1..path.len() - 1);
    let candidates = common_neighbors(graph, path, path[i - 1], path[i + 1], request.demand);
    if candidates.is_empty() {
        return None;
    }
    let replacement = candidates[rng.random_range(0..candidates.len())];
    let mut new_path = path.to_vec();
    new_path[i] = replacement;
    Some(new_path)
}

/// Nodes adjacent to both `a` and `b`, absent from `path`, with feasible
/// bandwidth on both incident edges. Deterministic order (neighbor cache is
/// sorted).
fn common_neighbors(
    graph: &NetworkGraph,
    path: &[NodeId],
    a: NodeId,
    b: NodeId,
    demand: f64,
) -> Vec<NodeId> {
    graph
        .neighbors(a)
        .iter()
        .copied()
        .filter(|&v| {
            if path.contains(&v) || !graph.has_edge(v, b) {
                return false;
            }
            demand <= 0.0
                || (graph.edge(a, v).is_some_and(|e| e.bandwidth >= demand)
                    && graph.edge(v, b).is_some_and(|e| e.bandwidth >= demand))
        })
        .collect()
}

/// 1 − mean pairwise Jaccard similarity over a bounded random sample.
fn population_diversity(scored: &[(Vec<NodeId>, f64)], rng: &mut StdRng) -> f64 {
    if scored.len() < 2 {
        return 0.0;
    }
    let sample_size = scored.len().min(DIVERSITY_SAMPLE);
    let mut indices: Vec<usize> = (0..scored.len()).collect();
    // Partial Fisher-Yates: the first sample_size entries become the sample.
    for i in 0..sample_size {
        let j = rng.random_range(i..indices.len());
        indices.swap(i, j);
    }

    let sets: Vec<HashSet<NodeId>> = indices[..sample_size]
        .iter()
        .map(|&idx| scored[idx].0.iter().copied().collect())
        .collect();

    let mut total = 0.0;
    let mut count = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let intersection = sets[i].intersection(&sets[j]).count();
            let union = sets[i].union(&sets[j]).count();
            if union > 0 {
                total += 1.0 - intersection as f64 / union as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::{diamond, line4, tradeoff};
    use crate::graph::NetworkGraph;
    use crate::metrics::Weights;
    use crate::random::create_rng;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn quick_config() -> GaConfig {
        GaConfig::default()
            .with_population_size(30)
            .with_max_generations(40)
    }

    fn request(s: NodeId, d: NodeId, w: Weights, demand: f64) -> RouteRequest {
        RouteRequest::new(s, d, w, demand)
    }

    #[test]
    fn test_line_graph_finds_only_path() {
        let g = line4();
        let ga = GeneticAlgorithm::new(quick_config());
        let result = ga.optimize(
            &g,
            &request(0, 3, Weights::new(1.0, 0.0, 0.0).unwrap(), 100.0),
            42,
            &OptimizeContext::default(),
        );
        assert!(result.success, "reason: {:?}", result.failure_reason);
        assert_eq!(result.path, vec![0, 1, 2, 3]);
        assert!((result.total_delay - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_bandwidth_gated_choice() {
        let g = diamond();
        let ga = GeneticAlgorithm::new(quick_config());
        let result = ga.optimize(
            &g,
            &request(0, 3, Weights::new(0.0, 0.0, 1.0).unwrap(), 500.0),
            42,
            &OptimizeContext::default(),
        );
        assert!(result.success);
        assert_eq!(result.path, vec![0, 2, 3], "only the wide route carries 500");
        assert!(result.min_bandwidth >= 500.0);
    }

    #[test]
    fn test_weights_steer_the_tradeoff() {
        let g = tradeoff();
        let ga = GeneticAlgorithm::new(quick_config());

        let fast = ga.optimize(
            &g,
            &request(0, 3, Weights::new(1.0, 0.0, 0.0).unwrap(), 0.0),
            7,
            &OptimizeContext::default(),
        );
        assert_eq!(fast.path, vec![0, 1, 3], "delay weighting picks the fast route");

        let reliable = ga.optimize(
            &g,
            &request(0, 3, Weights::new(0.0, 1.0, 0.0).unwrap(), 0.0),
            7,
            &OptimizeContext::default(),
        );
        assert_eq!(
            reliable.path,
            vec![0, 2, 3],
            "reliability weighting picks the reliable route"
        );
    }

    #[test]
    fn test_determinism_per_seed() {
        let g = NetworkGraph::generate(40, 0.15, 5).expect("generation succeeds");
        let ga = GeneticAlgorithm::new(quick_config());
        let req = request(0, 39, Weights::balanced(), 100.0);
        let a = ga.optimize(&g, &req, 42, &OptimizeContext::default());
        let b = ga.optimize(&g, &req, 42, &OptimizeContext::default());
        assert_eq!(a.path, b.path);
        assert_eq!(a.fitness, b.fitness);
    }

    #[test]
    fn test_fitness_matches_kernel() {
        let g = NetworkGraph::generate(30, 0.2, 11).expect("generation succeeds");
        let ga = GeneticAlgorithm::new(quick_config());
        let req = request(0, 29, Weights::balanced(), 100.0);
        let result = ga.optimize(&g, &req, 1, &OptimizeContext::default());
        if result.success {
            let expected = evaluate(&g, &result.path, &req.weights, req.demand).cost;
            assert!((result.fitness - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_path_fails_fast() {
        let mut g = line4();
        g.remove_edge(1, 2);
        let ga = GeneticAlgorithm::new(quick_config());
        let result = ga.optimize(
            &g,
            &request(0, 3, Weights::balanced(), 0.0),
            42,
            &OptimizeContext::default(),
        );
        assert!(!result.success);
        assert_eq!(
            result.failure_reason,
            Some(crate::optimize::FailureReason::NoPath)
        );
    }

    #[test]
    fn test_cancellation_returns_early() {
        let g = NetworkGraph::generate(60, 0.1, 3).expect("generation succeeds");
        let cancel = Arc::new(AtomicBool::new(true));
        let ctx = OptimizeContext::default().with_cancel(Arc::clone(&cancel));
        let ga = GeneticAlgorithm::default();
        let result = ga.optimize(&g, &request(0, 59, Weights::balanced(), 0.0), 42, &ctx);
        // Cancelled before the first generation: no best path yet.
        assert!(!result.success);
        assert_eq!(
            result.failure_reason,
            Some(crate::optimize::FailureReason::Timeout)
        );
    }

    #[test]
    fn test_progress_callback_sees_monotone_best() {
        use std::sync::Mutex;
        let g = NetworkGraph::generate(30, 0.2, 17).expect("generation succeeds");
        let history = Mutex::new(Vec::new());
        let callback = |generation: usize, best: f64| {
            history.lock().expect("history mutex").push((generation, best));
        };
        let ctx = OptimizeContext::default().with_progress(&callback);
        let ga = GeneticAlgorithm::new(quick_config());
        let result = ga.optimize(&g, &request(0, 29, Weights::balanced(), 0.0), 9, &ctx);
        assert!(result.success);
        let history = history.into_inner().expect("history mutex");
        assert!(!history.is_empty());
        for pair in history.windows(2) {
            assert!(pair[1].1 <= pair[0].1, "best cost must never regress");
        }
    }

    #[test]
    fn test_crossover_requires_common_internal_node() {
        let g = diamond();
        let mut rng = create_rng(42);
        // Paths share only the endpoints.
        assert!(edge_crossover(&g, &[0, 1, 3], &[0, 2, 3], &mut rng).is_none());
    }

    #[test]
    fn test_diversity_bounds() {
        let mut rng = create_rng(42);
        let identical = vec![(vec![0usize, 1, 2], 0.1); 10];
        assert!(population_diversity(&identical, &mut rng).abs() < 1e-12);

        let disjoint = vec![
            (vec![0usize, 1, 2], 0.1),
            (vec![3usize, 4, 5], 0.1),
        ];
        assert!((population_diversity(&disjoint, &mut rng) - 1.0).abs() < 1e-12);
    }
}
