//! SA annealing loop.

use super::config::SaConfig;
use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::evaluate;
use crate::optimize::{finish, validate_request, OptimizeContext, Optimizer, RouteRequest, RouteResult};
use crate::path::shortest::{EdgeWeightScheme, SpCache};
use crate::path::validity::is_simple_path;
use crate::path::walk::{default_max_len, guided_walk, random_walk};
use crate::random::create_rng;
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Instant;

/// Simulated Annealing optimizer. See the [module docs](super).
pub struct SimulatedAnnealing {
    config: SaConfig,
    /// Shortest-path cache shared across calls on the same instance; stale
    /// after a graph mutation, so rebuild the optimizer (or
    /// [`SpCache::clear`]) after chaos edits.
    sp_cache: SpCache,
}

impl SimulatedAnnealing {
    /// # Panics
    /// Panics on an invalid configuration; call [`SaConfig::validate`] first
    /// for a descriptive error.
    pub fn new(config: SaConfig) -> Self {
        config.validate().expect("invalid SaConfig");
        Self {
            config,
            sp_cache: SpCache::default(),
        }
    }

    pub fn config(&self) -> &SaConfig {
        &self.config
    }

    /// Drops cached shortest paths (required after graph mutation).
    pub fn clear_cache(&self) {
        self.sp_cache.clear();
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new(SaConfig::default())
    }
}

impl Optimizer for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "SimulatedAnnealing"
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
        let mut rng = create_rng(seed);
        let max_len = default_max_len(graph, request.source, request.destination);

        let Some(mut current) =
            initial_solution(graph, request, config, &self.sp_cache, max_len, &mut rng)
        else {
            return finish(graph, request, None, seed, start, false);
        };
        let mut current_cost = evaluate(graph, &current, &request.weights, request.demand).cost;

        let mut best = current.clone();
        let mut best_cost = current_cost;
        let mut best_step = 0usize;

        let mut temperature = config.initial_temperature;
        let mut step = 0usize;
        let mut timed_out = false;

        while temperature > config.final_temperature {
            if ctx.should_stop() {
                timed_out = true;
                break;
            }

            for _ in 0..config.iterations_per_temperature {
                let Some(neighbor) = neighbor_of(graph, request, &current, config, &mut rng)
                else {
                    continue;
                };
                let neighbor_cost =
                    evaluate(graph, &neighbor, &request.weights, request.demand).cost;
                if !neighbor_cost.is_finite() {
                    continue;
                }

                // Metropolis criterion.
                let delta = neighbor_cost - current_cost;
                let accept = delta < 0.0
                    || rng.random_range(0.0..1.0) < (-delta / temperature).exp();
                if accept {
                    current = neighbor;
                    current_cost = neighbor_cost;
                    if current_cost < best_cost {
                        best = current.clone();
                        best_cost = current_cost;
                        best_step = step;
                    }
                }
            }

            ctx.report(step, best_cost);
            temperature *= config.cooling_rate;
            step += 1;
        }

        finish(
            graph,
            request,
            Some((best, best_step)),
            seed,
            start,
            timed_out,
        )
    }
}

/// Best of: hop-shortest path, one guided walk, a handful of random walks.
fn initial_solution(
    graph: &NetworkGraph,
    request: &RouteRequest,
    config: &SaConfig,
    sp_cache: &SpCache,
    max_len: usize,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let mut pool: Vec<Vec<NodeId>> = Vec::new();
    if let Some(path) = sp_cache.shortest_path(
        graph,
        request.source,
        request.destination,
        EdgeWeightScheme::Hops,
        request.demand,
    ) {
        pool.push(path);
    }
    if let Some(path) = guided_walk(
        graph,
        request.source,
        request.destination,
        request.demand,
        max_len,
        rng,
    ) {
        pool.push(path);
    }
    for _ in 0..config.initial_walks {
        if let Some(path) = random_walk(
            graph,
            request.source,
            request.destination,
            request.demand,
            max_len,
            rng,
        ) {
            pool.push(path);
        }
    }

    pool.into_iter()
        .map(|p| {
            let cost = evaluate(graph, &p, &request.weights, request.demand).cost;
            (p, cost)
        })
        .filter(|(_, cost)| cost.is_finite())
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p)
}

/// Perturb one internal node: replace it with a feasible common neighbor of
/// its flanks, falling back to inserting a detour node. Up to
/// `neighbor_attempts` tries before conceding the move.
fn neighbor_of(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    config: &SaConfig,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    for _ in 0..config.neighbor_attempts {
        let candidate = if path.len() >= 3 && rng.random_range(0.0..1.0) < 0.7 {
            replace_node(graph, request, path, rng)
        } else {
            insert_node(graph, request, path, rng)
        };
        if let Some(new_path) = candidate {
            if is_simple_path(graph, &new_path) {
                return Some(new_path);
            }
        }
    }
    None
}

fn replace_node(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    if path.len() < 3 {
        return None;
    }
    let i = rng.random_range(1..path.len() - 1);
    let candidates = feasible_common_neighbors(graph, request, path, path[i - 1], path[i + 1]);
    if candidates.is_empty() {
        return None;
    }
    let replacement = candidates[rng.random_range(0..candidates.len())];
    let mut new_path = path.to_vec();
    new_path[i] = replacement;
    Some(new_path)
}

fn insert_node(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let i = rng.random_range(0..path.len() - 1);
    let candidates = feasible_common_neighbors(graph, request, path, path[i], path[i + 1]);
    if candidates.is_empty() {
        return None;
    }
    let detour = candidates[rng.random_range(0..candidates.len())];
    let mut new_path = path[..=i].to_vec();
    new_path.push(detour);
    new_path.extend_from_slice(&path[i + 1..]);
    Some(new_path)
}

fn feasible_common_neighbors(
    graph: &NetworkGraph,
    request: &RouteRequest,
    path: &[NodeId],
    a: NodeId,
    b: NodeId,
) -> Vec<NodeId> {
    graph
        .neighbors(a)
        .iter()
        .copied()
        .filter(|&v| {
            if path.contains(&v) || !graph.has_edge(v, b) {
                return false;
            }
            request.demand <= 0.0
                || (graph
                    .edge(a, v)
                    .is_some_and(|e| e.bandwidth >= request.demand)
                    && graph
                        .edge(v, b)
                        .is_some_and(|e| e.bandwidth >= request.demand))
        })
        .collect()
}
