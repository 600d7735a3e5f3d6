//! ACO colony loop.

use super::config::AcoConfig;
use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::evaluate;
use crate::optimize::{finish, validate_request, OptimizeContext, Optimizer, RouteRequest, RouteResult};
use crate::random::create_rng;
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::time::Instant;

/// Guard against a zero-delay edge in the heuristic denominator.
const ETA_EPSILON: f64 = 1e-3;

type EdgeKey = (NodeId, NodeId);

fn key(u: NodeId, v: NodeId) -> EdgeKey {
    (u.min(v), u.max(v))
}

/// Ant Colony Optimization optimizer. See the [module docs](super).
pub struct AntColonyOptimization {
    config: AcoConfig,
}

impl AntColonyOptimization {
    /// # Panics
    /// Panics on an invalid configuration; call [`AcoConfig::validate`]
    /// first for a descriptive error.
    pub fn new(config: AcoConfig) -> Self {
        config.validate().expect("invalid AcoConfig");
        Self { config }
    }

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }
}

impl Default for AntColonyOptimization {
    fn default() -> Self {
        Self::new(AcoConfig::default())
    }
}

impl Optimizer for AntColonyOptimization {
    fn name(&self) -> &'static str {
        "AntColonyOptimization"
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
        let max_steps = 2 * graph.node_count();

        // Every edge starts at τ = 1; evaporation touches the whole table.
        let mut pheromone: FxHashMap<EdgeKey, f64> = graph
            .edges()
            .map(|(u, v, _)| (key(u, v), 1.0))
            .collect();

        let mut best_path: Option<Vec<NodeId>> = None;
        let mut best_cost = f64::INFINITY;
        let mut best_iteration = 0usize;
        let mut stagnation = 0usize;
        let mut timed_out = false;

        for iteration in 0..config.n_iterations {
            if ctx.should_stop() {
                timed_out = true;
                break;
            }

            let (alpha, beta) = config.exponents_at(iteration);
            let mut improved = false;
            let mut successful: Vec<(Vec<NodeId>, f64)> = Vec::new();

            for _ in 0..config.n_ants {
                let Some(path) =
                    construct(graph, request, &pheromone, alpha, beta, max_steps, &mut rng)
                else {
                    continue;
                };
                let cost = evaluate(graph, &path, &request.weights, request.demand).cost;
                if !cost.is_finite() {
                    continue;
                }
                if cost < best_cost {
                    best_cost = cost;
                    best_path = Some(path.clone());
                    best_iteration = iteration;
                    improved = true;
                }
                successful.push((path, cost));
            }

            deposit_and_evaporate(config, &mut pheromone, &successful, best_cost, graph);

            ctx.report(iteration, best_cost);

            if improved {
                stagnation = 0;
            } else {
                stagnation += 1;
                if stagnation >= config.stagnation_limit {
                    break;
                }
            }
        }

        finish(
            graph,
            request,
            best_path.map(|p| (p, best_iteration)),
            seed,
            start,
            timed_out,
        )
    }
}

/// One ant's walk: roulette over `τ^α · η^β` across the feasible frontier.
fn construct(
    graph: &NetworkGraph,
    request: &RouteRequest,
    pheromone: &FxHashMap<EdgeKey, f64>,
    alpha: f64,
    beta: f64,
    max_steps: usize,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let mut path = vec![request.source];
    let mut visited = vec![false; graph.node_count()];
    visited[request.source] = true;
    let mut current = request.source;

    while current != request.destination {
        if path.len() > max_steps {
            return None;
        }

        let allowed: Vec<NodeId> = graph
            .neighbors(current)
            .iter()
            .copied()
            .filter(|&v| {
                !visited[v]
                    && (request.demand <= 0.0
                        || graph
                            .edge(current, v)
                            .is_some_and(|e| e.bandwidth >= request.demand))
            })
            .collect();
        if allowed.is_empty() {
            return None;
        }

        let scores: Vec<f64> = allowed
            .iter()
            .map(|&v| {
                let tau = pheromone.get(&key(current, v)).copied().unwrap_or(1.0);
                let delay = graph
                    .edge(current, v)
                    .expect("allowed set built from neighbors")
                    .delay;
                let eta = 1.0 / (delay + ETA_EPSILON);
                tau.powf(alpha) * eta.powf(beta)
            })
            .collect();

        let next = roulette(&allowed, &scores, rng);
        path.push(next);
        visited[next] = true;
        current = next;
    }

    Some(path)
}

fn roulette(candidates: &[NodeId], scores: &[f64], rng: &mut StdRng) -> NodeId {
    let total: f64 = scores.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return candidates[rng.random_range(0..candidates.len())];
    }
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &s) in scores.iter().enumerate() {
        cumulative += s;
        if cumulative >= threshold {
            return candidates[i];
        }
    }
    candidates[candidates.len() - 1] // floating-point fallback
}

/// `τ ← (1 − ρ)·τ` everywhere, then `Q / cost` along each successful ant's
/// path, then the optional MMAS clamp.
fn deposit_and_evaporate(
    config: &AcoConfig,
    pheromone: &mut FxHashMap<EdgeKey, f64>,
    successful: &[(Vec<NodeId>, f64)],
    best_cost: f64,
    graph: &NetworkGraph,
) {
    for tau in pheromone.values_mut() {
        *tau *= 1.0 - config.evaporation;
    }

    for (path, cost) in successful {
        let deposit = config.deposit / cost.max(1e-9);
        for pair in path.windows(2) {
            *pheromone.entry(key(pair[0], pair[1])).or_insert(1.0) += deposit;
        }
    }

    if config.mmas && best_cost.is_finite() && best_cost > 0.0 {
        let tau_max = 1.0 / (config.evaporation * best_cost);
        let tau_min = tau_max / (2.0 * graph.node_count() as f64);
        for tau in pheromone.values_mut() {
            *tau = tau.clamp(tau_min, tau_max);
        }
    }
}
