//! PSO swarm loop.

use super::config::PsoConfig;
use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::evaluate;
use crate::optimize::{finish, validate_request, OptimizeContext, Optimizer, RouteRequest, RouteResult};
use crate::path::walk::{default_max_len, random_walk};
use crate::random::create_rng;
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Instant;

/// Uniform floor added to every feasible hop so reconstruction can always
/// proceed even when no reference path points anywhere useful.
const SCORE_FLOOR: f64 = 0.05;

struct Particle {
    path: Vec<NodeId>,
    cost: f64,
    pbest_path: Vec<NodeId>,
    pbest_cost: f64,
}

/// Particle Swarm optimizer. See the [module docs](super).
pub struct ParticleSwarmOptimization {
    config: PsoConfig,
}

impl ParticleSwarmOptimization {
    /// # Panics
    /// Panics on an invalid configuration; call [`PsoConfig::validate`]
    /// first for a descriptive error.
    pub fn new(config: PsoConfig) -> Self {
        config.validate().expect("invalid PsoConfig");
        Self { config }
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }
}

impl Default for ParticleSwarmOptimization {
    fn default() -> Self {
        Self::new(PsoConfig::default())
    }
}

impl Optimizer for ParticleSwarmOptimization {
    fn name(&self) -> &'static str {
        "ParticleSwarmOptimization"
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

        let mut swarm = init_swarm(graph, request, config.n_particles, max_len, &mut rng);
        if swarm.is_empty() {
            return finish(graph, request, None, seed, start, false);
        }

        let (mut gbest_path, mut gbest_cost) = swarm
            .iter()
            .map(|p| (p.path.clone(), p.cost))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .expect("swarm is non-empty");
        let mut best_iteration = 0usize;
        let mut stagnation = 0usize;
        let mut timed_out = false;

        for iteration in 0..config.n_iterations {
            if ctx.should_stop() {
                timed_out = true;
                break;
            }

            let mut improved = false;
            for i in 0..swarm.len() {
                let r_cognitive = rng.random_range(0.0..1.0);
                let r_social = rng.random_range(0.0..1.0);

                let new_path = reconstruct(
                    graph,
                    request,
                    &swarm[i].path,
                    &swarm[i].pbest_path,
                    &gbest_path,
                    config,
                    r_cognitive,
                    r_social,
                    max_len,
                    &mut rng,
                );
                let Some(new_path) = new_path else { continue };
                let new_cost = evaluate(graph, &new_path, &request.weights, request.demand).cost;
                if !new_cost.is_finite() {
                    continue;
                }

                let particle = &mut swarm[i];
                particle.path = new_path.clone();
                particle.cost = new_cost;
                if new_cost < particle.pbest_cost {
                    particle.pbest_path = new_path.clone();
                    particle.pbest_cost = new_cost;
                }
                if new_cost < gbest_cost {
                    gbest_cost = new_cost;
                    gbest_path = new_path;
                    best_iteration = iteration;
                    improved = true;
                }
            }

            ctx.report(iteration, gbest_cost);

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
            Some((gbest_path, best_iteration)),
            seed,
            start,
            timed_out,
        )
    }
}

fn init_swarm(
    graph: &NetworkGraph,
    request: &RouteRequest,
    n_particles: usize,
    max_len: usize,
    rng: &mut StdRng,
) -> Vec<Particle> {
    let mut swarm = Vec::with_capacity(n_particles);
    let mut attempts = 0usize;
    while swarm.len() < n_particles && attempts < n_particles * 10 {
        if let Some(path) = random_walk(
            graph,
            request.source,
            request.destination,
            request.demand,
            max_len,
            rng,
        ) {
            let cost = evaluate(graph, &path, &request.weights, request.demand).cost;
            if cost.is_finite() {
                swarm.push(Particle {
                    pbest_path: path.clone(),
                    pbest_cost: cost,
                    path,
                    cost,
                });
            }
        }
        attempts += 1;
    }
    swarm
}

/// Rebuilds a particle's path hop by hop. Each feasible neighbor is scored
/// `w·inertia + c₁·r₁·pbest + c₂·r₂·gbest` (each component an indicator
/// that the hop follows the current node in the corresponding reference
/// path) plus a uniform floor, then drawn by roulette.
#[allow(clippy::too_many_arguments)]
fn reconstruct(
    graph: &NetworkGraph,
    request: &RouteRequest,
    inertia_path: &[NodeId],
    pbest_path: &[NodeId],
    gbest_path: &[NodeId],
    config: &PsoConfig,
    r_cognitive: f64,
    r_social: f64,
    max_len: usize,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let mut path = vec![request.source];
    let mut visited = vec![false; graph.node_count()];
    visited[request.source] = true;
    let mut current = request.source;

    for _ in 0..max_len {
        if current == request.destination {
            return Some(path);
        }

        let frontier: Vec<NodeId> = graph
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
        if frontier.is_empty() {
            return None;
        }
        if frontier.contains(&request.destination) {
            path.push(request.destination);
            return Some(path);
        }

        let scores: Vec<f64> = frontier
            .iter()
            .map(|&v| {
                let mut score = SCORE_FLOOR;
                if successor_of(inertia_path, current) == Some(v) {
                    score += config.inertia;
                }
                if successor_of(pbest_path, current) == Some(v) {
                    score += config.cognitive * r_cognitive;
                }
                if successor_of(gbest_path, current) == Some(v) {
                    score += config.social * r_social;
                }
                score
            })
            .collect();

        let total: f64 = scores.iter().sum();
        let threshold = rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        let mut next = frontier[frontier.len() - 1];
        for (i, &s) in scores.iter().enumerate() {
            cumulative += s;
            if cumulative >= threshold {
                next = frontier[i];
                break;
            }
        }

        path.push(next);
        visited[next] = true;
        current = next;
    }

    None
}

/// The node that follows `node` in `path`, if `node` appears before the end.
fn successor_of(path: &[NodeId], node: NodeId) -> Option<NodeId> {
    path.iter()
        .position(|&v| v == node)
        .and_then(|idx| path.get(idx + 1).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_fixtures::{diamond, line4, tradeoff};
    use crate::graph::NetworkGraph;
    use crate::metrics::Weights;

    fn quick() -> ParticleSwarmOptimization {
        ParticleSwarmOptimization::new(PsoConfig::default().with_particles(20).with_iterations(40))
    }

    fn request(s: NodeId, d: NodeId, w: Weights, demand: f64) -> RouteRequest {
        RouteRequest::new(s, d, w, demand)
    }

    #[test]
    fn test_line_graph() {
        let g = line4();
        let result = quick().optimize(
            &g,
            &request(0, 3, Weights::new(1.0, 0.0, 0.0).unwrap(), 100.0),
            42,
            &OptimizeContext::default(),
        );
        assert!(result.success);
        assert_eq!(result.path, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_bandwidth_gate() {
        let g = diamond();
        let result = quick().optimize(
            &g,
            &request(0, 3, Weights::new(0.0, 0.0, 1.0).unwrap(), 500.0),
            42,
            &OptimizeContext::default(),
        );
        assert!(result.success);
        assert_eq!(result.path, vec![0, 2, 3]);
    }

    #[test]
    fn test_reliability_weighting() {
        let g = tradeoff();
        let result = quick().optimize(
            &g,
            &request(0, 3, Weights::new(0.0, 1.0, 0.0).unwrap(), 0.0),
            13,
            &OptimizeContext::default(),
        );
        assert!(result.success);
        assert_eq!(result.path, vec![0, 2, 3]);
    }

    #[test]
    fn test_determinism_per_seed() {
        let g = NetworkGraph::generate(35, 0.2, 21).expect("generation succeeds");
        let req = request(0, 34, Weights::balanced(), 100.0);
        let pso = quick();
        let a = pso.optimize(&g, &req, 5, &OptimizeContext::default());
        let b = pso.optimize(&g, &req, 5, &OptimizeContext::default());
        assert_eq!(a.path, b.path);
        assert_eq!(a.fitness, b.fitness);
    }

    #[test]
    fn test_successor_lookup() {
        let path = [0usize, 4, 2, 7];
        assert_eq!(successor_of(&path, 0), Some(4));
        assert_eq!(successor_of(&path, 2), Some(7));
        assert_eq!(successor_of(&path, 7), None);
        assert_eq!(successor_of(&path, 9), None);
    }
}
