//! The optimizer contract and the six search algorithms.
//!
//! Every algorithm implements [`Optimizer`] — the experiment harness depends
//! only on this capability, never on an algorithm's internals:
//!
//! - [`ga`]: Genetic Algorithm with diversity-adaptive mutation
//! - [`aco`]: Ant Colony Optimization with an adaptive α/β schedule
//! - [`pso`]: discrete Particle Swarm Optimization
//! - [`sa`]: Simulated Annealing with geometric cooling
//! - [`rl`]: tabular Q-Learning and SARSA
//!
//! A call is single-call atomic: one logical thread of control that may fan
//! out internally for fitness evaluation. Within a call, a fixed seed makes
//! execution deterministic — same graph, same request, same seed, same
//! result, bit for bit.

pub mod aco;
pub mod ga;
pub mod pso;
mod result;
pub mod rl;
pub mod sa;

pub use aco::AntColonyOptimization;
pub use ga::GeneticAlgorithm;
pub use pso::ParticleSwarmOptimization;
pub use result::{FailureReason, RouteResult};
pub use rl::{QLearning, Sarsa};
pub use sa::SimulatedAnnealing;

use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::{evaluate, Weights};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// What to optimize: endpoints, objective weights, and the bandwidth demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub source: NodeId,
    pub destination: NodeId,
    pub weights: Weights,
    /// Minimum per-edge bandwidth in Mbps; 0 disables the constraint.
    pub demand: f64,
}

impl RouteRequest {
    pub fn new(source: NodeId, destination: NodeId, weights: Weights, demand: f64) -> Self {
        Self {
            source,
            destination,
            weights,
            demand,
        }
    }
}

/// Cooperative progress reporting and cancellation.
///
/// The callback is invoked at most once per generation/iteration/episode
/// with `(iteration, best_cost)`; a panicking callback is logged and
/// ignored. Cancellation and the deadline are polled at the same cadence.
#[derive(Default)]
pub struct OptimizeContext<'a> {
    pub progress: Option<&'a (dyn Fn(usize, f64) + Sync)>,
    pub cancel: Option<Arc<AtomicBool>>,
    pub deadline: Option<Instant>,
}

impl<'a> OptimizeContext<'a> {
    pub fn with_progress(mut self, callback: &'a (dyn Fn(usize, f64) + Sync)) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// True once the caller cancelled or the deadline passed.
    pub fn should_stop(&self) -> bool {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Reports progress, shielding the engine from a panicking callback.
    pub fn report(&self, iteration: usize, best_cost: f64) {
        if let Some(callback) = self.progress {
            if catch_unwind(AssertUnwindSafe(|| callback(iteration, best_cost))).is_err() {
                log::warn!("progress callback panicked at iteration {iteration}; continuing");
            }
        }
    }
}

/// Common capability of the six optimizers.
pub trait Optimizer: Send + Sync {
    /// Stable algorithm name used in reports and rankings.
    fn name(&self) -> &'static str;

    /// Finds a feasible minimum-cost path, or a failure result.
    fn optimize(
        &self,
        graph: &NetworkGraph,
        request: &RouteRequest,
        seed: u64,
        ctx: &OptimizeContext,
    ) -> RouteResult;
}

/// Shared precondition gate every algorithm runs first.
///
/// Returns the failure result to surface immediately, or `Ok(())` when the
/// search may start. The reachability probe answers `NoPath` for a
/// disconnected pair without burning a single iteration.
pub(crate) fn validate_request(
    graph: &NetworkGraph,
    request: &RouteRequest,
    seed: u64,
    start: Instant,
) -> Result<(), Box<RouteResult>> {
    let elapsed = || start.elapsed().as_secs_f64() * 1000.0;

    if !graph.contains_node(request.source) {
        return Err(Box::new(
            RouteResult::failure(FailureReason::InvalidSource, seed, elapsed())
                .with_detail(format!("node {} not in graph", request.source)),
        ));
    }
    if !graph.contains_node(request.destination) {
        return Err(Box::new(
            RouteResult::failure(FailureReason::InvalidDestination, seed, elapsed())
                .with_detail(format!("node {} not in graph", request.destination)),
        ));
    }
    if request.source == request.destination {
        return Err(Box::new(RouteResult::failure(
            FailureReason::SameNode,
            seed,
            elapsed(),
        )));
    }
    if !request.demand.is_finite() || request.demand < 0.0 {
        return Err(Box::new(
            RouteResult::failure(FailureReason::AlgorithmError, seed, elapsed())
                .with_detail(format!("negative bandwidth demand {}", request.demand)),
        ));
    }
    if let Err(message) = request.weights.validate() {
        return Err(Box::new(
            RouteResult::failure(FailureReason::AlgorithmError, seed, elapsed())
                .with_detail(message),
        ));
    }
    if !graph.has_path(request.source, request.destination, request.demand) {
        return Err(Box::new(
            RouteResult::failure(FailureReason::NoPath, seed, elapsed()).with_detail(format!(
                "{} and {} disconnected under {} Mbps",
                request.source, request.destination, request.demand
            )),
        ));
    }
    Ok(())
}

/// Assembles the final result from the best path an algorithm found.
///
/// Re-evaluates through the metric kernel so the reported fitness is exactly
/// the kernel's cost, and downgrades to a failure when the path violates the
/// bandwidth demand (defensively — algorithms filter during search).
pub(crate) fn finish(
    graph: &NetworkGraph,
    request: &RouteRequest,
    best: Option<(Vec<NodeId>, usize)>,
    seed: u64,
    start: Instant,
    timed_out: bool,
) -> RouteResult {
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let Some((path, converged_iteration)) = best else {
        let reason = if timed_out {
            FailureReason::Timeout
        } else {
            FailureReason::NoPath
        };
        return RouteResult::failure(reason, seed, elapsed_ms);
    };

    let eval = evaluate(graph, &path, &request.weights, request.demand);
    if eval.cost.is_infinite() {
        let reason = if request.demand > 0.0
            && eval.metrics.min_bandwidth > 0.0
            && eval.metrics.min_bandwidth < request.demand
        {
            FailureReason::BandwidthInsufficient
        } else {
            FailureReason::NoPath
        };
        return RouteResult::failure(reason, seed, elapsed_ms)
            .with_partial_path(path, f64::INFINITY);
    }

    RouteResult {
        path,
        fitness: eval.cost,
        total_delay: eval.metrics.total_delay,
        total_reliability: eval.metrics.total_reliability,
        resource_cost: eval.metrics.resource_cost,
        min_bandwidth: eval.metrics.min_bandwidth,
        computation_time_ms: elapsed_ms,
        converged_iteration,
        seed_used: seed,
        success: true,
        failure_reason: None,
        failure_detail: None,
    }
}

/// All six optimizers with their default configurations.
pub fn all_optimizers() -> Vec<Box<dyn Optimizer>> {
    vec![
        Box::new(GeneticAlgorithm::default()),
        Box::new(AntColonyOptimization::default()),
        Box::new(ParticleSwarmOptimization::default()),
        Box::new(SimulatedAnnealing::default()),
        Box::new(QLearning::default()),
        Box::new(Sarsa::default()),
    ]
}

/// Resolves a comma-separated algorithm list (`"ga,aco"`, `"all"`).
pub fn optimizers_by_names(names: &str) -> Result<Vec<Box<dyn Optimizer>>, String> {
    if names.trim().eq_ignore_ascii_case("all") {
        return Ok(all_optimizers());
    }
    names
        .split(',')
        .map(|name| match name.trim().to_ascii_lowercase().as_str() {
            "ga" | "genetic" => Ok(Box::new(GeneticAlgorithm::default()) as Box<dyn Optimizer>),
            "aco" | "ants" => Ok(Box::new(AntColonyOptimization::default()) as _),
            "pso" | "swarm" => Ok(Box::new(ParticleSwarmOptimization::default()) as _),
            "sa" | "annealing" => Ok(Box::new(SimulatedAnnealing::default()) as _),
            "ql" | "qlearning" | "q-learning" => Ok(Box::new(QLearning::default()) as _),
            "sarsa" => Ok(Box::new(Sarsa::default()) as _),
            other => Err(format!("unknown algorithm {other:?}")),
        })
        .collect()
}
