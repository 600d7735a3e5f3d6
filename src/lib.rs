//! QoS-constrained multi-objective path optimization.
//!
//! Computes minimum-cost simple paths on a weighted, undirected network
//! topology subject to a hard per-edge bandwidth demand, with six stochastic
//! optimizers competing on one normalized cost model:
//!
//! - **Genetic Algorithm (GA)**: population search with edge-based crossover
//!   and diversity-adaptive mutation.
//! - **Ant Colony Optimization (ACO)**: pheromone-guided construction with
//!   an adaptive exploration/exploitation schedule.
//! - **Particle Swarm Optimization (PSO)**: discrete adaptation rebuilding
//!   paths under inertia/pbest/gbest bias.
//! - **Simulated Annealing (SA)**: single-trajectory search with geometric
//!   cooling.
//! - **Q-Learning / SARSA**: tabular reinforcement learning over the node
//!   graph, off- and on-policy.
//!
//! # Architecture
//!
//! The metric kernel ([`metrics::evaluate`]) is the single fitness function;
//! every optimizer implements the same [`optimize::Optimizer`] capability,
//! and the experiment harness ([`experiment`]) drives the
//! (case × algorithm × repeat) matrix against it. [`pareto`] provides the
//! dominance-front and k-path benchmark lenses. Determinism is a contract:
//! a fixed `(graph, request, seed)` reproduces results bit for bit.
//!
//! # Example
//!
//! ```
//! use qroute::graph::NetworkGraph;
//! use qroute::metrics::Weights;
//! use qroute::optimize::{GeneticAlgorithm, OptimizeContext, Optimizer, RouteRequest};
//!
//! let graph = NetworkGraph::generate(30, 0.2, 42).unwrap();
//! let request = RouteRequest::new(0, 29, Weights::balanced(), 200.0);
//! let result = GeneticAlgorithm::default()
//!     .optimize(&graph, &request, 42, &OptimizeContext::default());
//! if result.success {
//!     assert!(result.min_bandwidth >= 200.0);
//! }
//! ```

pub mod cli;
pub mod error;
pub mod experiment;
pub mod graph;
pub mod metrics;
pub mod optimize;
pub mod pareto;
pub mod path;
pub mod random;

pub use error::RouteError;
