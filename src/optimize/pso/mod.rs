//! Discrete Particle Swarm Optimization for QoS-constrained routing.
//!
//! Paths are discrete, so velocity is reinterpreted as a probability
//! perturbation over next-hop choices: each iteration a particle rebuilds
//! its path from the source, drawing every hop from the feasible neighbors
//! with a score mixing inertia (its own current path), its personal best,
//! and the swarm's global best.
//!
//! # Reference
//!
//! Kennedy & Eberhart (1995), "Particle Swarm Optimization"

mod config;
mod runner;

pub use config::PsoConfig;
pub use runner::ParticleSwarmOptimization;
