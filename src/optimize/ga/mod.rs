//! Genetic Algorithm for QoS-constrained routing.
//!
//! Population-based search over simple paths. The population is seeded from
//! weighted shortest paths plus guided and uniform random walks, parents are
//! chosen by tournament, recombination splices two parents at a shared
//! internal node, and the mutation operator escalates with falling
//! population diversity (node replacement → node insertion → segment
//! re-walk).
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and
//!   Machine Learning*

mod config;
mod runner;

pub use config::GaConfig;
pub use runner::GeneticAlgorithm;
