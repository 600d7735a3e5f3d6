//! Tabular reinforcement learning: Q-Learning and SARSA.
//!
//! State = current node, action = stepping to a neighbor. Both algorithms
//! share the episode scaffolding — ε-greedy action choice over the
//! bandwidth-feasible unvisited frontier, a per-edge shaped reward, and a
//! flat `(node, node) → f64` value table — and differ only in the update:
//! Q-Learning bootstraps off-policy from the greedy successor value, SARSA
//! on-policy from the action actually taken next.
//!
//! # References
//!
//! - Watkins & Dayan (1992), "Q-learning"
//! - Rummery & Niranjan (1994), "On-line Q-learning using connectionist
//!   systems" (SARSA)
//! - Sutton & Barto (2018), *Reinforcement Learning: An Introduction*

mod config;
mod engine;

pub use config::RlConfig;
pub use engine::{QLearning, Sarsa};
