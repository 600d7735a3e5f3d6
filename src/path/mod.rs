//! Path utilities shared by every optimizer.
//!
//! - [`validity`]: structural checks a candidate path must pass before it is
//!   allowed into a result.
//! - [`walk`]: the guided random walk used for population seeding and
//!   mutation repair.
//! - [`shortest`]: Dijkstra over selectable edge-weight schemes with a
//!   process-wide LRU cache.
//! - [`yen`]: bounded k shortest simple path enumeration, weight-monotonic.

pub mod shortest;
pub mod validity;
pub mod walk;
pub mod yen;

pub use shortest::{shortest_path, EdgeWeightScheme, SpCache};
pub use validity::{check_path, PathViolation};
pub use walk::{guided_walk, random_walk};
pub use yen::k_simple_paths;
