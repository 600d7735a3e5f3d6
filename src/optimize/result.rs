//! Optimization results and the failure taxonomy.

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single source of truth for why an optimization failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// No route between source and destination under the bandwidth filter.
    NoPath,
    /// A path was returned but its bottleneck is below the demand.
    BandwidthInsufficient,
    /// The wall-clock budget ran out before a valid path was found.
    Timeout,
    InvalidSource,
    InvalidDestination,
    /// Source equals destination.
    SameNode,
    /// Unexpected internal fault (bad weights, negative demand, operator bug).
    AlgorithmError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoPath => "NO_PATH",
            Self::BandwidthInsufficient => "BANDWIDTH_INSUFFICIENT",
            Self::Timeout => "TIMEOUT",
            Self::InvalidSource => "INVALID_SOURCE",
            Self::InvalidDestination => "INVALID_DESTINATION",
            Self::SameNode => "SAME_NODE",
            Self::AlgorithmError => "ALGORITHM_ERROR",
        };
        f.write_str(s)
    }
}

/// Outcome of a single optimizer call.
///
/// On success the path is simple, runs source → destination over existing
/// edges, meets the bandwidth demand, and `fitness` equals the metric
/// kernel's cost for that path to within 1e-9. On failure the path is empty
/// or best-effort and `failure_reason` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub path: Vec<NodeId>,
    pub fitness: f64,
    pub total_delay: f64,
    pub total_reliability: f64,
    pub resource_cost: f64,
    pub min_bandwidth: f64,
    pub computation_time_ms: f64,
    /// Generation / iteration / episode at which the returned path was found.
    pub converged_iteration: usize,
    pub seed_used: u64,
    pub success: bool,
    pub failure_reason: Option<FailureReason>,
    /// Optional human-readable detail accompanying the failure code.
    pub failure_detail: Option<String>,
}

impl RouteResult {
    pub fn failure(reason: FailureReason, seed: u64, elapsed_ms: f64) -> Self {
        Self {
            path: Vec::new(),
            fitness: f64::INFINITY,
            total_delay: 0.0,
            total_reliability: 0.0,
            resource_cost: 0.0,
            min_bandwidth: 0.0,
            computation_time_ms: elapsed_ms,
            converged_iteration: 0,
            seed_used: seed,
            success: false,
            failure_reason: Some(reason),
            failure_detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.failure_detail = Some(detail.into());
        self
    }

    /// Keeps a best-effort path on a failed result (timeout with partial
    /// progress, bandwidth violation).
    pub fn with_partial_path(mut self, path: Vec<NodeId>, fitness: f64) -> Self {
        self.path = path;
        self.fitness = fitness;
        self
    }
}
