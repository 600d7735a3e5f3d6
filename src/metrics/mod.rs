//! Metric and cost kernel.
//!
//! [`evaluate`] is the single fitness function shared by every optimizer and
//! by the experiment harness: one pass over a path yields the raw QoS
//! metrics and the normalized weighted cost. The function is pure — same
//! graph, path, weights, and demand always produce the same result — and
//! takes only shared references, so it is safe to call from rayon workers.
//!
//! # Cost model
//!
//! Each metric is clamped into `[0, 1]` before weighting:
//!
//! - `norm_delay = min(total_delay / 200 ms, 1)`
//! - `norm_rel   = min((1 − total_reliability) · 10, 1)`
//! - `norm_res   = min(hops / 20, 1)` (hop count as the resource proxy)
//!
//! `cost = w_d·norm_delay + w_r·norm_rel + w_c·norm_res`, or `+∞` when the
//! bandwidth demand is violated or the path is malformed. Bandwidth is a
//! hard constraint, not a weighted term.

use crate::graph::{NetworkGraph, NodeId};
use serde::{Deserialize, Serialize};

/// Reference ceiling for delay normalization (milliseconds).
pub const MAX_DELAY_MS: f64 = 200.0;
/// Multiplier mapping unreliability into `[0, 1]`.
pub const RELIABILITY_PENALTY: f64 = 10.0;
/// Reference ceiling for the hop-count resource proxy.
pub const MAX_HOP_COUNT: f64 = 20.0;
/// Reference capacity for the raw resource cost (`Σ ref / bandwidth`).
pub const RESOURCE_REFERENCE_MBPS: f64 = 1000.0;

/// Objective weights. Non-negative, summing to 1 within [`WEIGHT_SUM_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub delay: f64,
    pub reliability: f64,
    pub resource: f64,
}

pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl Weights {
    pub fn new(delay: f64, reliability: f64, resource: f64) -> Result<Self, String> {
        let w = Self {
            delay,
            reliability,
            resource,
        };
        w.validate()?;
        Ok(w)
    }

    /// The balanced default used throughout the experiment decks.
    pub fn balanced() -> Self {
        Self {
            delay: 0.33,
            reliability: 0.33,
            resource: 0.34,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, w) in [
            ("delay", self.delay),
            ("reliability", self.reliability),
            ("resource", self.resource),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("weight {name} must be finite and non-negative, got {w}"));
            }
        }
        let sum = self.delay + self.reliability + self.resource;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!("weights must sum to 1, got {sum}"));
        }
        Ok(())
    }
}

/// Raw QoS metrics of a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathMetrics {
    /// Link delays plus processing delays of the internal nodes (ms).
    pub total_delay: f64,
    /// Product of link reliabilities and internal-node reliabilities.
    pub total_reliability: f64,
    /// `Σ 1000 / bandwidth(e)` — OSPF-style capacity cost.
    pub resource_cost: f64,
    /// Bottleneck bandwidth along the path (Mbps).
    pub min_bandwidth: f64,
}

impl PathMetrics {
    fn invalid() -> Self {
        Self {
            total_delay: 0.0,
            total_reliability: 0.0,
            resource_cost: 0.0,
            min_bandwidth: 0.0,
        }
    }
}

/// Result of one kernel pass: metrics plus the normalized weighted cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub metrics: PathMetrics,
    pub cost: f64,
}

impl Evaluation {
    fn infeasible(metrics: PathMetrics) -> Self {
        Self {
            metrics,
            cost: f64::INFINITY,
        }
    }
}

/// Evaluates a path in a single traversal.
///
/// Returns `cost = +∞` (with zeroed metrics) when the path has fewer than
/// two nodes or any consecutive pair is not an edge, and `cost = +∞` (with
/// the real metrics) when `demand > 0` and the bottleneck bandwidth falls
/// short.
pub fn evaluate(graph: &NetworkGraph, path: &[NodeId], weights: &Weights, demand: f64) -> Evaluation {
    if path.len() < 2 {
        return Evaluation::infeasible(PathMetrics::invalid());
    }

    let mut total_delay = 0.0;
    let mut total_reliability = 1.0;
    let mut resource_cost = 0.0;
    let mut min_bandwidth = f64::INFINITY;

    // Internal nodes only: endpoints neither delay nor attenuate.
    for &v in &path[1..path.len() - 1] {
        let attrs = graph.node(v);
        total_delay += attrs.processing_delay;
        total_reliability *= attrs.reliability;
    }

    for pair in path.windows(2) {
        let Some(edge) = graph.edge(pair[0], pair[1]) else {
            return Evaluation::infeasible(PathMetrics::invalid());
        };
        total_delay += edge.delay;
        total_reliability *= edge.reliability;
        resource_cost += RESOURCE_REFERENCE_MBPS / edge.bandwidth.max(1.0);
        min_bandwidth = min_bandwidth.min(edge.bandwidth);
    }

    let metrics = PathMetrics {
        total_delay,
        total_reliability,
        resource_cost,
        min_bandwidth,
    };

    if demand > 0.0 && min_bandwidth < demand {
        return Evaluation::infeasible(metrics);
    }

    let hops = (path.len() - 1) as f64;
    let norm_delay = (total_delay / MAX_DELAY_MS).min(1.0);
    let norm_rel = ((1.0 - total_reliability) * RELIABILITY_PENALTY).min(1.0);
    let norm_res = (hops / MAX_HOP_COUNT).min(1.0);

    Evaluation {
        metrics,
        cost: weights.delay * norm_delay
            + weights.reliability * norm_rel
            + weights.resource * norm_res,
    }
}

/// Bottleneck bandwidth of a path, `None` if any edge is missing.
pub fn min_bandwidth(graph: &NetworkGraph, path: &[NodeId]) -> Option<f64> {
    if path.len() < 2 {
        return None;
    }
    let mut min_bw = f64::INFINITY;
    for pair in path.windows(2) {
        min_bw = min_bw.min(graph.edge(pair[0], pair[1])?.bandwidth);
    }
    Some(min_bw)
}

/// Pareto dominance: `a` dominates `b` iff it is no worse on every metric
/// (delay ↓, reliability ↑, resource ↓) and strictly better on at least one.
pub fn dominates(a: &PathMetrics, b: &PathMetrics) -> bool {
    let no_worse = a.total_delay <= b.total_delay
        && a.total_reliability >= b.total_reliability
        && a.resource_cost <= b.resource_cost;
    let strictly_better = a.total_delay < b.total_delay
        || a.total_reliability > b.total_reliability
        || a.resource_cost < b.resource_cost;
    no_worse && strictly_better
}
