//! The (case × algorithm × repeat) experiment driver.

use super::cases::TestCase;
use super::report::{
    ComparisonRow, ExperimentReport, FailureDetail, FailureReport, RankingEntry, RepeatRecord,
    ScenarioCell,
};
use crate::graph::NetworkGraph;
use crate::optimize::{OptimizeContext, Optimizer, RouteRequest};
use crate::random::derive_seed;
use chrono::Utc;
use std::time::{Duration, Instant};

/// Runner knobs.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Optimizer calls per (case, algorithm) cell.
    pub n_repeats: usize,

    /// Master seed: every cell seed derives deterministically from it.
    pub master_seed: u64,

    /// Optional wall-clock budget per optimizer call.
    pub timeout: Option<Duration>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n_repeats: 5,
            master_seed: 42,
            timeout: None,
        }
    }
}

impl ExperimentConfig {
    pub fn with_repeats(mut self, n: usize) -> Self {
        self.n_repeats = n.max(1);
        self
    }

    pub fn with_master_seed(mut self, seed: u64) -> Self {
        self.master_seed = seed;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Runs the experiment matrix and assembles the report.
///
/// Cells run sequentially; the graph is shared read-only. Repeat seeds are a
/// function of `(master_seed, case id, repeat index)` — identical across
/// algorithms so every algorithm faces the same randomness.
pub struct ExperimentRunner {
    config: ExperimentConfig,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        graph: &NetworkGraph,
        cases: &[TestCase],
        algorithms: &[Box<dyn Optimizer>],
    ) -> ExperimentReport {
        let started = Instant::now();
        let mut cells: Vec<ScenarioCell> = Vec::with_capacity(cases.len() * algorithms.len());
        let mut failures: Vec<FailureDetail> = Vec::new();

        for case in cases {
            let request = RouteRequest::new(
                case.source,
                case.destination,
                case.weights,
                case.bandwidth_requirement,
            );

            for algorithm in algorithms {
                log::info!(
                    "case {} ({}) x {}: {} repeats",
                    case.id,
                    case.description,
                    algorithm.name(),
                    self.config.n_repeats
                );
                let cell = self.run_cell(graph, case, &request, algorithm.as_ref(), &mut failures);
                cells.push(cell);
            }
        }

        let comparison_table = comparison_table(&cells, algorithms);
        let ranking_summary = ranking_summary(&cells, cases, algorithms);

        ExperimentReport {
            timestamp: Utc::now().to_rfc3339(),
            n_test_cases: cases.len(),
            n_repeats: self.config.n_repeats,
            total_time_sec: started.elapsed().as_secs_f64(),
            comparison_table,
            scenario_results: cells,
            ranking_summary,
            failure_report: FailureReport::from_details(failures),
        }
    }

    fn run_cell(
        &self,
        graph: &NetworkGraph,
        case: &TestCase,
        request: &RouteRequest,
        algorithm: &dyn Optimizer,
        failures: &mut Vec<FailureDetail>,
    ) -> ScenarioCell {
        let mut repeats = Vec::with_capacity(self.config.n_repeats);

        for repeat in 0..self.config.n_repeats {
            let seed = derive_seed(self.config.master_seed, case.id as u64, repeat as u64);
            let mut ctx = OptimizeContext::default();
            if let Some(timeout) = self.config.timeout {
                ctx = ctx.with_deadline(Instant::now() + timeout);
            }

            let result = algorithm.optimize(graph, request, seed, &ctx);

            if let Some(reason) = result.failure_reason {
                failures.push(FailureDetail {
                    test_case_id: case.id,
                    algorithm: algorithm.name().to_string(),
                    source: case.source,
                    destination: case.destination,
                    bandwidth_requirement: case.bandwidth_requirement,
                    seed,
                    failure_reason: reason,
                    detail: result.failure_detail.clone(),
                });
            }

            repeats.push(RepeatRecord {
                seed,
                success: result.success,
                cost: result.success.then_some(result.fitness),
                total_delay: result.success.then_some(result.total_delay),
                total_reliability: result.success.then_some(result.total_reliability),
                resource_cost: result.success.then_some(result.resource_cost),
                min_bandwidth: result.success.then_some(result.min_bandwidth),
                time_ms: result.computation_time_ms,
                failure_reason: result.failure_reason,
            });
        }

        ScenarioCell::from_repeats(
            case.id,
            algorithm.name().to_string(),
            case.source,
            case.destination,
            case.bandwidth_requirement,
            repeats,
        )
    }
}

/// Cross-scenario aggregates per algorithm, sorted by mean cost ascending
/// (ties: mean time, then name; algorithms with no successes sink to the
/// bottom).
fn comparison_table(cells: &[ScenarioCell], algorithms: &[Box<dyn Optimizer>]) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = algorithms
        .iter()
        .map(|algorithm| {
            let name = algorithm.name();
            let own: Vec<&ScenarioCell> =
                cells.iter().filter(|c| c.algorithm == name).collect();

            let n_tests = own.len();
            let mean =
                |values: Vec<f64>| -> f64 { values.iter().sum::<f64>() / values.len().max(1) as f64 };

            let success_rate = mean(own.iter().map(|c| c.success_rate).collect());
            let bandwidth_satisfaction_rate =
                mean(own.iter().map(|c| c.bandwidth_satisfaction_rate).collect());
            let overall_avg_time_ms = mean(own.iter().map(|c| c.avg_time_ms).collect());

            let cell_costs: Vec<f64> = own.iter().filter_map(|c| c.avg_cost).collect();
            let (overall_avg_cost, overall_std_cost) = if cell_costs.is_empty() {
                (None, None)
            } else {
                let avg = cell_costs.iter().sum::<f64>() / cell_costs.len() as f64;
                let std = if cell_costs.len() > 1 {
                    (cell_costs.iter().map(|c| (c - avg).powi(2)).sum::<f64>()
                        / (cell_costs.len() - 1) as f64)
                        .sqrt()
                } else {
                    0.0
                };
                (Some(avg), Some(std))
            };

            let best = own
                .iter()
                .filter(|c| c.min_cost.is_some())
                .min_by(|a, b| {
                    a.min_cost
                        .partial_cmp(&b.min_cost)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

            ComparisonRow {
                algorithm: name.to_string(),
                n_tests,
                success_rate,
                bandwidth_satisfaction_rate,
                overall_avg_cost,
                overall_std_cost,
                overall_avg_time_ms,
                best_cost: best.and_then(|c| c.min_cost),
                best_seed: best.and_then(|c| c.best_seed),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        rank_key(a.overall_avg_cost, a.overall_avg_time_ms, &a.algorithm).partial_cmp(&rank_key(
            b.overall_avg_cost,
            b.overall_avg_time_ms,
            &b.algorithm,
        ))
        .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Sort key: cost ascending with `None` last, then time, then name.
fn rank_key<'a>(cost: Option<f64>, time_ms: f64, name: &'a str) -> (u8, f64, f64, &'a str) {
    match cost {
        Some(c) => (0, c, time_ms, name),
        None => (1, f64::INFINITY, time_ms, name),
    }
}

/// Per-scenario podium: order algorithms by mean cost ascending (same
/// tie-break chain) and count 1st/2nd/3rd places across scenarios.
fn ranking_summary(
    cells: &[ScenarioCell],
    cases: &[TestCase],
    algorithms: &[Box<dyn Optimizer>],
) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = algorithms
        .iter()
        .map(|a| RankingEntry {
            algorithm: a.name().to_string(),
            first_places: 0,
            second_places: 0,
            third_places: 0,
        })
        .collect();

    for case in cases {
        let mut standings: Vec<&ScenarioCell> = cells
            .iter()
            .filter(|c| c.test_case_id == case.id && c.avg_cost.is_some())
            .collect();
        standings.sort_by(|a, b| {
            rank_key(a.avg_cost, a.avg_time_ms, &a.algorithm)
                .partial_cmp(&rank_key(b.avg_cost, b.avg_time_ms, &b.algorithm))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (place, cell) in standings.iter().take(3).enumerate() {
            if let Some(entry) = entries.iter_mut().find(|e| e.algorithm == cell.algorithm) {
                match place {
                    0 => entry.first_places += 1,
                    1 => entry.second_places += 1,
                    _ => entry.third_places += 1,
                }
            }
        }
    }

    entries.sort_by(|a, b| {
        (b.first_places, b.second_places, b.third_places)
            .cmp(&(a.first_places, a.second_places, a.third_places))
            .then_with(|| a.algorithm.cmp(&b.algorithm))
    });
    entries
}
