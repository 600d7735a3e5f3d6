//! Experiment report: aggregates, ranking, failures, serialization.
//!
//! The JSON layout is the legacy round-trip format — key names are load
//! bearing: `timestamp, n_test_cases, n_repeats, total_time_sec,
//! comparison_table, scenario_results, ranking_summary, failure_report`.
//! Aggregates that exist only when at least one repeat succeeded are
//! `Option` so a cell with zero successes serializes as `null` instead of a
//! non-JSON infinity.

use crate::error::RouteError;
use crate::graph::NodeId;
use crate::optimize::FailureReason;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One optimizer call inside a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatRecord {
    pub seed: u64,
    pub success: bool,
    pub cost: Option<f64>,
    pub total_delay: Option<f64>,
    pub total_reliability: Option<f64>,
    pub resource_cost: Option<f64>,
    pub min_bandwidth: Option<f64>,
    pub time_ms: f64,
    pub failure_reason: Option<FailureReason>,
}

/// Aggregates of one (test case, algorithm) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCell {
    pub test_case_id: u32,
    pub algorithm: String,
    pub source: NodeId,
    pub destination: NodeId,
    pub bandwidth_requirement: f64,
    pub n_runs: usize,
    pub success_rate: f64,
    pub bandwidth_satisfaction_rate: f64,
    pub avg_cost: Option<f64>,
    pub std_cost: Option<f64>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    pub avg_time_ms: f64,
    /// Seed of the cheapest successful repeat.
    pub best_seed: Option<u64>,
    pub repeats: Vec<RepeatRecord>,
}

impl ScenarioCell {
    /// Builds the aggregate view over a cell's repeats.
    pub fn from_repeats(
        test_case_id: u32,
        algorithm: String,
        source: NodeId,
        destination: NodeId,
        bandwidth_requirement: f64,
        repeats: Vec<RepeatRecord>,
    ) -> Self {
        let n_runs = repeats.len();
        let successful: Vec<&RepeatRecord> = repeats.iter().filter(|r| r.success).collect();
        let satisfied = repeats
            .iter()
            .filter(|r| {
                r.success
                    && (bandwidth_requirement <= 0.0
                        || r.min_bandwidth
                            .is_some_and(|bw| bw >= bandwidth_requirement))
            })
            .count();

        let costs: Vec<f64> = successful.iter().filter_map(|r| r.cost).collect();
        let (avg_cost, std_cost, min_cost, max_cost) = if costs.is_empty() {
            (None, None, None, None)
        } else {
            let mean = costs.iter().sum::<f64>() / costs.len() as f64;
            let std = if costs.len() > 1 {
                let var = costs.iter().map(|c| (c - mean).powi(2)).sum::<f64>()
                    / (costs.len() - 1) as f64;
                Some(var.sqrt())
            } else {
                Some(0.0)
            };
            let min = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (Some(mean), std, Some(min), Some(max))
        };

        let best_seed = successful
            .iter()
            .filter(|r| r.cost.is_some())
            .min_by(|a, b| {
                a.cost
                    .partial_cmp(&b.cost)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|r| r.seed);

        let avg_time_ms = if n_runs == 0 {
            0.0
        } else {
            repeats.iter().map(|r| r.time_ms).sum::<f64>() / n_runs as f64
        };

        Self {
            test_case_id,
            algorithm,
            source,
            destination,
            bandwidth_requirement,
            n_runs,
            success_rate: if n_runs == 0 {
                0.0
            } else {
                successful.len() as f64 / n_runs as f64
            },
            bandwidth_satisfaction_rate: if n_runs == 0 {
                0.0
            } else {
                satisfied as f64 / n_runs as f64
            },
            avg_cost,
            std_cost,
            min_cost,
            max_cost,
            avg_time_ms,
            best_seed,
            repeats,
        }
    }
}

/// One row of the cross-scenario comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub algorithm: String,
    pub n_tests: usize,
    pub success_rate: f64,
    pub bandwidth_satisfaction_rate: f64,
    pub overall_avg_cost: Option<f64>,
    pub overall_std_cost: Option<f64>,
    pub overall_avg_time_ms: f64,
    pub best_cost: Option<f64>,
    pub best_seed: Option<u64>,
}

/// Podium counts per algorithm across all scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub algorithm: String,
    pub first_places: usize,
    pub second_places: usize,
    pub third_places: usize,
}

/// One failed (or bandwidth-unsatisfied) repeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub test_case_id: u32,
    pub algorithm: String,
    pub source: NodeId,
    pub destination: NodeId,
    pub bandwidth_requirement: f64,
    pub seed: u64,
    pub failure_reason: FailureReason,
    pub detail: Option<String>,
}

/// All failures grouped by reason and by algorithm.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FailureReport {
    pub total_failures: usize,
    pub by_reason: BTreeMap<String, usize>,
    pub by_algorithm: BTreeMap<String, usize>,
    pub details: Vec<FailureDetail>,
}

impl FailureReport {
    pub fn from_details(details: Vec<FailureDetail>) -> Self {
        let mut by_reason = BTreeMap::new();
        let mut by_algorithm = BTreeMap::new();
        for d in &details {
            *by_reason.entry(d.failure_reason.to_string()).or_insert(0) += 1;
            *by_algorithm.entry(d.algorithm.clone()).or_insert(0) += 1;
        }
        Self {
            total_failures: details.len(),
            by_reason,
            by_algorithm,
            details,
        }
    }
}

/// The full experiment outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub timestamp: String,
    pub n_test_cases: usize,
    pub n_repeats: usize,
    pub total_time_sec: f64,
    pub comparison_table: Vec<ComparisonRow>,
    pub scenario_results: Vec<ScenarioCell>,
    pub ranking_summary: Vec<RankingEntry>,
    pub failure_report: FailureReport,
}

impl ExperimentReport {
    pub fn to_json(&self) -> Result<String, RouteError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RouteError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), RouteError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Writes the comparison table as CSV with the legacy column set.
    pub fn write_comparison_csv(&self, path: &Path) -> Result<(), RouteError> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record([
            "algorithm",
            "success_rate",
            "bandwidth_satisfaction_rate",
            "overall_avg_cost",
            "overall_avg_time_ms",
            "best_cost",
            "best_seed",
        ])?;
        for row in &self.comparison_table {
            writer.write_record([
                row.algorithm.clone(),
                format!("{:.4}", row.success_rate),
                format!("{:.4}", row.bandwidth_satisfaction_rate),
                row.overall_avg_cost
                    .map_or_else(String::new, |c| format!("{c:.6}")),
                format!("{:.2}", row.overall_avg_time_ms),
                row.best_cost.map_or_else(String::new, |c| format!("{c:.6}")),
                row.best_seed.map_or_else(String::new, |s| s.to_string()),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Fraction of cells in which at least one repeat timed out.
    pub fn timeout_cell_fraction(&self) -> f64 {
        if self.scenario_results.is_empty() {
            return 0.0;
        }
        let timed_out = self
            .scenario_results
            .iter()
            .filter(|cell| {
                cell.repeats
                    .iter()
                    .any(|r| r.failure_reason == Some(FailureReason::Timeout))
            })
            .count();
        timed_out as f64 / self.scenario_results.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seed: u64, cost: Option<f64>, time_ms: f64) -> RepeatRecord {
        RepeatRecord {
            seed,
            success: cost.is_some(),
            cost,
            total_delay: cost.map(|_| 30.0),
            total_reliability: cost.map(|_| 0.97),
            resource_cost: cost.map(|_| 4.0),
            min_bandwidth: cost.map(|_| 400.0),
            time_ms,
            failure_reason: if cost.is_some() {
                None
            } else {
                Some(FailureReason::NoPath)
            },
        }
    }

    fn sample_cell() -> ScenarioCell {
        ScenarioCell::from_repeats(
            1,
            "GeneticAlgorithm".into(),
            0,
            9,
            300.0,
            vec![
                record(10, Some(0.30), 5.0),
                record(11, Some(0.20), 7.0),
                record(12, None, 1.0),
            ],
        )
    }

    #[test]
    fn test_cell_aggregates() {
        let cell = sample_cell();
        assert_eq!(cell.n_runs, 3);
        assert!((cell.success_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((cell.avg_cost.expect("has successes") - 0.25).abs() < 1e-12);
        assert_eq!(cell.min_cost, Some(0.20));
        assert_eq!(cell.max_cost, Some(0.30));
        assert_eq!(cell.best_seed, Some(11), "cheapest repeat wins");
        assert!((cell.avg_time_ms - 13.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_with_no_successes() {
        let cell = ScenarioCell::from_repeats(
            2,
            "SARSA".into(),
            0,
            9,
            900.0,
            vec![record(1, None, 2.0), record(2, None, 3.0)],
        );
        assert_eq!(cell.success_rate, 0.0);
        assert_eq!(cell.avg_cost, None);
        assert_eq!(cell.best_seed, None);
    }

    #[test]
    fn test_single_success_has_zero_std() {
        let cell = ScenarioCell::from_repeats(
            3,
            "SimulatedAnnealing".into(),
            0,
            9,
            0.0,
            vec![record(5, Some(0.4), 2.0)],
        );
        assert_eq!(cell.std_cost, Some(0.0));
    }

    #[test]
    fn test_failure_report_grouping() {
        let details = vec![
            FailureDetail {
                test_case_id: 1,
                algorithm: "QLearning".into(),
                source: 0,
                destination: 5,
                bandwidth_requirement: 900.0,
                seed: 1,
                failure_reason: FailureReason::NoPath,
                detail: None,
            },
            FailureDetail {
                test_case_id: 2,
                algorithm: "QLearning".into(),
                source: 0,
                destination: 5,
                bandwidth_requirement: 900.0,
                seed: 2,
                failure_reason: FailureReason::Timeout,
                detail: None,
            },
            FailureDetail {
                test_case_id: 1,
                algorithm: "SARSA".into(),
                source: 0,
                destination: 5,
                bandwidth_requirement: 900.0,
                seed: 1,
                failure_reason: FailureReason::NoPath,
                detail: None,
            },
        ];
        let report = FailureReport::from_details(details);
        assert_eq!(report.total_failures, 3);
        assert_eq!(report.by_reason["NO_PATH"], 2);
        assert_eq!(report.by_reason["TIMEOUT"], 1);
        assert_eq!(report.by_algorithm["QLearning"], 2);
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = ExperimentReport {
            timestamp: "2025-11-02T10:00:00Z".into(),
            n_test_cases: 1,
            n_repeats: 3,
            total_time_sec: 1.25,
            comparison_table: vec![ComparisonRow {
                algorithm: "GeneticAlgorithm".into(),
                n_tests: 1,
                success_rate: 2.0 / 3.0,
                bandwidth_satisfaction_rate: 2.0 / 3.0,
                overall_avg_cost: Some(0.25),
                overall_std_cost: Some(0.0),
                overall_avg_time_ms: 13.0 / 3.0,
                best_cost: Some(0.20),
                best_seed: Some(11),
            }],
            scenario_results: vec![sample_cell()],
            ranking_summary: vec![RankingEntry {
                algorithm: "GeneticAlgorithm".into(),
                first_places: 1,
                second_places: 0,
                third_places: 0,
            }],
            failure_report: FailureReport::from_details(Vec::new()),
        };

        let json = report.to_json().expect("serializes");
        let back = ExperimentReport::from_json(&json).expect("deserializes");
        assert_eq!(back, report);

        for key in [
            "timestamp",
            "n_test_cases",
            "n_repeats",
            "total_time_sec",
            "comparison_table",
            "scenario_results",
            "ranking_summary",
            "failure_report",
            "total_failures",
            "details",
        ] {
            assert!(json.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn test_timeout_fraction() {
        let mut cell = sample_cell();
        assert_eq!(
            ExperimentReport {
                timestamp: String::new(),
                n_test_cases: 1,
                n_repeats: 3,
                total_time_sec: 0.0,
                comparison_table: Vec::new(),
                scenario_results: vec![cell.clone()],
                ranking_summary: Vec::new(),
                failure_report: FailureReport::default(),
            }
            .timeout_cell_fraction(),
            0.0
        );

        cell.repeats[2].failure_reason = Some(FailureReason::Timeout);
        let report = ExperimentReport {
            timestamp: String::new(),
            n_test_cases: 1,
            n_repeats: 3,
            total_time_sec: 0.0,
            comparison_table: Vec::new(),
            scenario_results: vec![cell],
            ranking_summary: Vec::new(),
            failure_report: FailureReport::default(),
        };
        assert_eq!(report.timeout_cell_fraction(), 1.0);
    }
}
