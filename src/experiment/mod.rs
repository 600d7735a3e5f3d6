//! Experiment harness.
//!
//! Drives the (test case × algorithm × repeat) matrix over the shared graph,
//! aggregates per-cell statistics, ranks the algorithms, and collects every
//! failure with its reason. [`report`] serializes the outcome for the legacy
//! JSON/CSV round-trip.

pub mod cases;
pub mod report;
pub mod runner;

pub use cases::{generate_cases, predefined_cases, TestCase};
pub use report::{
    ComparisonRow, ExperimentReport, FailureDetail, FailureReport, RankingEntry, RepeatRecord,
    ScenarioCell,
};
pub use runner::{ExperimentConfig, ExperimentRunner};
