//! Command-line surface.
//!
//! `qroute run` drives the experiment matrix over a CSV deck and writes the
//! JSON report plus the comparison-table CSV; `qroute generate` synthesizes
//! a seeded topology deck.
//!
//! Exit codes: 0 success, 2 invalid input, 3 graph disconnected, 4 timeout
//! exhausted for at least half the cells.

use crate::error::RouteError;
use crate::experiment::{generate_cases, predefined_cases, ExperimentConfig, ExperimentRunner};
use crate::graph::{load_deck, write_deck, NetworkGraph};
use crate::optimize::optimizers_by_names;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub const EXIT_OK: i32 = 0;
pub const EXIT_INVALID_INPUT: i32 = 2;
pub const EXIT_DISCONNECTED: i32 = 3;
pub const EXIT_TIMEOUTS: i32 = 4;

/// Share of timed-out cells beyond which the run reports exit code 4.
const TIMEOUT_CELL_THRESHOLD: f64 = 0.5;

#[derive(Parser)]
#[command(name = "qroute")]
#[command(author, version, about = "QoS-constrained path optimization experiments")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the experiment matrix over a graph deck.
    Run(RunArgs),
    /// Generate a random connected topology and write it as a CSV deck.
    Generate(GenerateArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Directory holding NodeData.csv / EdgeData.csv (/ DemandData.csv).
    #[arg(long, value_name = "DIR")]
    pub graph: PathBuf,

    /// "predefined" for the 25-scenario deck, or a count of generated cases.
    #[arg(long, default_value = "predefined")]
    pub cases: String,

    /// Repeats per (case, algorithm) cell.
    #[arg(long, default_value_t = 5)]
    pub repeats: usize,

    /// Comma-separated algorithms (ga, aco, pso, sa, ql, sarsa) or "all".
    #[arg(long, default_value = "all")]
    pub algos: String,

    /// Master seed for case generation and repeat seeds.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Per-call wall-clock budget in seconds.
    #[arg(long, value_name = "SEC")]
    pub timeout: Option<u64>,

    /// Output directory for report.json and comparison.csv.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Node count.
    #[arg(long, default_value_t = 250)]
    pub nodes: usize,

    /// Edge probability of the G(n, p) model.
    #[arg(long, default_value_t = 0.4)]
    pub prob: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output deck directory.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,
}

/// Executes a parsed command, returning the process exit code.
pub fn execute(cli: Cli) -> i32 {
    let outcome = match cli.command {
        Command::Run(args) => run(args),
        Command::Generate(args) => generate(args),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            EXIT_INVALID_INPUT
        }
    }
}

fn run(args: RunArgs) -> Result<i32, RouteError> {
    let (graph, demands) = load_deck(&args.graph)?;
    log::info!(
        "loaded graph: {} nodes, {} edges, {} demands",
        graph.node_count(),
        graph.edge_count(),
        demands.len()
    );

    if !graph.is_connected() {
        eprintln!("error: graph is not connected");
        return Ok(EXIT_DISCONNECTED);
    }

    let cases = if args.cases.eq_ignore_ascii_case("predefined") {
        predefined_cases(&graph)
    } else {
        let n: usize = args.cases.parse().map_err(|_| {
            RouteError::InvalidInput(format!(
                "--cases must be \"predefined\" or a number, got {:?}",
                args.cases
            ))
        })?;
        if n == 0 {
            return Err(RouteError::InvalidInput("--cases must be at least 1".into()));
        }
        generate_cases(&graph, n, args.seed)
    };

    let algorithms = optimizers_by_names(&args.algos).map_err(RouteError::InvalidInput)?;

    let mut config = ExperimentConfig::default()
        .with_repeats(args.repeats)
        .with_master_seed(args.seed);
    if let Some(seconds) = args.timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    let report = ExperimentRunner::new(config).run(&graph, &cases, &algorithms);

    if let Some(out) = &args.out {
        std::fs::create_dir_all(out)?;
        report.write_json(&out.join("report.json"))?;
        report.write_comparison_csv(&out.join("comparison.csv"))?;
        log::info!("report written to {}", out.display());
    } else {
        println!("{}", report.to_json()?);
    }

    print_summary(&report);

    if report.timeout_cell_fraction() >= TIMEOUT_CELL_THRESHOLD {
        return Ok(EXIT_TIMEOUTS);
    }
    Ok(EXIT_OK)
}

fn generate(args: GenerateArgs) -> Result<i32, RouteError> {
    let graph = NetworkGraph::generate(args.nodes, args.prob, args.seed)?;
    write_deck(&args.out, &graph, &[])?;
    println!(
        "wrote {} nodes / {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        args.out.display()
    );
    Ok(EXIT_OK)
}

fn print_summary(report: &crate::experiment::ExperimentReport) {
    eprintln!(
        "{} cases x {} repeats, {:.2}s total, {} failures",
        report.n_test_cases,
        report.n_repeats,
        report.total_time_sec,
        report.failure_report.total_failures
    );
    for row in &report.comparison_table {
        eprintln!(
            "  {:<28} success {:>5.1}% avg cost {} avg time {:>8.2}ms",
            row.algorithm,
            row.success_rate * 100.0,
            row.overall_avg_cost
                .map_or_else(|| "   n/a  ".to_string(), |c| format!("{c:.6}")),
            row.overall_avg_time_ms,
        );
    }
}
