//! End-to-end scenarios across the whole crate: every optimizer against the
//! same miniature topologies, the experiment harness, and the report
//! round-trip.

use qroute::experiment::{ExperimentConfig, ExperimentRunner, ExperimentReport, TestCase};
use qroute::graph::{EdgeAttrs, NetworkGraph, NodeAttrs};
use qroute::metrics::{evaluate, min_bandwidth, Weights};
use qroute::optimize::{
    all_optimizers, optimizers_by_names, FailureReason, OptimizeContext, RouteRequest,
};
use qroute::pareto::{k_path_benchmark, optimality_gap};
use qroute::path::check_path;

fn uniform_nodes(n: usize) -> Vec<NodeAttrs> {
    vec![
        NodeAttrs {
            processing_delay: 1.0,
            reliability: 0.99,
        };
        n
    ]
}

/// The trivial 4-node line with uniform edges.
fn line_graph() -> NetworkGraph {
    let edge = EdgeAttrs {
        bandwidth: 500.0,
        delay: 10.0,
        reliability: 0.99,
    };
    NetworkGraph::from_parts(uniform_nodes(4), vec![(0, 1, edge), (1, 2, edge), (2, 3, edge)])
        .expect("line graph is well-formed")
}

/// Two disjoint 2-hop routes 0→3: narrow (200 Mbps) via 1, wide (800 Mbps)
/// via 2.
fn gated_graph() -> NetworkGraph {
    let narrow = EdgeAttrs {
        bandwidth: 200.0,
        delay: 5.0,
        reliability: 0.99,
    };
    let wide = EdgeAttrs {
        bandwidth: 800.0,
        delay: 8.0,
        reliability: 0.99,
    };
    NetworkGraph::from_parts(
        uniform_nodes(4),
        vec![(0, 1, narrow), (1, 3, narrow), (0, 2, wide), (2, 3, wide)],
    )
    .expect("gated graph is well-formed")
}

/// Fast-but-lossy route 0–1–3 vs slow-but-reliable 0–2–3.
fn tradeoff_graph() -> NetworkGraph {
    let lossy = EdgeAttrs {
        bandwidth: 500.0,
        delay: 4.0,
        reliability: 0.80,
    };
    let reliable = EdgeAttrs {
        bandwidth: 500.0,
        delay: 14.0,
        reliability: 0.999,
    };
    let mut nodes = uniform_nodes(4);
    for node in &mut nodes {
        node.reliability = 0.999;
    }
    NetworkGraph::from_parts(
        nodes,
        vec![(0, 1, lossy), (1, 3, lossy), (0, 2, reliable), (2, 3, reliable)],
    )
    .expect("tradeoff graph is well-formed")
}

#[test]
fn scenario_trivial_line_all_algorithms() {
    let graph = line_graph();
    let request = RouteRequest::new(0, 3, Weights::new(1.0, 0.0, 0.0).unwrap(), 100.0);

    for optimizer in all_optimizers() {
        let result = optimizer.optimize(&graph, &request, 42, &OptimizeContext::default());
        assert!(
            result.success,
            "{} failed: {:?}",
            optimizer.name(),
            result.failure_reason
        );
        assert_eq!(result.path, vec![0, 1, 2, 3], "{}", optimizer.name());
        // 3 links x 10ms + 2 internal nodes x 1ms.
        assert!((result.total_delay - 32.0).abs() < 1e-9, "{}", optimizer.name());
        assert!(
            (result.fitness - 32.0 / 200.0).abs() < 1e-9,
            "{}: fitness {}",
            optimizer.name(),
            result.fitness
        );
    }
}

#[test]
fn scenario_bandwidth_gated_choice() {
    let graph = gated_graph();
    let request = RouteRequest::new(0, 3, Weights::new(0.0, 0.0, 1.0).unwrap(), 500.0);

    for optimizer in all_optimizers() {
        let result = optimizer.optimize(&graph, &request, 42, &OptimizeContext::default());
        assert!(
            result.success,
            "{} failed: {:?}",
            optimizer.name(),
            result.failure_reason
        );
        assert_eq!(
            result.path,
            vec![0, 2, 3],
            "{} must pick the wide route",
            optimizer.name()
        );
        assert!(result.min_bandwidth >= 500.0, "{}", optimizer.name());
    }
}

#[test]
fn scenario_reliability_vs_delay_tradeoff() {
    let graph = tradeoff_graph();
    let fast = vec![0, 1, 3];
    let reliable = vec![0, 2, 3];

    for optimizer in all_optimizers() {
        let delay_result = optimizer.optimize(
            &graph,
            &RouteRequest::new(0, 3, Weights::new(1.0, 0.0, 0.0).unwrap(), 0.0),
            42,
            &OptimizeContext::default(),
        );
        assert_eq!(
            delay_result.path,
            fast,
            "{} under delay-only weights",
            optimizer.name()
        );

        let rel_result = optimizer.optimize(
            &graph,
            &RouteRequest::new(0, 3, Weights::new(0.0, 1.0, 0.0).unwrap(), 0.0),
            42,
            &OptimizeContext::default(),
        );
        assert_eq!(
            rel_result.path,
            reliable,
            "{} under reliability-only weights",
            optimizer.name()
        );

        // Balanced: whichever route is cheaper under the kernel must win.
        let w = Weights::new(0.5, 0.5, 0.0).unwrap();
        let balanced = optimizer.optimize(
            &graph,
            &RouteRequest::new(0, 3, w, 0.0),
            42,
            &OptimizeContext::default(),
        );
        let expected = evaluate(&graph, &fast, &w, 0.0)
            .cost
            .min(evaluate(&graph, &reliable, &w, 0.0).cost);
        assert!(
            (balanced.fitness - expected).abs() < 1e-9,
            "{} under balanced weights picked fitness {} (expected {})",
            optimizer.name(),
            balanced.fitness,
            expected
        );
    }
}

#[test]
fn scenario_determinism_seed_42() {
    let graph = NetworkGraph::generate(50, 0.15, 99).expect("generation succeeds");
    let request = RouteRequest::new(0, 49, Weights::balanced(), 150.0);

    for optimizer in all_optimizers() {
        let a = optimizer.optimize(&graph, &request, 42, &OptimizeContext::default());
        let b = optimizer.optimize(&graph, &request, 42, &OptimizeContext::default());
        assert_eq!(a.path, b.path, "{} path differs across runs", optimizer.name());
        assert_eq!(
            a.fitness.to_bits(),
            b.fitness.to_bits(),
            "{} fitness differs across runs",
            optimizer.name()
        );
        assert_eq!(a.seed_used, 42);
    }
}

#[test]
fn scenario_no_path_under_demand() {
    // Max bandwidth anywhere is 800; demand 900 is globally infeasible.
    let graph = gated_graph();
    let request = RouteRequest::new(0, 3, Weights::balanced(), 900.0);

    for optimizer in all_optimizers() {
        let result = optimizer.optimize(&graph, &request, 42, &OptimizeContext::default());
        assert!(!result.success, "{}", optimizer.name());
        assert_eq!(
            result.failure_reason,
            Some(FailureReason::NoPath),
            "{}",
            optimizer.name()
        );
    }
}

#[test]
fn scenario_boundary_conditions() {
    let graph = line_graph();

    for optimizer in all_optimizers() {
        // S = D.
        let result = optimizer.optimize(
            &graph,
            &RouteRequest::new(2, 2, Weights::balanced(), 0.0),
            1,
            &OptimizeContext::default(),
        );
        assert_eq!(result.failure_reason, Some(FailureReason::SameNode));

        // B = 0 disables the constraint but the path must still be simple.
        let result = optimizer.optimize(
            &graph,
            &RouteRequest::new(0, 3, Weights::balanced(), 0.0),
            1,
            &OptimizeContext::default(),
        );
        assert!(result.success, "{}", optimizer.name());
        assert!(check_path(&graph, &result.path, 0, 3, 0.0).is_ok());

        // Unknown endpoints.
        let result = optimizer.optimize(
            &graph,
            &RouteRequest::new(77, 3, Weights::balanced(), 0.0),
            1,
            &OptimizeContext::default(),
        );
        assert_eq!(result.failure_reason, Some(FailureReason::InvalidSource));
    }
}

#[test]
fn scenario_chaos_removal_disconnects() {
    let mut graph = line_graph();
    assert!(graph.remove_edge(1, 2));

    for optimizer in all_optimizers() {
        let result = optimizer.optimize(
            &graph,
            &RouteRequest::new(0, 3, Weights::balanced(), 0.0),
            42,
            &OptimizeContext::default(),
        );
        assert!(!result.success, "{}", optimizer.name());
        assert_eq!(result.failure_reason, Some(FailureReason::NoPath));
    }
}

#[test]
fn scenario_results_respect_invariants() {
    let graph = NetworkGraph::generate(40, 0.2, 3).expect("generation succeeds");
    let request = RouteRequest::new(0, 39, Weights::balanced(), 250.0);

    for optimizer in all_optimizers() {
        let result = optimizer.optimize(&graph, &request, 7, &OptimizeContext::default());
        if !result.success {
            continue;
        }
        // Simple path, right endpoints, existing edges, bandwidth honored.
        check_path(&graph, &result.path, 0, 39, 250.0)
            .unwrap_or_else(|v| panic!("{}: invalid path: {v}", optimizer.name()));
        // Reported fitness is the kernel's cost.
        let eval = evaluate(&graph, &result.path, &request.weights, request.demand);
        assert!(
            (result.fitness - eval.cost).abs() < 1e-9,
            "{}: fitness drift",
            optimizer.name()
        );
        assert_eq!(
            min_bandwidth(&graph, &result.path),
            Some(result.min_bandwidth),
            "{}",
            optimizer.name()
        );
    }
}

#[test]
fn scenario_experiment_aggregation_consistency() {
    let graph = NetworkGraph::generate(25, 0.25, 5).expect("generation succeeds");
    let cases: Vec<TestCase> = (0..3)
        .map(|i| TestCase {
            id: i + 1,
            source: 0,
            destination: 24 - i as usize,
            bandwidth_requirement: 150.0,
            weights: Weights::balanced(),
            description: format!("aggregation case {}", i + 1),
        })
        .collect();
    let algorithms = optimizers_by_names("sa,pso").expect("known names");
    let runner = ExperimentRunner::new(
        ExperimentConfig::default()
            .with_repeats(4)
            .with_master_seed(11),
    );

    let report = runner.run(&graph, &cases, &algorithms);
    assert_eq!(report.scenario_results.len(), 6);

    // Comparison-table means must match means recomputed from the cells.
    for row in &report.comparison_table {
        let cells: Vec<_> = report
            .scenario_results
            .iter()
            .filter(|c| c.algorithm == row.algorithm)
            .collect();
        let costs: Vec<f64> = cells.iter().filter_map(|c| c.avg_cost).collect();
        match row.overall_avg_cost {
            Some(avg) => {
                let expected = costs.iter().sum::<f64>() / costs.len() as f64;
                assert!(
                    (avg - expected).abs() < 1e-12,
                    "{}: {} vs {}",
                    row.algorithm,
                    avg,
                    expected
                );
            }
            None => assert!(costs.is_empty()),
        }
    }

    // JSON round-trip preserves the report.
    let json = report.to_json().expect("serializes");
    let back = ExperimentReport::from_json(&json).expect("deserializes");
    assert_eq!(back, report);
}

#[test]
fn scenario_optimality_gap_against_k_paths() {
    let graph = NetworkGraph::generate(30, 0.25, 13).expect("generation succeeds");
    let weights = Weights::balanced();
    let demand = 150.0;
    let (bench_path, bench_cost) =
        k_path_benchmark(&graph, 0, 29, &weights, demand, 100).expect("benchmark path exists");
    assert!(check_path(&graph, &bench_path, 0, 29, demand).is_ok());

    for optimizer in optimizers_by_names("ga,sa").expect("known names") {
        let result = optimizer.optimize(
            &graph,
            &RouteRequest::new(0, 29, weights, demand),
            42,
            &OptimizeContext::default(),
        );
        if result.success {
            let gap = optimality_gap(result.fitness, bench_cost);
            assert!(
                gap > -1.0 && gap < 10.0,
                "{}: implausible gap {gap}",
                optimizer.name()
            );
        }
    }
}
