//! Criterion benchmarks over the six optimizers on a seeded mid-size
//! topology.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qroute::graph::NetworkGraph;
use qroute::metrics::{evaluate, Weights};
use qroute::optimize::{
    AntColonyOptimization, GeneticAlgorithm, OptimizeContext, Optimizer,
    ParticleSwarmOptimization, QLearning, RouteRequest, Sarsa, SimulatedAnnealing,
};
use qroute::optimize::aco::AcoConfig;
use qroute::optimize::ga::GaConfig;
use qroute::optimize::pso::PsoConfig;
use qroute::optimize::rl::RlConfig;
use qroute::optimize::sa::SaConfig;
use qroute::path::shortest::EdgeWeightScheme;
use qroute::path::yen::k_simple_paths;

fn bench_graph() -> NetworkGraph {
    NetworkGraph::generate(100, 0.1, 42).expect("benchmark graph generates")
}

fn bench_kernel(c: &mut Criterion) {
    let graph = bench_graph();
    let path = k_simple_paths(&graph, 0, 99, 0.0, 1, EdgeWeightScheme::Delay)
        .pop()
        .expect("path exists")
        .0;
    let weights = Weights::balanced();

    c.bench_function("evaluate_kernel", |b| {
        b.iter(|| evaluate(&graph, black_box(&path), &weights, 200.0))
    });
}

fn bench_optimizers(c: &mut Criterion) {
    let graph = bench_graph();
    let request = RouteRequest::new(0, 99, Weights::balanced(), 200.0);
    let ctx = OptimizeContext::default();

    let optimizers: Vec<Box<dyn Optimizer>> = vec![
        Box::new(GeneticAlgorithm::new(
            GaConfig::default()
                .with_population_size(60)
                .with_max_generations(60),
        )),
        Box::new(AntColonyOptimization::new(
            AcoConfig::default().with_ants(20).with_iterations(30),
        )),
        Box::new(ParticleSwarmOptimization::new(
            PsoConfig::default().with_particles(20).with_iterations(30),
        )),
        Box::new(SimulatedAnnealing::new(
            SaConfig::default()
                .with_temperatures(100.0, 0.1)
                .with_cooling_rate(0.97),
        )),
        Box::new(QLearning::new(RlConfig::default().with_episodes(800))),
        Box::new(Sarsa::new(RlConfig::default().with_episodes(800))),
    ];

    let mut group = c.benchmark_group("optimize");
    group.sample_size(10);
    for optimizer in &optimizers {
        group.bench_function(optimizer.name(), |b| {
            b.iter(|| optimizer.optimize(&graph, black_box(&request), 42, &ctx))
        });
    }
    group.finish();
}

fn bench_k_paths(c: &mut Criterion) {
    let graph = bench_graph();
    c.bench_function("yen_k50", |b| {
        b.iter(|| k_simple_paths(&graph, 0, 99, 200.0, black_box(50), EdgeWeightScheme::Delay))
    });
}

criterion_group!(benches, bench_kernel, bench_optimizers, bench_k_paths);
criterion_main!(benches);
