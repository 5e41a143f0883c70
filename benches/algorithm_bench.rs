//! Benchmarks for the HGS core.

#[cfg(feature = "bench")]
extern crate criterion;

#[cfg(feature = "bench")]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hgs_core::config::Config;
use hgs_core::individual::Individual;
use hgs_core::local_search::LocalSearch;
use hgs_core::params::{Params, Penalties};
use hgs_core::problem::{Client, Problem};
use hgs_core::split::Split;
use hgs_core::HgsAlgorithm;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Create a benchmark problem of specified size.
fn create_benchmark_problem(size: usize) -> Problem {
    let mut clients = vec![Client::at(0.0, 0.0, 0.0)];

    // Customers in a grid arrangement around the depot
    let grid_size = (size as f64).sqrt().ceil() as usize;
    for i in 0..size {
        let row = i / grid_size;
        let col = i % grid_size;
        let x = col as f64 * 10.0 - grid_size as f64 * 5.0;
        let y = row as f64 * 10.0 - grid_size as f64 * 5.0;
        clients.push(Client::at(x, y, 1.0 + (i % 3) as f64));
    }

    Problem::euclidean(format!("BenchProblem_{}", size), clients, 20.0)
}

#[cfg(feature = "bench")]
fn benchmark_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for size in [50, 100, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let params = Params::new(&problem, &Config::default()).unwrap();
            let penalties = Penalties::initial(&params);
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let individual = Individual::random(&params, &mut rng);

            b.iter(|| {
                let mut offspring = individual.clone();
                Split::general_split(&mut offspring, &params, &penalties, params.num_vehicles);
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_local_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_search");

    for size in [50, 100, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let params = Params::new(&problem, &Config::default()).unwrap();
            let penalties = Penalties::initial(&params);
            let mut local_search = LocalSearch::new(&params);
            let mut rng = ChaCha8Rng::seed_from_u64(0);

            // Get a split individual to improve
            let mut individual = Individual::random(&params, &mut rng);
            Split::general_split(&mut individual, &params, &penalties, params.num_vehicles);

            b.iter(|| {
                let mut offspring = individual.clone();
                local_search.educate(&mut offspring, &params, &penalties, &mut rng);
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_convergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("convergence");
    group.measurement_time(Duration::from_secs(30));
    group.sample_size(10);

    for size in [50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let config = Config::new()
                .with_num_iters(500)
                .with_time_limit(Duration::from_secs(2));

            b.iter(|| {
                let mut algorithm = HgsAlgorithm::new(problem.clone(), config.clone()).unwrap();
                algorithm.run().unwrap();
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
criterion_group!(
    benches,
    benchmark_split,
    benchmark_local_search,
    benchmark_convergence
);

#[cfg(feature = "bench")]
criterion_main!(benches);
