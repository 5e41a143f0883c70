//! Integration tests for the full genetic search.

mod common;

use common::{asymmetric_problem, brute_force_optimum, grid_problem, params, route_distance};
use hgs_core::config::Config;
use hgs_core::error::HgsError;
use hgs_core::problem::{Client, Problem};
use hgs_core::HgsAlgorithm;
use std::collections::BTreeSet;
use std::time::Duration;

fn square_problem() -> Problem {
    let clients = vec![
        Client::at(0.0, 0.0, 0.0),
        Client::at(10.0, 0.0, 4.0),
        Client::at(10.0, 10.0, 4.0),
        Client::at(0.0, 10.0, 4.0),
        Client::at(-10.0, -10.0, 4.0),
    ];
    Problem::euclidean("square", clients, 10.0).with_num_vehicles(2)
}

fn quick_config(seed: u64) -> Config {
    Config::default()
        .with_seed(seed)
        .with_population_size(10)
        .with_generation_size(20)
        .with_num_iters(200)
}

#[test]
fn test_small_instance_reaches_optimum() {
    let problem = square_problem();
    let optimum = brute_force_optimum(&params(&problem)).unwrap();

    let mut algorithm = HgsAlgorithm::new(problem, quick_config(1)).unwrap();
    let solution = algorithm.run().unwrap();

    assert!(solution.is_feasible);
    assert!((solution.distance - optimum).abs() < 1e-6);
    assert!(solution.get_route_count() <= 2);
}

#[test]
fn test_asymmetric_instances_reach_optimum() {
    for seed in [3, 8, 13, 21] {
        let problem = asymmetric_problem(seed, 6, 3.0, 3);
        let params = params(&problem);
        let optimum = brute_force_optimum(&params).unwrap();

        let mut algorithm = HgsAlgorithm::new(problem, quick_config(seed)).unwrap();
        let solution = algorithm.run().unwrap();

        assert!(solution.is_feasible);
        assert!((solution.distance - optimum).abs() < 1e-6, "seed {}: {} vs {}", seed, solution.distance, optimum);
        let directed: f64 = solution
            .routes
            .iter()
            .map(|r| route_distance(&params, &r.customers))
            .sum();
        assert!((solution.distance - directed).abs() < 1e-6);
    }
}

#[test]
fn test_solution_visits_every_client_once() {
    let problem = grid_problem(4, 5, 10.0, 6);
    let capacity = problem.vehicle_capacity;
    let mut algorithm = HgsAlgorithm::new(problem, quick_config(2)).unwrap();
    let solution = algorithm.run().unwrap();

    let visited: Vec<usize> = solution.routes.iter().flat_map(|r| r.customers.clone()).collect();
    let unique: BTreeSet<usize> = visited.iter().copied().collect();
    assert_eq!(visited.len(), 20);
    assert_eq!(unique, (1..=20).collect());

    assert!(solution.is_feasible);
    assert!(solution.routes.len() <= 6);
    assert!(solution.routes.iter().all(|r| !r.is_empty()));
    for route in &solution.routes {
        assert!(route.load <= capacity + 1e-9);
    }

    let total: f64 = solution
        .routes
        .iter()
        .map(|r| route_distance(&algorithm.params, &r.customers))
        .sum();
    assert!((total - solution.distance).abs() < 1e-6);
}

#[test]
fn test_runs_are_reproducible() {
    let first = HgsAlgorithm::new(grid_problem(4, 5, 10.0, 6), quick_config(3))
        .unwrap()
        .run()
        .unwrap();
    let second = HgsAlgorithm::new(grid_problem(4, 5, 10.0, 6), quick_config(3))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_duration_limit_is_respected() {
    let mut problem = grid_problem(3, 4, 100.0, 8).with_duration_limit(150.0);
    for client in problem.clients.iter_mut().skip(1) {
        client.service_duration = 2.0;
    }
    let mut algorithm = HgsAlgorithm::new(problem, quick_config(4)).unwrap();
    let solution = algorithm.run().unwrap();

    assert!(solution.is_feasible);
    for route in &solution.routes {
        assert!(route.duration <= 150.0 + 1e-6);
    }
}

#[test]
fn test_time_limit_stops_the_search() {
    let config = quick_config(5)
        .with_num_iters(1_000_000)
        .with_time_limit(Duration::from_millis(300));
    let mut algorithm = HgsAlgorithm::new(grid_problem(4, 5, 10.0, 6), config).unwrap();
    let solution = algorithm.run().unwrap();

    assert!(solution.is_feasible);
    assert!(algorithm.run_time < Duration::from_secs(10));
}

#[test]
fn test_progress_is_decreasing() {
    let mut algorithm = HgsAlgorithm::new(grid_problem(4, 5, 10.0, 6), quick_config(6)).unwrap();
    let solution = algorithm.run().unwrap();

    assert!(!algorithm.progress.is_empty());
    assert!(algorithm.progress.windows(2).all(|w| w[1].1 < w[0].1 && w[1].0 >= w[0].0));
    let last = algorithm.progress[algorithm.progress.len() - 1].1;
    assert!((last - solution.penalized_cost).abs() < 1e-9);

    let statistics = algorithm.statistics();
    assert!(statistics.best_solution_is_feasible);
    assert_eq!(statistics.best_solution_routes, solution.get_route_count());
    assert!(statistics.format().contains("Iterations"));
}

#[test]
fn test_infeasible_instance_returns_best_infeasible() {
    // Total demand 24 cannot fit in two vehicles of capacity 10
    let mut algorithm = HgsAlgorithm::new(grid_problem(3, 4, 10.0, 2), quick_config(7)).unwrap();
    let solution = algorithm.run().unwrap();

    assert!(!solution.is_feasible);
    assert!(solution.capacity_excess > 0.0);
    assert!(solution.routes.len() <= 2);
    assert!(algorithm.best_feasible().is_none());
}

#[test]
fn test_without_swap_star() {
    let config = quick_config(8).with_swap_star(false);
    let mut algorithm = HgsAlgorithm::new(grid_problem(4, 5, 10.0, 6), config).unwrap();
    let solution = algorithm.run().unwrap();

    assert!(solution.is_feasible);
}

#[test]
fn test_matrix_instance_without_coordinates() {
    let clients = (0..6).map(|i| Client::new(if i == 0 { 0.0 } else { 2.0 }, 0.0)).collect();
    let matrix = (0..6i32)
        .map(|i| {
            (0..6i32)
                .map(|j| if i == j { 0.0 } else { ((i - j).abs() * 7 + (i + j) % 3) as f64 })
                .collect()
        })
        .collect();
    let problem = Problem::new("matrix", clients, matrix, 5.0).with_num_vehicles(3);

    let mut algorithm = HgsAlgorithm::new(problem, quick_config(9)).unwrap();
    let solution = algorithm.run().unwrap();
    assert!(solution.is_feasible);
    let served: usize = solution.routes.iter().map(|r| r.customers.len()).sum();
    assert_eq!(served, 5);
}

#[test]
fn test_invalid_instance_is_rejected() {
    let problem = Problem::euclidean("depot only", vec![Client::at(0.0, 0.0, 0.0)], 10.0);
    assert!(matches!(
        HgsAlgorithm::new(problem, Config::default()),
        Err(HgsError::NoClients)
    ));
}
