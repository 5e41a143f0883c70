//! Tests for the Split algorithms.

mod common;

use common::{brute_force_split, line_problem, params};
use hgs_core::config::Config;
use hgs_core::individual::Individual;
use hgs_core::params::{Params, Penalties};
use hgs_core::problem::{Client, Problem};
use hgs_core::split::Split;
use proptest::prelude::*;

#[test]
fn test_split_empty_tour() {
    let params = params(&line_problem());

    let result = Split::split_simple(&[], &params).unwrap();
    assert!(result.routes.is_empty());
    assert_eq!(result.cost, 0.0);
}

#[test]
fn test_split_single_customer() {
    let params = params(&line_problem());

    let result = Split::split_simple(&[1], &params).unwrap();
    assert_eq!(result.routes, vec![vec![1]]);
    // depot -> 1 -> depot
    assert!((result.cost - 20.0).abs() < 1e-6);
}

#[test]
fn test_split_multiple_customers_one_route() {
    let params = params(&line_problem());

    // Total demand 3.5 fits in one vehicle
    let result = Split::split_simple(&[1, 2, 3], &params).unwrap();
    assert_eq!(result.routes, vec![vec![1, 2, 3]]);
    assert!((result.cost - 60.0).abs() < 1e-6);
}

#[test]
fn test_split_respects_capacity() {
    let params = params(&line_problem());
    let tour = vec![1, 2, 3, 4, 5, 6];

    let result = Split::split_simple(&tour, &params).unwrap();
    for route in &result.routes {
        let load: f64 = route.iter().map(|&c| params.clients[c].demand).sum();
        assert!(load <= params.vehicle_capacity + 1e-9);
    }

    // Routes are consecutive pieces of the tour
    let flattened: Vec<usize> = result.routes.iter().flatten().copied().collect();
    assert_eq!(flattened, tour);

    let expected = brute_force_split(&params, &tour, usize::MAX).unwrap();
    assert!((result.cost - expected).abs() < 1e-6);
}

#[test]
fn test_split_limited_fleet_matches_brute_force() {
    let params = params(&line_problem());
    let tour = vec![6, 1, 5, 2, 4, 3];

    for max_routes in 2..=4 {
        let result = Split::split_limited_fleet(&tour, &params, max_routes).unwrap();
        assert!(result.routes.len() <= max_routes);
        let expected = brute_force_split(&params, &tour, max_routes).unwrap();
        assert!((result.cost - expected).abs() < 1e-6, "max_routes {}", max_routes);
    }
}

#[test]
fn test_split_limited_fleet_without_feasible_partition() {
    let params = params(&line_problem());

    // Total demand 9 cannot be served by a single vehicle of capacity 5
    assert!(Split::split_limited_fleet(&[1, 2, 3, 4, 5, 6], &params, 1).is_none());
}

#[test]
fn test_split_oversized_client() {
    let mut problem = line_problem();
    problem.clients[3].demand = 6.0;
    let params = params(&problem);
    let tour = vec![1, 2, 3, 4, 5, 6];

    assert!(Split::split_simple(&tour, &params).is_none());
    assert!(Split::split_limited_fleet(&tour, &params, 4).is_none());

    let penalties = Penalties {
        capacity: 10.0,
        duration: 1.0,
    };
    let result = Split::split_penalized(&tour, &params, &penalties, 4).unwrap();
    let flattened: Vec<usize> = result.routes.iter().flatten().copied().collect();
    assert_eq!(flattened, tour);
}

#[test]
fn test_split_penalized_prices_excess() {
    let params = params(&line_problem());
    let penalties = Penalties {
        capacity: 3.0,
        duration: 1.0,
    };

    // A single vehicle carries 9 for a capacity of 5
    let result = Split::split_penalized(&[1, 2, 3, 4, 5, 6], &params, &penalties, 1).unwrap();
    assert_eq!(result.routes.len(), 1);
    assert!((result.cost - (120.0 + 4.0 * 3.0)).abs() < 1e-6);
}

#[test]
fn test_general_split_pads_routes_and_evaluates() {
    let params = params(&line_problem());
    let penalties = Penalties::initial(&params);

    let mut individual = Individual::from_giant_tour(&params, vec![1, 2, 3, 4, 5, 6]);
    Split::general_split(&mut individual, &params, &penalties, params.num_vehicles);

    assert_eq!(individual.routes.len(), params.num_vehicles);
    assert!(individual.is_feasible());
    let expected = brute_force_split(&params, &individual.giant_tour, params.num_vehicles).unwrap();
    assert!((individual.eval.distance - expected).abs() < 1e-6);
    assert_eq!(
        individual.eval.num_routes,
        individual.routes.iter().filter(|r| !r.is_empty()).count()
    );
}

#[test]
fn test_general_split_raises_bound_to_bin_packing() {
    let params = params(&line_problem());
    let penalties = Penalties::initial(&params);

    // A bound of one route is raised to ceil(9 / 5) = 2
    let mut individual = Individual::from_giant_tour(&params, vec![1, 2, 3, 4, 5, 6]);
    Split::general_split(&mut individual, &params, &penalties, 1);
    assert!(individual.is_feasible());
    assert!(individual.eval.num_routes >= 2);
}

#[test]
fn test_general_split_falls_back_to_penalized() {
    let mut problem = line_problem().with_num_vehicles(2);
    problem.clients[6].demand = 5.0;
    let params = params(&problem);
    let penalties = Penalties::initial(&params);

    // Total demand 12 does not fit in two vehicles of capacity 5
    let mut individual = Individual::from_giant_tour(&params, vec![1, 2, 3, 4, 5, 6]);
    Split::general_split(&mut individual, &params, &penalties, 2);

    assert!(!individual.is_feasible());
    assert!(individual.eval.capacity_excess > 0.0);
    assert!(individual.eval.num_routes <= 2);
    let served: usize = individual.routes.iter().map(|r| r.len()).sum();
    assert_eq!(served, 6);
}

fn random_params(points: &[(f64, f64, f64)]) -> Params {
    let mut clients = vec![Client::at(50.0, 50.0, 0.0)];
    clients.extend(points.iter().map(|&(x, y, d)| Client::at(x, y, d)));
    let problem = Problem::euclidean("random", clients, 10.0).with_num_vehicles(points.len());
    Params::new(&problem, &Config::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The linear split is optimal among all cuts of the tour.
    #[test]
    fn split_simple_is_optimal(
        points in prop::collection::vec((0.0..100.0f64, 0.0..100.0f64, 1.0..6.0f64), 1..9),
    ) {
        let params = random_params(&points);
        let tour: Vec<usize> = (1..=points.len()).collect();

        let result = Split::split_simple(&tour, &params).unwrap();
        let expected = brute_force_split(&params, &tour, usize::MAX).unwrap();
        prop_assert!((result.cost - expected).abs() < 1e-6);
    }

    /// The fleet-limited split is optimal among the cuts using at most k routes.
    #[test]
    fn split_limited_fleet_is_optimal(
        points in prop::collection::vec((0.0..100.0f64, 0.0..100.0f64, 1.0..6.0f64), 1..9),
        max_routes in 1usize..5,
    ) {
        let params = random_params(&points);
        let tour: Vec<usize> = (1..=points.len()).rev().collect();

        let result = Split::split_limited_fleet(&tour, &params, max_routes);
        let expected = brute_force_split(&params, &tour, max_routes);
        prop_assert_eq!(result.is_some(), expected.is_some());
        if let (Some(result), Some(expected)) = (result, expected) {
            prop_assert!(result.routes.len() <= max_routes);
            prop_assert!((result.cost - expected).abs() < 1e-6);
        }
    }
}
