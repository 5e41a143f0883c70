//! Fixtures and brute-force references shared by the integration tests.
#![allow(dead_code)]

use hgs_core::config::Config;
use hgs_core::params::Params;
use hgs_core::problem::{Client, Problem};
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Depot at the origin and six clients on a line, 10 apart, capacity 5.
pub fn line_problem() -> Problem {
    let demands = [1.0, 1.0, 1.5, 1.5, 2.0, 2.0];
    let mut clients = vec![Client::at(0.0, 0.0, 0.0)];
    for (i, &demand) in demands.iter().enumerate() {
        clients.push(Client::at(10.0 * (i + 1) as f64, 0.0, demand));
    }
    Problem::euclidean("line", clients, 5.0).with_num_vehicles(4)
}

/// Depot in the middle of a `rows × cols` grid of clients with demands 1 to 3.
pub fn grid_problem(rows: usize, cols: usize, capacity: f64, num_vehicles: usize) -> Problem {
    let mut clients = vec![Client::at(50.0, 50.0, 0.0)];
    for i in 0..rows {
        for j in 0..cols {
            let id = i * cols + j;
            clients.push(Client::at(
                i as f64 * 20.0 + 10.0,
                j as f64 * 20.0 + 10.0,
                1.0 + (id % 3) as f64,
            ));
        }
    }
    Problem::euclidean(format!("grid-{}x{}", rows, cols), clients, capacity).with_num_vehicles(num_vehicles)
}

/// Random clients of unit demand whose travel costs are the Euclidean
/// distance plus a seeded detour that differs in each direction.
pub fn asymmetric_problem(seed: u64, num_clients: usize, capacity: f64, num_vehicles: usize) -> Problem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut clients = vec![Client::at(50.0, 50.0, 0.0)];
    for _ in 0..num_clients {
        clients.push(Client::at(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), 1.0));
    }
    let size = clients.len();
    let mut matrix = vec![vec![0.0; size]; size];
    for i in 0..size {
        for j in 0..size {
            if i != j {
                let euclidean = clients[i].distance(&clients[j]).unwrap_or(0.0);
                matrix[i][j] = euclidean + rng.gen_range(0.0..15.0);
            }
        }
    }
    Problem::new(format!("asym-{}", seed), clients, matrix, capacity).with_num_vehicles(num_vehicles)
}

pub fn params(problem: &Problem) -> Params {
    Params::new(problem, &Config::default()).unwrap()
}

/// Distance of the route visiting `clients` from and back to the depot.
pub fn route_distance(params: &Params, clients: &[usize]) -> f64 {
    if clients.is_empty() {
        return 0.0;
    }
    let mut distance = params.dist(0, clients[0]) + params.dist(clients[clients.len() - 1], 0);
    for pair in clients.windows(2) {
        distance += params.dist(pair[0], pair[1]);
    }
    distance
}

fn route_fits(params: &Params, clients: &[usize]) -> bool {
    let load: f64 = clients.iter().map(|&c| params.clients[c].demand).sum();
    let service: f64 = clients.iter().map(|&c| params.clients[c].service_duration).sum();
    load <= params.vehicle_capacity + 1e-9
        && route_distance(params, clients) + service <= params.duration_limit + 1e-9
}

/// Cheapest capacity- and duration-feasible cut of `tour` into at most
/// `max_routes` routes, by enumerating every cut set.
pub fn brute_force_split(params: &Params, tour: &[usize], max_routes: usize) -> Option<f64> {
    let n = tour.len();
    if n == 0 {
        return Some(0.0);
    }
    let mut best: Option<f64> = None;
    for mask in 0u32..(1 << (n - 1)) {
        if mask.count_ones() as usize + 1 > max_routes {
            continue;
        }
        let mut cost = 0.0;
        let mut feasible = true;
        let mut begin = 0;
        for end in 1..=n {
            if end == n || mask & (1 << (end - 1)) != 0 {
                let route = &tour[begin..end];
                if !route_fits(params, route) {
                    feasible = false;
                    break;
                }
                cost += route_distance(params, route);
                begin = end;
            }
        }
        if feasible && best.map_or(true, |b| cost < b) {
            best = Some(cost);
        }
    }
    best
}

/// Optimal distance of a small instance over every client order and cut.
pub fn brute_force_optimum(params: &Params) -> Option<f64> {
    (1..=params.num_clients)
        .permutations(params.num_clients)
        .filter_map(|tour| brute_force_split(params, &tour, params.num_vehicles))
        .min_by(|a, b| a.total_cmp(b))
}
