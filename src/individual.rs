//! Individual representation for the genetic algorithm population.

use crate::params::{Params, Penalties, EPSILON};
use rand::seq::SliceRandom;
use rand::Rng;

/// Evaluation record of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvalIndiv {
    /// Distance plus weighted constraint violations
    pub penalized_cost: f64,
    /// Number of non-empty routes
    pub num_routes: usize,
    pub distance: f64,
    pub capacity_excess: f64,
    pub duration_excess: f64,
    pub is_feasible: bool,
}

/// A candidate solution: giant tour, route partition and its evaluation.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Permutation of the clients, depot excluded
    pub giant_tour: Vec<usize>,
    /// One client sequence per vehicle, possibly empty
    pub routes: Vec<Vec<usize>>,
    /// Successor of each client in its route, 0 for the depot
    pub successors: Vec<usize>,
    /// Predecessor of each client in its route, 0 for the depot
    pub predecessors: Vec<usize>,
    pub eval: EvalIndiv,
}

impl Individual {
    /// Create an individual with a uniformly random giant tour and no routes yet.
    pub fn random<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Self {
        let mut giant_tour: Vec<usize> = (1..=params.num_clients).collect();
        giant_tour.shuffle(rng);
        Self::from_giant_tour(params, giant_tour)
    }

    /// Wrap a giant tour; routes are filled in by Split.
    pub fn from_giant_tour(params: &Params, giant_tour: Vec<usize>) -> Self {
        Individual {
            giant_tour,
            routes: vec![Vec::new(); params.num_vehicles],
            successors: vec![0; params.num_clients + 1],
            predecessors: vec![0; params.num_clients + 1],
            eval: EvalIndiv::default(),
        }
    }

    /// Build an evaluated individual from explicit routes.
    pub fn from_routes(params: &Params, routes: Vec<Vec<usize>>, penalties: &Penalties) -> Self {
        let mut individual = Individual {
            giant_tour: routes.iter().flatten().copied().collect(),
            routes,
            successors: vec![0; params.num_clients + 1],
            predecessors: vec![0; params.num_clients + 1],
            eval: EvalIndiv::default(),
        };
        individual.evaluate_complete_cost(params, penalties);
        individual
    }

    /// Recompute the evaluation record and the successor/predecessor maps
    /// from the current routes.
    pub fn evaluate_complete_cost(&mut self, params: &Params, penalties: &Penalties) {
        let mut eval = EvalIndiv::default();

        for route in self.routes.iter().filter(|r| !r.is_empty()) {
            let mut distance = params.dist(0, route[0]);
            let mut load = 0.0;
            let mut service = 0.0;
            let mut previous = 0;

            for &client in route {
                if previous != 0 {
                    distance += params.dist(previous, client);
                    self.successors[previous] = client;
                }
                self.predecessors[client] = previous;
                load += params.clients[client].demand;
                service += params.clients[client].service_duration;
                previous = client;
            }
            self.successors[previous] = 0;
            distance += params.dist(previous, 0);

            eval.distance += distance;
            eval.num_routes += 1;
            if load > params.vehicle_capacity {
                eval.capacity_excess += load - params.vehicle_capacity;
            }
            if distance + service > params.duration_limit {
                eval.duration_excess += distance + service - params.duration_limit;
            }
        }

        eval.penalized_cost =
            eval.distance + penalties.excess_cost(eval.capacity_excess, eval.duration_excess);
        eval.is_feasible = eval.capacity_excess < EPSILON && eval.duration_excess < EPSILON;
        self.eval = eval;
    }

    /// Broken-pairs distance in `[0, 1]`.
    ///
    /// For every client the neighbour pair {predecessor, successor} of both
    /// individuals is compared; neighbours without a match in the other
    /// individual are counted, and the count is divided by `2n`.
    pub fn broken_pairs_distance(&self, other: &Individual) -> f64 {
        let n = self.successors.len().saturating_sub(1);
        if n == 0 {
            return 0.0;
        }

        let differences: usize = (1..=n)
            .map(|j| {
                unmatched(
                    [self.predecessors[j], self.successors[j]],
                    [other.predecessors[j], other.successors[j]],
                )
            })
            .sum();

        differences as f64 / (2 * n) as f64
    }

    /// Get the penalized cost.
    pub fn penalized_cost(&self) -> f64 {
        self.eval.penalized_cost
    }

    /// Check if the individual satisfies every constraint.
    pub fn is_feasible(&self) -> bool {
        self.eval.is_feasible
    }

    /// Same routes, giant tour included.
    pub fn same_tour(&self, other: &Individual) -> bool {
        self.giant_tour == other.giant_tour && self.routes == other.routes
    }
}

/// Number of entries of `a` without a counterpart in `b`, as multisets.
fn unmatched(a: [usize; 2], b: [usize; 2]) -> usize {
    if a[0] == b[0] {
        usize::from(a[1] != b[1])
    } else if a[0] == b[1] {
        usize::from(a[1] != b[0])
    } else {
        1 + usize::from(a[1] != b[0] && a[1] != b[1])
    }
}
