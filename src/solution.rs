//! Solution representation handed back to the caller.

use crate::individual::Individual;
use crate::params::Params;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a route in a CVRP solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// The sequence of client indices (excluding the depot)
    pub customers: Vec<usize>,
    /// The total load of the route
    pub load: f64,
    /// The total distance of the route
    pub distance: f64,
    /// Travel distance plus service durations
    pub duration: f64,
}

impl Route {
    /// Build the route visiting `customers` and compute its metrics.
    pub fn new(customers: Vec<usize>, params: &Params) -> Self {
        let mut distance = 0.0;
        let mut load = 0.0;
        let mut service = 0.0;
        let mut previous = 0;

        for &customer in &customers {
            distance += params.dist(previous, customer);
            load += params.clients[customer].demand;
            service += params.clients[customer].service_duration;
            previous = customer;
        }
        if !customers.is_empty() {
            distance += params.dist(previous, 0);
        }

        Route {
            customers,
            load,
            distance,
            duration: distance + service,
        }
    }

    /// Check if the route is empty.
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Get the load excess beyond the vehicle capacity.
    pub fn get_excess_load(&self, capacity: f64) -> f64 {
        (self.load - capacity).max(0.0)
    }
}

/// Represents a complete solution to a CVRP instance.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The non-empty routes
    pub routes: Vec<Route>,
    /// The total travel distance
    pub distance: f64,
    /// The total capacity violation across all routes
    pub capacity_excess: f64,
    /// The total duration violation across all routes
    pub duration_excess: f64,
    /// Distance plus penalized violations at the time of export
    pub penalized_cost: f64,
    /// Whether every route satisfies the capacity and duration limits
    pub is_feasible: bool,
}

impl Solution {
    /// Export an evaluated individual, dropping its empty routes.
    pub fn from_individual(individual: &Individual, params: &Params) -> Self {
        let routes = individual
            .routes
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| Route::new(r.clone(), params))
            .collect();

        Solution {
            routes,
            distance: individual.eval.distance,
            capacity_excess: individual.eval.capacity_excess,
            duration_excess: individual.eval.duration_excess,
            penalized_cost: individual.eval.penalized_cost,
            is_feasible: individual.eval.is_feasible,
        }
    }

    /// Get the number of routes.
    pub fn get_route_count(&self) -> usize {
        self.routes.len()
    }

    /// Get the distance if the solution is feasible.
    pub fn get_feasible_cost(&self) -> f64 {
        if self.is_feasible {
            self.distance
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        writeln!(f, "  Cost: {:.2}", self.penalized_cost)?;
        writeln!(f, "  Distance: {:.2}", self.distance)?;
        writeln!(f, "  Excess Capacity: {:.2}", self.capacity_excess)?;
        writeln!(f, "  Excess Duration: {:.2}", self.duration_excess)?;
        writeln!(f, "  Feasible: {}", self.is_feasible)?;
        writeln!(f, "  Routes: {}", self.routes.len())?;

        for (i, route) in self.routes.iter().enumerate() {
            writeln!(
                f,
                "  Route {}: {:?} (Load: {:.2}, Distance: {:.2})",
                i, route.customers, route.load, route.distance
            )?;
        }

        Ok(())
    }
}
