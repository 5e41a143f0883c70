//! Static data derived once per instance, and the adaptive penalty units.

use crate::circle_sector::CircleSector;
use crate::config::Config;
use crate::error::{HgsError, Result};
use crate::problem::Problem;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Tolerance used for every feasibility and improvement test.
pub const EPSILON: f64 = 1e-5;

/// Bounds of the penalty units.
pub const MIN_PENALTY: f64 = 0.1;
pub const MAX_PENALTY: f64 = 100_000.0;

/// Per-client data precomputed for the search.
#[derive(Debug, Clone)]
pub struct ClientData {
    pub coordinates: Option<(f64, f64)>,
    pub service_duration: f64,
    pub demand: f64,
    /// Angle around the depot on a 16-bit ring, 0 without coordinates.
    pub polar_angle: i32,
}

/// Instance parameters, read-only during the search.
#[derive(Debug, Clone)]
pub struct Params {
    pub config: Config,
    pub num_clients: usize,
    pub num_vehicles: usize,
    pub vehicle_capacity: f64,
    /// Route duration limit, infinite when the instance has none.
    pub duration_limit: f64,
    pub has_duration_constraint: bool,
    pub total_demand: f64,
    pub max_demand: f64,
    pub max_dist: f64,
    pub clients: Vec<ClientData>,
    pub dist: Vec<Vec<f64>>,
    /// For each client, its granular neighbours sorted by index.
    pub correlated_vertices: Vec<Vec<usize>>,
    pub coordinates_provided: bool,
}

impl Params {
    /// Validate the instance and precompute the derived data.
    pub fn new(problem: &Problem, config: &Config) -> Result<Self> {
        config.validate()?;

        let size = problem.clients.len();
        if size < 2 {
            return Err(HgsError::NoClients);
        }
        if problem.distance_matrix.len() != size {
            return Err(HgsError::DimensionMismatch {
                what: "distance matrix",
                expected: size,
                found: problem.distance_matrix.len(),
            });
        }
        if let Some(row) = problem.distance_matrix.iter().find(|row| row.len() != size) {
            return Err(HgsError::DimensionMismatch {
                what: "distance matrix row",
                expected: size,
                found: row.len(),
            });
        }
        if !(problem.vehicle_capacity > 0.0) {
            return Err(HgsError::NonPositiveCapacity(problem.vehicle_capacity));
        }
        if let Some(limit) = problem.duration_limit {
            if !(limit > 0.0) {
                return Err(HgsError::InvalidDurationLimit(limit));
            }
        }
        let num_vehicles = problem
            .num_vehicles
            .unwrap_or_else(|| problem.default_num_vehicles());
        if num_vehicles == 0 {
            return Err(HgsError::NoVehicles);
        }

        let num_clients = size - 1;
        let coordinates_provided = problem.clients.iter().all(|c| c.coordinates.is_some());
        let depot = problem.clients[0].coordinates;

        let clients: Vec<ClientData> = problem
            .clients
            .iter()
            .map(|c| {
                let polar_angle = match (coordinates_provided, c.coordinates, depot) {
                    (true, Some((x, y)), Some((x0, y0))) => {
                        CircleSector::positive_mod((32768.0 * (y - y0).atan2(x - x0) / PI) as i32)
                    }
                    _ => 0,
                };
                ClientData {
                    coordinates: c.coordinates,
                    service_duration: c.service_duration,
                    demand: c.demand,
                    polar_angle,
                }
            })
            .collect();

        let total_demand = clients.iter().skip(1).map(|c| c.demand).sum();
        let max_demand = clients.iter().skip(1).map(|c| c.demand).fold(0.0, f64::max);
        let max_dist = problem
            .distance_matrix
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max);

        let correlated_vertices =
            Self::correlated_vertices(&problem.distance_matrix, num_clients, config.granular_search);

        Ok(Params {
            config: config.clone(),
            num_clients,
            num_vehicles,
            vehicle_capacity: problem.vehicle_capacity,
            duration_limit: problem.duration_limit.unwrap_or(f64::INFINITY),
            has_duration_constraint: problem.duration_limit.is_some(),
            total_demand,
            max_demand,
            max_dist,
            clients,
            dist: problem.distance_matrix.clone(),
            correlated_vertices,
            coordinates_provided,
        })
    }

    /// Distance from `i` to `j`.
    #[inline]
    pub fn dist(&self, i: usize, j: usize) -> f64 {
        self.dist[i][j]
    }

    /// Whether SWAP* can be used on this instance.
    pub fn use_swap_star(&self) -> bool {
        self.config.use_swap_star && self.coordinates_provided
    }

    /// Builds the symmetrised granular neighbourhood of every client.
    fn correlated_vertices(dist: &[Vec<f64>], n: usize, granular: usize) -> Vec<Vec<usize>> {
        let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n + 1];
        let keep = granular.min(n.saturating_sub(1));

        for i in 1..=n {
            let nearest = (1..=n)
                .filter(|&j| j != i)
                .sorted_by(|&a, &b| dist[i][a].total_cmp(&dist[i][b]).then(a.cmp(&b)))
                .take(keep)
                .collect_vec();
            for j in nearest {
                sets[i].insert(j);
                sets[j].insert(i);
            }
        }

        sets.into_iter().map(|s| s.into_iter().collect()).collect()
    }
}

/// Adaptive multipliers applied to constraint violations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalties {
    pub capacity: f64,
    pub duration: f64,
}

impl Penalties {
    /// Units used at the start of a solve.
    pub fn initial(params: &Params) -> Self {
        let ratio = if params.max_demand > 0.0 {
            params.max_dist / params.max_demand
        } else {
            1000.0
        };
        Penalties {
            capacity: ratio.clamp(MIN_PENALTY, 1000.0),
            duration: 1.0,
        }
    }

    /// Both units multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Penalties {
            capacity: self.capacity * factor,
            duration: self.duration * factor,
        }
    }

    /// Penalized cost of a load and a duration excess.
    #[inline]
    pub fn excess_cost(&self, capacity_excess: f64, duration_excess: f64) -> f64 {
        capacity_excess * self.capacity + duration_excess * self.duration
    }
}
