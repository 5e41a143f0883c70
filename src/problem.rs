//! Problem definition and data structures for CVRP.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Represents a location (client or depot) of the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default)]
    pub coordinates: Option<(f64, f64)>,
    #[serde(default)]
    pub service_duration: f64,
    pub demand: f64,
}

impl Client {
    /// Create a new client without coordinates.
    pub fn new(demand: f64, service_duration: f64) -> Self {
        Client {
            coordinates: None,
            service_duration,
            demand,
        }
    }

    /// Create a new client located at `(x, y)`.
    pub fn at(x: f64, y: f64, demand: f64) -> Self {
        Client {
            coordinates: Some((x, y)),
            service_duration: 0.0,
            demand,
        }
    }

    /// Set the service duration.
    pub fn with_service_duration(mut self, duration: f64) -> Self {
        self.service_duration = duration;
        self
    }

    /// Calculate the Euclidean distance between two located clients.
    pub fn distance(&self, other: &Client) -> Option<f64> {
        let (x1, y1) = self.coordinates?;
        let (x2, y2) = other.coordinates?;
        let dx = x1 - x2;
        let dy = y1 - y2;
        Some((dx * dx + dy * dy).sqrt())
    }
}

/// Represents a single-depot CVRP instance. Index 0 is the depot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub name: String,
    pub clients: Vec<Client>,
    pub distance_matrix: Vec<Vec<f64>>,
    pub vehicle_capacity: f64,
    #[serde(default)]
    pub duration_limit: Option<f64>,
    #[serde(default)]
    pub num_vehicles: Option<usize>,
}

impl Problem {
    /// Create a new CVRP problem from an explicit distance matrix.
    pub fn new(
        name: impl Into<String>,
        clients: Vec<Client>,
        distance_matrix: Vec<Vec<f64>>,
        vehicle_capacity: f64,
    ) -> Self {
        Problem {
            name: name.into(),
            clients,
            distance_matrix,
            vehicle_capacity,
            duration_limit: None,
            num_vehicles: None,
        }
    }

    /// Create a problem whose distance matrix is the Euclidean distance
    /// between the client coordinates.
    ///
    /// Clients without coordinates are placed at the origin.
    pub fn euclidean(name: impl Into<String>, clients: Vec<Client>, vehicle_capacity: f64) -> Self {
        let distance_matrix = Self::compute_distance_matrix(&clients);
        Problem::new(name, clients, distance_matrix, vehicle_capacity)
    }

    /// Set the maximum duration of a route.
    pub fn with_duration_limit(mut self, limit: f64) -> Self {
        self.duration_limit = Some(limit);
        self
    }

    /// Set the upper bound on the number of vehicles.
    pub fn with_num_vehicles(mut self, vehicles: usize) -> Self {
        self.num_vehicles = Some(vehicles);
        self
    }

    /// Get the number of clients (excluding the depot).
    pub fn get_client_count(&self) -> usize {
        self.clients.len().saturating_sub(1)
    }

    /// Sum of all client demands.
    pub fn total_demand(&self) -> f64 {
        self.clients.iter().skip(1).map(|c| c.demand).sum()
    }

    /// Fleet bound used when the instance does not provide one.
    pub fn default_num_vehicles(&self) -> usize {
        if self.vehicle_capacity <= 0.0 {
            return 3;
        }
        (1.3 * self.total_demand() / self.vehicle_capacity).ceil() as usize + 3
    }

    /// Load a problem from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a problem from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Generate the full distance matrix for all clients.
    fn compute_distance_matrix(clients: &[Client]) -> Vec<Vec<f64>> {
        let n = clients.len();
        let origin = Client::at(0.0, 0.0, 0.0);
        let located: Vec<Client> = clients
            .iter()
            .map(|c| {
                if c.coordinates.is_some() {
                    c.clone()
                } else {
                    Client {
                        coordinates: origin.coordinates,
                        ..c.clone()
                    }
                }
            })
            .collect();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrix[i][j] = located[i].distance(&located[j]).unwrap_or(0.0);
                }
            }
        }

        matrix
    }
}
