//! Configuration parameters for the HGS-CVRP algorithm.

use crate::error::{HgsError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration settings for the HGS-CVRP algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Granular search parameter, limits the number of moves in the RI local search
    pub granular_search: usize,
    /// Minimum population size (μ)
    pub population_size: usize,
    /// Number of individuals in a generation (λ)
    pub generation_size: usize,
    /// Number of elite individuals considered in fitness calculation
    pub num_elites: usize,
    /// Number of closest solutions considered in diversity calculation
    pub num_closes: usize,
    /// Number of iterations between penalty updates
    pub num_iters_penalty: usize,
    /// Target proportion of feasible individuals
    pub target_feasible_ratio: f64,
    /// Multiplier applied when there are enough feasible individuals
    pub penalty_decrease: f64,
    /// Multiplier applied when there are too few feasible individuals
    pub penalty_increase: f64,
    /// Seed of the single random generator used by the search
    pub seed: u64,
    /// Number of iterations without improvement until termination (or restart
    /// if a time limit is specified)
    pub num_iters: usize,
    /// Number of iterations between traces
    pub num_iters_trace: usize,
    /// Optional time limit for the algorithm, zero means no limit
    pub time_limit: Option<Duration>,
    /// Use the SWAP* neighborhood, only possible when coordinates are provided
    pub use_swap_star: bool,
    /// Probability of attempting a repair on an infeasible offspring
    pub repair_probability: f64,
    /// Multiplier applied to the penalty units during repair
    pub repair_penalty_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            granular_search: 20,
            population_size: 25,
            generation_size: 40,
            num_elites: 4,
            num_closes: 5,
            num_iters_penalty: 100,
            target_feasible_ratio: 0.2,
            penalty_decrease: 0.85,
            penalty_increase: 1.2,
            seed: 0,
            num_iters: 20000,
            num_iters_trace: 500,
            time_limit: None,
            use_swap_star: true,
            repair_probability: 0.5,
            repair_penalty_factor: 10.0,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the granular search parameter.
    pub fn with_granular_search(mut self, g: usize) -> Self {
        self.granular_search = g;
        self
    }

    /// Set the minimum population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the generation size.
    pub fn with_generation_size(mut self, size: usize) -> Self {
        self.generation_size = size;
        self
    }

    /// Set the number of elite individuals.
    pub fn with_num_elites(mut self, n: usize) -> Self {
        self.num_elites = n;
        self
    }

    /// Set the number of closest solutions for diversity calculation.
    pub fn with_num_closes(mut self, n: usize) -> Self {
        self.num_closes = n;
        self
    }

    /// Set the number of iterations between penalty updates.
    pub fn with_num_iters_penalty(mut self, n: usize) -> Self {
        self.num_iters_penalty = n;
        self
    }

    /// Set the target ratio of feasible individuals.
    pub fn with_target_feasible_ratio(mut self, ratio: f64) -> Self {
        self.target_feasible_ratio = ratio;
        self
    }

    /// Set the penalty decrease and increase multipliers.
    pub fn with_penalty_factors(mut self, decrease: f64, increase: f64) -> Self {
        self.penalty_decrease = decrease;
        self.penalty_increase = increase;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum iterations without improvement.
    pub fn with_num_iters(mut self, iterations: usize) -> Self {
        self.num_iters = iterations;
        self
    }

    /// Set the number of iterations between traces.
    pub fn with_num_iters_trace(mut self, iterations: usize) -> Self {
        self.num_iters_trace = iterations;
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Enable or disable the SWAP* neighborhood.
    pub fn with_swap_star(mut self, enabled: bool) -> Self {
        self.use_swap_star = enabled;
        self
    }

    /// Set the probability and strength of the repair pass.
    pub fn with_repair(mut self, probability: f64, penalty_factor: f64) -> Self {
        self.repair_probability = probability;
        self.repair_penalty_factor = penalty_factor;
        self
    }

    /// The time limit, if one is active.
    pub fn effective_time_limit(&self) -> Option<Duration> {
        self.time_limit.filter(|limit| !limit.is_zero())
    }

    /// Maximum size of a subpopulation before survivor selection.
    pub fn max_subpopulation_size(&self) -> usize {
        self.population_size + self.generation_size
    }

    /// Check that every parameter is in its admissible range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(HgsError::InvalidConfig(msg.to_string()));

        if self.population_size == 0 {
            return invalid("population_size must be at least 1");
        }
        if self.granular_search == 0 {
            return invalid("granular_search must be at least 1");
        }
        if self.num_iters_penalty == 0 {
            return invalid("num_iters_penalty must be at least 1");
        }
        if self.num_iters_trace == 0 {
            return invalid("num_iters_trace must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.target_feasible_ratio) {
            return invalid("target_feasible_ratio must lie in [0, 1]");
        }
        if !(self.penalty_increase > 1.0) {
            return invalid("penalty_increase must be greater than 1");
        }
        if !(self.penalty_decrease > 0.0 && self.penalty_decrease < 1.0) {
            return invalid("penalty_decrease must lie in (0, 1)");
        }
        if !(0.0..=1.0).contains(&self.repair_probability) {
            return invalid("repair_probability must lie in [0, 1]");
        }
        if !(self.repair_penalty_factor >= 1.0) {
            return invalid("repair_penalty_factor must be at least 1");
        }

        Ok(())
    }
}
