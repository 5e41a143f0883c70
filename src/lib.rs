//! # HGS core
//!
//! A Rust implementation of the Hybrid Genetic Search algorithm for the
//! Capacitated Vehicle Routing Problem (CVRP).
//!
//! Based on the paper "Hybrid Genetic Search for the CVRP: Open-Source Implementation
//! and SWAP* Neighborhood" by Thibaut Vidal.
//!
//! The algorithm combines genetic search with local improvement heuristics and
//! strategic management of population diversity to efficiently solve CVRP instances.
//! A solve is single-threaded and fully determined by the configured seed
//! unless a time limit is set.

pub mod circle_sector;
pub mod config;
pub mod error;
pub mod genetic;
pub mod individual;
pub mod local_search;
pub mod params;
pub mod population;
pub mod problem;
pub mod solution;
pub mod split;
pub mod utils;

use crate::config::Config;
use crate::error::{HgsError, Result};
use crate::genetic::Genetic;
use crate::individual::Individual;
use crate::local_search::LocalSearch;
use crate::params::{Params, EPSILON};
use crate::population::Population;
use crate::problem::Problem;
use crate::solution::Solution;
use crate::split::Split;
use crate::utils::SearchStatistics;

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

/// The main algorithm structure that orchestrates the hybrid genetic search.
pub struct HgsAlgorithm {
    pub problem: Problem,
    pub params: Params,
    pub population: Population,
    pub best_solution: Option<Solution>,
    pub run_time: Duration,
    pub iterations: usize,
    /// Iterations since the last improvement of the best solution of the
    /// current restart, starting at 1
    pub iterations_without_improvement: usize,
    pub restarts: usize,
    /// Elapsed time and cost of every new best feasible solution
    pub progress: Vec<(Duration, f64)>,
    pub genetic: Genetic,
    pub local_search: LocalSearch,
    pub start_time: Instant,
    rng: ChaCha8Rng,
}

impl HgsAlgorithm {
    /// Create a new HGS instance for the given problem and configuration.
    ///
    /// Fails if the instance or the configuration is invalid.
    pub fn new(problem: Problem, config: Config) -> Result<Self> {
        let params = Params::new(&problem, &config)?;
        Ok(HgsAlgorithm {
            population: Population::new(&params),
            local_search: LocalSearch::new(&params),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            problem,
            params,
            best_solution: None,
            run_time: Duration::from_secs(0),
            iterations: 0,
            iterations_without_improvement: 1,
            restarts: 0,
            progress: Vec::new(),
            genetic: Genetic,
            start_time: Instant::now(),
        })
    }

    /// Run the algorithm until the termination criteria are met.
    ///
    /// Returns the best feasible solution found, or the best infeasible one
    /// if no feasible solution was ever reached.
    pub fn run(&mut self) -> Result<Solution> {
        self.start_time = Instant::now();
        let deadline = self
            .params
            .config
            .effective_time_limit()
            .map(|limit| self.start_time + limit);
        info!(
            "solving {} with {} clients, {} vehicles, seed {}",
            self.problem.name, self.params.num_clients, self.params.num_vehicles, self.params.config.seed
        );

        self.population
            .generate_population(&self.params, &mut self.local_search, &mut self.rng, deadline);
        self.record_progress();

        self.iterations = 0;
        self.iterations_without_improvement = 1;
        while !self.should_terminate(deadline) {
            // Selection and crossover
            let (parent1, parent2) = self
                .population
                .select_parents(&mut self.rng)
                .ok_or(HgsError::EmptyPopulation)?;
            let max_routes = parent1.eval.num_routes;
            let tour = self.genetic.crossover_ox(parent1, parent2, &mut self.rng);

            // Split, education and insertion
            let mut offspring = Individual::from_giant_tour(&self.params, tour);
            Split::general_split(&mut offspring, &self.params, &self.population.penalties, max_routes);
            let improved = self.population.educate_and_insert(
                offspring,
                &self.params,
                &mut self.local_search,
                &mut self.rng,
            );

            if improved {
                self.iterations_without_improvement = 1;
                self.record_progress();
            } else {
                self.iterations_without_improvement += 1;
            }

            // Penalty management and traces
            if self.iterations % self.params.config.num_iters_penalty == 0 {
                self.population.manage_penalties(&self.params);
            }
            if self.iterations % self.params.config.num_iters_trace == 0 {
                self.trace_state();
            }

            // With a time limit, a stalled search restarts instead of stopping
            if deadline.is_some() && self.iterations_without_improvement == self.params.config.num_iters {
                info!("restarting after {} iterations without improvement", self.params.config.num_iters);
                self.population
                    .restart(&self.params, &mut self.local_search, &mut self.rng, deadline);
                self.record_progress();
                self.iterations_without_improvement = 1;
                self.restarts += 1;
            }

            self.iterations += 1;
        }

        self.run_time = self.start_time.elapsed();
        let best = self.best_found().ok_or(HgsError::EmptyPopulation)?;
        info!(
            "finished after {} iterations in {:.2}s, best cost {:.2} ({})",
            self.iterations,
            self.run_time.as_secs_f64(),
            best.penalized_cost,
            if best.is_feasible { "feasible" } else { "infeasible" }
        );
        self.best_solution = Some(best.clone());
        Ok(best)
    }

    /// Check if the termination criteria are met.
    fn should_terminate(&self, deadline: Option<Instant>) -> bool {
        // Terminate if we've reached max iterations without improvement
        if self.iterations_without_improvement > self.params.config.num_iters {
            return true;
        }

        // Terminate if we've reached the time limit
        deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Append the best solution overall to the progress record if it improved.
    fn record_progress(&mut self) {
        if let Some(best) = self.population.best_solution_overall() {
            let cost = best.eval.penalized_cost;
            if self.progress.last().map_or(true, |&(_, last)| cost < last - EPSILON) {
                self.progress.push((self.start_time.elapsed(), cost));
            }
        }
    }

    fn trace_state(&self) {
        let fmt_cost = |c: Option<f64>| c.map_or_else(|| "-".to_string(), |c| format!("{:.2}", c));
        debug!(
            "It {:6} {:6} | T(s) {:.2} | Feas {} {} {} | Inf {} {} {} | Div {} {} | Feas {:.2} {:.2} | Pen {:.2} {:.2}",
            self.iterations,
            self.iterations_without_improvement,
            self.start_time.elapsed().as_secs_f64(),
            self.population.feasible_len(),
            fmt_cost(self.population.best_feasible().map(|i| i.eval.penalized_cost)),
            fmt_cost(self.population.average_cost(true)),
            self.population.infeasible_len(),
            fmt_cost(self.population.best_infeasible().map(|i| i.eval.penalized_cost)),
            fmt_cost(self.population.average_cost(false)),
            fmt_cost(self.population.diversity(true)),
            fmt_cost(self.population.diversity(false)),
            self.population.feasible_ratio_load(),
            self.population.feasible_ratio_duration(),
            self.population.penalties.capacity,
            self.population.penalties.duration
        );
    }

    /// Cheapest feasible solution currently in the population.
    pub fn best_feasible(&self) -> Option<Solution> {
        self.population
            .best_feasible()
            .map(|i| Solution::from_individual(i, &self.params))
    }

    /// Cheapest infeasible solution currently in the population.
    pub fn best_infeasible(&self) -> Option<Solution> {
        self.population
            .best_infeasible()
            .map(|i| Solution::from_individual(i, &self.params))
    }

    /// Best feasible solution ever found, or else the best infeasible one.
    pub fn best_found(&self) -> Option<Solution> {
        self.population
            .best_found()
            .map(|i| Solution::from_individual(i, &self.params))
    }

    /// Summary of the last run.
    pub fn statistics(&self) -> SearchStatistics {
        let best = self.best_found();
        SearchStatistics {
            iterations: self.iterations,
            restarts: self.restarts,
            runtime: self.run_time,
            best_solution_cost: best.as_ref().map_or(f64::INFINITY, |s| s.penalized_cost),
            best_solution_distance: best.as_ref().map_or(f64::INFINITY, |s| s.distance),
            best_solution_is_feasible: best.as_ref().map_or(false, |s| s.is_feasible),
            best_solution_routes: best.as_ref().map_or(0, |s| s.get_route_count()),
            feasible_population_size: self.population.feasible_len(),
            infeasible_population_size: self.population.infeasible_len(),
            final_capacity_penalty: self.population.penalties.capacity,
            final_duration_penalty: self.population.penalties.duration,
        }
    }
}
