//! Population management for the genetic algorithm.

use crate::individual::Individual;
use crate::local_search::LocalSearch;
use crate::params::{Params, Penalties, EPSILON, MAX_PENALTY, MIN_PENALTY};
use crate::split::Split;
use log::debug;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

/// Distance to another individual of the same subpopulation.
#[derive(Debug, Clone, Copy)]
struct ProximityKey {
    distance: f64,
    id: u64,
}

impl PartialEq for ProximityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ProximityKey {}

impl PartialOrd for ProximityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProximityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// An individual stored in a subpopulation.
#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    individual: Individual,
    /// The biased fitness based on cost and diversity ranks
    biased_fitness: f64,
    /// Other members of the subpopulation, closest first
    proximity: BTreeSet<ProximityKey>,
}

impl Entry {
    /// Average distance to the `n` closest members.
    fn average_distance_closest(&self, n: usize) -> f64 {
        let count = n.min(self.proximity.len());
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self.proximity.iter().take(count).map(|k| k.distance).sum();
        sum / count as f64
    }
}

/// Manages the two subpopulations of the genetic algorithm.
pub struct Population {
    /// Feasible individuals, sorted by penalized cost
    feasible: Vec<Entry>,
    /// Infeasible individuals, sorted by penalized cost
    infeasible: Vec<Entry>,
    /// Current penalty units
    pub penalties: Penalties,
    /// Capacity feasibility of the most recent offspring
    feasibility_load: VecDeque<bool>,
    /// Duration feasibility of the most recent offspring
    feasibility_duration: VecDeque<bool>,
    best_solution_restart: Option<Individual>,
    best_solution_overall: Option<Individual>,
    population_size: usize,
    generation_size: usize,
    num_elites: usize,
    num_closes: usize,
    next_id: u64,
}

impl Population {
    /// Create an empty population with the initial penalty units.
    pub fn new(params: &Params) -> Self {
        let config = &params.config;
        let window = config.num_iters_penalty.max(1);
        Population {
            feasible: Vec::with_capacity(config.max_subpopulation_size() + 1),
            infeasible: Vec::with_capacity(config.max_subpopulation_size() + 1),
            penalties: Penalties::initial(params),
            feasibility_load: VecDeque::from(vec![true; window]),
            feasibility_duration: VecDeque::from(vec![true; window]),
            best_solution_restart: None,
            best_solution_overall: None,
            population_size: config.population_size,
            generation_size: config.generation_size,
            num_elites: config.num_elites,
            num_closes: config.num_closes,
            next_id: 0,
        }
    }

    /// Fill the population with `4 × population_size` random individuals,
    /// each split, educated and possibly repaired. Stops early once
    /// `deadline` has passed, after at least one individual.
    ///
    /// Returns whether a new best feasible solution was found.
    pub fn generate_population<R: Rng + ?Sized>(
        &mut self,
        params: &Params,
        local_search: &mut LocalSearch,
        rng: &mut R,
        deadline: Option<Instant>,
    ) -> bool {
        let mut improved = false;
        for i in 0..4 * self.population_size {
            if i > 0 && deadline.map_or(false, |d| Instant::now() >= d) {
                break;
            }
            let mut individual = Individual::random(params, rng);
            Split::general_split(&mut individual, params, &self.penalties, params.num_vehicles);
            improved |= self.educate_and_insert(individual, params, local_search, rng);
        }
        debug!(
            "initial population: {} feasible, {} infeasible",
            self.feasible.len(),
            self.infeasible.len()
        );
        improved
    }

    /// Educate a split individual, insert it, and insert its repaired copy
    /// when the repair reaches feasibility.
    ///
    /// Returns whether a new best feasible solution was found.
    pub fn educate_and_insert<R: Rng + ?Sized>(
        &mut self,
        mut individual: Individual,
        params: &Params,
        local_search: &mut LocalSearch,
        rng: &mut R,
    ) -> bool {
        local_search.educate(&mut individual, params, &self.penalties, rng);
        let mut improved = self.add_individual(&individual, true);

        if !individual.is_feasible() && rng.gen_bool(params.config.repair_probability) {
            local_search.repair(
                &mut individual,
                params,
                &self.penalties,
                params.config.repair_penalty_factor,
                rng,
            );
            if individual.is_feasible() {
                improved |= self.add_individual(&individual, false);
            }
        }
        improved
    }

    /// Insert a copy of `individual` into its subpopulation.
    ///
    /// With `update_feasible`, its feasibility is recorded in the windows
    /// driving the penalty adaptation. Survivor selection runs once the
    /// subpopulation exceeds `population_size + generation_size`. Returns
    /// whether it improves the best feasible solution since the last restart.
    pub fn add_individual(&mut self, individual: &Individual, update_feasible: bool) -> bool {
        if update_feasible {
            self.record_feasibility(
                individual.eval.capacity_excess < EPSILON,
                individual.eval.duration_excess < EPSILON,
            );
        }

        let id = self.next_id;
        self.next_id += 1;
        let max_size = self.population_size + self.generation_size;
        let min_size = self.population_size;
        let num_elites = self.num_elites;
        let num_closes = self.num_closes;

        let subpop = if individual.is_feasible() {
            &mut self.feasible
        } else {
            &mut self.infeasible
        };

        let mut entry = Entry {
            id,
            individual: individual.clone(),
            biased_fitness: 0.0,
            proximity: BTreeSet::new(),
        };
        for other in subpop.iter_mut() {
            let distance = individual.broken_pairs_distance(&other.individual);
            other.proximity.insert(ProximityKey { distance, id });
            entry.proximity.insert(ProximityKey {
                distance,
                id: other.id,
            });
        }

        let cost = individual.eval.penalized_cost;
        let mut place = subpop.len();
        while place > 0 && subpop[place - 1].individual.eval.penalized_cost > cost - EPSILON {
            place -= 1;
        }
        subpop.insert(place, entry);

        if subpop.len() > max_size {
            while subpop.len() > min_size {
                remove_worst_biased_fitness(subpop, num_elites, num_closes);
            }
        }

        let cost = individual.eval.penalized_cost;
        if individual.is_feasible() && cost < best_cost(&self.best_solution_restart) - EPSILON {
            self.best_solution_restart = Some(individual.clone());
            if cost < best_cost(&self.best_solution_overall) - EPSILON {
                self.best_solution_overall = Some(individual.clone());
            }
            return true;
        }
        false
    }

    /// Push the feasibility flags of a new offspring into the sliding windows.
    pub fn record_feasibility(&mut self, load_feasible: bool, duration_feasible: bool) {
        self.feasibility_load.push_back(load_feasible);
        self.feasibility_load.pop_front();
        self.feasibility_duration.push_back(duration_feasible);
        self.feasibility_duration.pop_front();
    }

    /// Adapt the penalty units to steer the share of feasible offspring
    /// toward the target, then re-price the infeasible subpopulation.
    pub fn manage_penalties(&mut self, params: &Params) {
        let config = &params.config;
        let target = config.target_feasible_ratio;
        let adapt = |unit: f64, ratio: f64| {
            if ratio < target - 0.05 && unit < MAX_PENALTY {
                (unit * config.penalty_increase).min(MAX_PENALTY)
            } else if ratio > target + 0.05 && unit > MIN_PENALTY {
                (unit * config.penalty_decrease).max(MIN_PENALTY)
            } else {
                unit
            }
        };

        self.penalties.capacity = adapt(self.penalties.capacity, self.feasible_ratio_load());
        self.penalties.duration = adapt(self.penalties.duration, self.feasible_ratio_duration());

        let penalties = self.penalties;
        for entry in self.infeasible.iter_mut() {
            let eval = &mut entry.individual.eval;
            eval.penalized_cost =
                eval.distance + penalties.excess_cost(eval.capacity_excess, eval.duration_excess);
        }
        self.infeasible.sort_by(|a, b| {
            a.individual
                .eval
                .penalized_cost
                .total_cmp(&b.individual.eval.penalized_cost)
        });
    }

    /// Clear both subpopulations and generate a fresh one.
    ///
    /// The best solution overall and the penalty units are kept.
    pub fn restart<R: Rng + ?Sized>(
        &mut self,
        params: &Params,
        local_search: &mut LocalSearch,
        rng: &mut R,
        deadline: Option<Instant>,
    ) -> bool {
        self.feasible.clear();
        self.infeasible.clear();
        self.best_solution_restart = None;
        self.generate_population(params, local_search, rng, deadline)
    }

    /// Select two parents by binary tournament on the biased fitness.
    ///
    /// The second parent is drawn again a few times while it is the same
    /// individual as the first one.
    pub fn select_parents<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Option<(&Individual, &Individual)> {
        if self.len() == 0 {
            return None;
        }
        update_biased_fitness(&mut self.feasible, self.num_elites, self.num_closes);
        update_biased_fitness(&mut self.infeasible, self.num_elites, self.num_closes);

        let first = self.binary_tournament(rng);
        let mut second = self.binary_tournament(rng);
        for _ in 0..10 {
            if second != first || self.len() < 2 {
                break;
            }
            second = self.binary_tournament(rng);
        }

        Some((&self.entry(first).individual, &self.entry(second).individual))
    }

    /// Position in the concatenation of both subpopulations of the winner of
    /// a binary tournament.
    fn binary_tournament<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let place1 = rng.gen_range(0..self.len());
        let place2 = rng.gen_range(0..self.len());
        if self.entry(place1).biased_fitness < self.entry(place2).biased_fitness {
            place1
        } else {
            place2
        }
    }

    fn entry(&self, place: usize) -> &Entry {
        if place < self.feasible.len() {
            &self.feasible[place]
        } else {
            &self.infeasible[place - self.feasible.len()]
        }
    }

    /// Total number of stored individuals.
    pub fn len(&self) -> usize {
        self.feasible.len() + self.infeasible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn feasible_len(&self) -> usize {
        self.feasible.len()
    }

    pub fn infeasible_len(&self) -> usize {
        self.infeasible.len()
    }

    /// Feasible individuals, cheapest first.
    pub fn feasible_individuals(&self) -> impl Iterator<Item = &Individual> {
        self.feasible.iter().map(|e| &e.individual)
    }

    /// Infeasible individuals, cheapest first.
    pub fn infeasible_individuals(&self) -> impl Iterator<Item = &Individual> {
        self.infeasible.iter().map(|e| &e.individual)
    }

    /// Cheapest feasible individual currently stored.
    pub fn best_feasible(&self) -> Option<&Individual> {
        self.feasible.first().map(|e| &e.individual)
    }

    /// Cheapest infeasible individual currently stored.
    pub fn best_infeasible(&self) -> Option<&Individual> {
        self.infeasible.first().map(|e| &e.individual)
    }

    /// Best feasible solution since the last restart.
    pub fn best_solution_restart(&self) -> Option<&Individual> {
        self.best_solution_restart.as_ref()
    }

    /// Best feasible solution ever inserted.
    pub fn best_solution_overall(&self) -> Option<&Individual> {
        self.best_solution_overall.as_ref()
    }

    /// Best feasible solution ever inserted, or else the best infeasible one
    /// currently stored.
    pub fn best_found(&self) -> Option<&Individual> {
        self.best_solution_overall
            .as_ref()
            .or_else(|| self.best_infeasible())
    }

    /// Share of recent offspring satisfying the capacity constraint.
    pub fn feasible_ratio_load(&self) -> f64 {
        ratio(&self.feasibility_load)
    }

    /// Share of recent offspring satisfying the duration constraint.
    pub fn feasible_ratio_duration(&self) -> f64 {
        ratio(&self.feasibility_duration)
    }

    /// Average distance to all other members among the best
    /// `population_size` individuals of a subpopulation.
    pub fn diversity(&self, feasible: bool) -> Option<f64> {
        let subpop = if feasible { &self.feasible } else { &self.infeasible };
        let count = self.population_size.min(subpop.len());
        if count == 0 {
            return None;
        }
        let sum: f64 = subpop[..count]
            .iter()
            .map(|e| e.average_distance_closest(subpop.len()))
            .sum();
        Some(sum / count as f64)
    }

    /// Average penalized cost of the best `population_size` individuals of a
    /// subpopulation.
    pub fn average_cost(&self, feasible: bool) -> Option<f64> {
        let subpop = if feasible { &self.feasible } else { &self.infeasible };
        let count = self.population_size.min(subpop.len());
        if count == 0 {
            return None;
        }
        let sum: f64 = subpop[..count]
            .iter()
            .map(|e| e.individual.eval.penalized_cost)
            .sum();
        Some(sum / count as f64)
    }

    /// Biased fitness of every member of a subpopulation, in cost order.
    pub fn biased_fitnesses(&mut self, feasible: bool) -> Vec<f64> {
        let (num_elites, num_closes) = (self.num_elites, self.num_closes);
        let subpop = if feasible { &mut self.feasible } else { &mut self.infeasible };
        update_biased_fitness(subpop, num_elites, num_closes);
        subpop.iter().map(|e| e.biased_fitness).collect()
    }
}

fn best_cost(individual: &Option<Individual>) -> f64 {
    individual
        .as_ref()
        .map_or(f64::INFINITY, |i| i.eval.penalized_cost)
}

fn ratio(window: &VecDeque<bool>) -> f64 {
    if window.is_empty() {
        return 1.0;
    }
    window.iter().filter(|&&f| f).count() as f64 / window.len() as f64
}

/// Biased fitness from the cost rank (position in the subpopulation) and the
/// diversity rank, both normalised to `[0, 1]`.
fn update_biased_fitness(subpop: &mut [Entry], num_elites: usize, num_closes: usize) {
    let size = subpop.len();
    if size == 1 {
        subpop[0].biased_fitness = 0.0;
    }
    if size <= 1 {
        return;
    }

    // Most distant first
    let mut ranking: Vec<(f64, usize)> = subpop
        .iter()
        .enumerate()
        .map(|(i, e)| (-e.average_distance_closest(num_closes), i))
        .collect();
    ranking.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let scale = (size - 1) as f64;
    for (div_rank, &(_, place)) in ranking.iter().enumerate() {
        let div_rank = div_rank as f64 / scale;
        let fit_rank = place as f64 / scale;
        subpop[place].biased_fitness = if size <= num_elites {
            fit_rank
        } else {
            fit_rank + (1.0 - num_elites as f64 / size as f64) * div_rank
        };
    }
}

/// Remove the member with the worst biased fitness, clones first. The
/// cheapest member is never removed.
fn remove_worst_biased_fitness(subpop: &mut Vec<Entry>, num_elites: usize, num_closes: usize) {
    update_biased_fitness(subpop, num_elites, num_closes);
    if subpop.len() <= 1 {
        return;
    }

    let mut worst = 1;
    let mut worst_is_clone = false;
    let mut worst_fitness = f64::NEG_INFINITY;
    for (place, entry) in subpop.iter().enumerate().skip(1) {
        let is_clone = entry.average_distance_closest(1) < EPSILON;
        if (is_clone && !worst_is_clone)
            || (is_clone == worst_is_clone && entry.biased_fitness > worst_fitness)
        {
            worst = place;
            worst_is_clone = is_clone;
            worst_fitness = entry.biased_fitness;
        }
    }

    let removed = subpop.remove(worst);
    for entry in subpop.iter_mut() {
        entry.proximity.retain(|k| k.id != removed.id);
    }
}
