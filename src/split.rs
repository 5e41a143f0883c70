//! Split algorithm implementation to convert a giant tour into routes.

use crate::individual::Individual;
use crate::params::{Params, Penalties, EPSILON};
use log::trace;
use std::collections::VecDeque;

/// Routes obtained from a giant tour, with the cost of the partition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub routes: Vec<Vec<usize>>,
    pub cost: f64,
}

/// Prefix data of a giant tour, indexed from 1 like the tour positions.
struct TourData<'a> {
    params: &'a Params,
    tour: &'a [usize],
    /// Cumulated demand of the first `i` clients
    load: Vec<f64>,
    /// Distance travelled from the first client to the `i`-th one
    distance: Vec<f64>,
}

impl<'a> TourData<'a> {
    fn new(params: &'a Params, tour: &'a [usize]) -> Self {
        let n = tour.len();
        let mut load = vec![0.0; n + 1];
        let mut distance = vec![0.0; n + 1];

        for i in 1..=n {
            load[i] = load[i - 1] + params.clients[tour[i - 1]].demand;
            if i > 1 {
                distance[i] = distance[i - 1] + params.dist(tour[i - 2], tour[i - 1]);
            }
        }

        TourData {
            params,
            tour,
            load,
            distance,
        }
    }

    /// Client at tour position `i` (1-based).
    #[inline]
    fn client(&self, i: usize) -> usize {
        self.tour[i - 1]
    }

    /// Distance of the route serving positions `i+1..=j`.
    #[inline]
    fn route_distance(&self, i: usize, j: usize) -> f64 {
        self.params.dist(0, self.client(i + 1)) + self.distance[j] - self.distance[i + 1]
            + self.params.dist(self.client(j), 0)
    }

    /// Load of the route serving positions `i+1..=j`.
    #[inline]
    fn route_load(&self, i: usize, j: usize) -> f64 {
        self.load[j] - self.load[i]
    }

    /// Part of a label that does not depend on where the route ends.
    #[inline]
    fn key(&self, potential: f64, i: usize) -> f64 {
        potential + self.params.dist(0, self.client(i + 1)) - self.distance[i + 1]
    }

    /// Route boundaries back from `n` through the predecessor labels.
    fn routes(&self, pred: &[Vec<usize>], mut k: usize) -> Vec<Vec<usize>> {
        let mut routes = Vec::new();
        let mut end = self.tour.len();
        while end > 0 {
            let begin = pred[k][end];
            routes.push(self.tour[begin..end].to_vec());
            end = begin;
            k = k.saturating_sub(1);
        }
        routes.reverse();
        routes
    }
}

/// Implements the Split algorithm to optimally partition a giant tour.
pub struct Split;

impl Split {
    /// Split a giant tour into routes with an unlimited fleet.
    /// This is the linear-time split algorithm from Vidal (2016).
    ///
    /// Returns `None` if a single client exceeds the vehicle capacity.
    pub fn split_simple(tour: &[usize], params: &Params) -> Option<SplitResult> {
        if tour.is_empty() {
            return Some(SplitResult {
                routes: Vec::new(),
                cost: 0.0,
            });
        }

        let data = TourData::new(params, tour);
        let n = tour.len();
        let mut potential = vec![vec![f64::INFINITY; n + 1]];
        let mut pred = vec![vec![0; n + 1]];
        potential[0][0] = 0.0;

        Self::propagate_row(&data, params.vehicle_capacity, &mut potential, &mut pred, 0, 0)?;

        Some(SplitResult {
            routes: data.routes(&pred, 0),
            cost: potential[0][n],
        })
    }

    /// Split a giant tour into at most `max_vehicles` routes.
    ///
    /// Each row `k` of the labels holds the best cost of serving a tour
    /// prefix with exactly `k` routes. Returns `None` if no partition fits.
    pub fn split_limited_fleet(
        tour: &[usize],
        params: &Params,
        max_vehicles: usize,
    ) -> Option<SplitResult> {
        if tour.is_empty() {
            return Some(SplitResult {
                routes: Vec::new(),
                cost: 0.0,
            });
        }

        let data = TourData::new(params, tour);
        let n = tour.len();
        let max_routes = max_vehicles.min(n);
        let mut potential = vec![vec![f64::INFINITY; n + 1]; max_routes + 1];
        let mut pred = vec![vec![0; n + 1]; max_routes + 1];
        potential[0][0] = 0.0;

        for k in 0..max_routes {
            // A row that cannot reach the end still seeds the next one
            let _ = Self::propagate_row(
                &data,
                params.vehicle_capacity,
                &mut potential,
                &mut pred,
                k,
                k + 1,
            );
        }

        let (best_k, best_cost) = (1..=max_routes)
            .map(|k| (k, potential[k][n]))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

        if best_k == 0 {
            return None;
        }

        Some(SplitResult {
            routes: data.routes(&pred, best_k),
            cost: best_cost,
        })
    }

    /// Split into at most `max_vehicles` routes, pricing capacity excess
    /// with the capacity penalty instead of forbidding it.
    ///
    /// Bellman recursion over all route boundaries; always succeeds when
    /// `max_vehicles >= 1`.
    pub fn split_penalized(
        tour: &[usize],
        params: &Params,
        penalties: &Penalties,
        max_vehicles: usize,
    ) -> Option<SplitResult> {
        if tour.is_empty() {
            return Some(SplitResult {
                routes: Vec::new(),
                cost: 0.0,
            });
        }

        let data = TourData::new(params, tour);
        let n = tour.len();
        let max_routes = max_vehicles.min(n);
        let mut potential = vec![vec![f64::INFINITY; n + 1]; max_routes + 1];
        let mut pred = vec![vec![0; n + 1]; max_routes + 1];
        potential[0][0] = 0.0;

        for k in 0..max_routes {
            for i in k..n {
                let base = potential[k][i];
                if base == f64::INFINITY {
                    continue;
                }
                for j in (i + 1)..=n {
                    let excess = (data.route_load(i, j) - params.vehicle_capacity).max(0.0);
                    let cost = base + data.route_distance(i, j) + excess * penalties.capacity;
                    if cost < potential[k + 1][j] {
                        potential[k + 1][j] = cost;
                        pred[k + 1][j] = i;
                    }
                }
            }
        }

        let (best_k, best_cost) = (1..=max_routes)
            .map(|k| (k, potential[k][n]))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

        if best_k == 0 {
            return None;
        }

        Some(SplitResult {
            routes: data.routes(&pred, best_k),
            cost: best_cost,
        })
    }

    /// Partition the giant tour of `individual` into at most `max_vehicles`
    /// routes and evaluate it.
    ///
    /// The bound is raised to the bin-packing lower bound and capped at the
    /// fleet size. Tries the unlimited split first, then the fleet-limited
    /// one, and falls back to the penalized split when no capacity-feasible
    /// partition exists. Routes are padded with empty ones to the fleet size.
    pub fn general_split(
        individual: &mut Individual,
        params: &Params,
        penalties: &Penalties,
        max_vehicles: usize,
    ) {
        let lower_bound = (params.total_demand / params.vehicle_capacity).ceil() as usize;
        let max_vehicles = max_vehicles.max(lower_bound).min(params.num_vehicles).max(1);
        let tour = &individual.giant_tour;

        let result = Self::split_simple(tour, params)
            .filter(|r| r.routes.len() <= max_vehicles)
            .or_else(|| Self::split_limited_fleet(tour, params, max_vehicles))
            .or_else(|| {
                trace!("no capacity-feasible split, using penalized split");
                Self::split_penalized(tour, params, penalties, max_vehicles)
            });

        let mut routes = result.map(|r| r.routes).unwrap_or_default();
        routes.resize(params.num_vehicles.max(routes.len()), Vec::new());
        individual.routes = routes;
        individual.evaluate_complete_cost(params, penalties);
    }

    /// One deque pass: labels of row `from` are extended by one route into
    /// row `to`, which may be the same row. Returns `None` when the last
    /// position cannot be reached.
    fn propagate_row(
        data: &TourData,
        capacity: f64,
        potential: &mut [Vec<f64>],
        pred: &mut [Vec<usize>],
        from: usize,
        to: usize,
    ) -> Option<()> {
        let n = data.tour.len();
        // Row k counts k routes, so it cannot cover fewer than k positions
        let first = if from == to { 0 } else { from };
        let mut queue: VecDeque<usize> = VecDeque::with_capacity(n + 1);
        if potential[from][first] < f64::INFINITY {
            queue.push_back(first);
        }

        for j in (first + 1)..=n {
            // Drop predecessors that cannot reach j within capacity
            while let Some(&front) = queue.front() {
                if data.route_load(front, j) > capacity + EPSILON {
                    queue.pop_front();
                } else {
                    break;
                }
            }

            if let Some(&front) = queue.front() {
                potential[to][j] = potential[from][front] + data.route_distance(front, j);
                pred[to][j] = front;
            }

            if j < n && potential[from][j] < f64::INFINITY {
                let key_j = data.key(potential[from][j], j);
                let dominated = queue.back().map_or(false, |&back| {
                    data.key(potential[from][back], back) <= key_j
                        && (data.load[back] - data.load[j]).abs() < EPSILON
                });
                if !dominated {
                    while let Some(&back) = queue.back() {
                        if key_j < data.key(potential[from][back], back) + EPSILON {
                            queue.pop_back();
                        } else {
                            break;
                        }
                    }
                    queue.push_back(j);
                }
            }
        }

        (potential[to][n] < f64::INFINITY).then_some(())
    }
}
