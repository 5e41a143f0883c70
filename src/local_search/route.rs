//! Arena of linked route nodes used by the local search.

use super::LocalSearch;
use crate::circle_sector::CircleSector;
use crate::individual::Individual;
use crate::params::{Params, Penalties};

/// A client or depot sentinel in the linked route representation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    /// Location index, 0 for depot sentinels
    pub cour: usize,
    pub is_depot: bool,
    /// Position in the route, 0 for the start depot
    pub position: usize,
    /// Move counter when the RI moves of this node were last tested
    pub when_last_tested_ri: usize,
    pub next: usize,
    pub prev: usize,
    pub route: usize,
    /// Load from the depot up to and including this node
    pub cumulated_load: f64,
    /// Travel and service time from the depot up to and including this node
    pub cumulated_time: f64,
    /// Distance gained by travelling the prefix backwards
    pub cumulated_reversal_distance: f64,
    /// Distance saved by removing the node from its route
    pub delta_removal: f64,
}

/// Aggregated data of a route.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub cour: usize,
    pub num_customers: usize,
    pub when_last_modified: usize,
    pub when_last_tested_swap_star: usize,
    /// Start depot node
    pub depot: usize,
    pub duration: f64,
    pub load: f64,
    pub reversal_distance: f64,
    pub penalty: f64,
    /// Angle of the client barycenter, infinite for empty routes
    pub polar_angle_barycenter: f64,
    pub sector: CircleSector,
}

/// The three cheapest insertion positions of a client in a route.
#[derive(Debug, Clone)]
pub(crate) struct ThreeBestInsert {
    pub when_last_calculated: Option<usize>,
    pub best_cost: [f64; 3],
    pub best_location: [Option<usize>; 3],
}

impl Default for ThreeBestInsert {
    fn default() -> Self {
        ThreeBestInsert {
            when_last_calculated: None,
            best_cost: [f64::INFINITY; 3],
            best_location: [None; 3],
        }
    }
}

impl ThreeBestInsert {
    pub fn reset(&mut self) {
        self.best_cost = [f64::INFINITY; 3];
        self.best_location = [None; 3];
    }

    /// Keep `location` if it is among the three cheapest seen so far.
    pub fn compare_and_add(&mut self, cost: f64, location: usize) {
        if cost >= self.best_cost[2] {
            return;
        }
        if cost >= self.best_cost[1] {
            self.best_cost[2] = cost;
            self.best_location[2] = Some(location);
        } else if cost >= self.best_cost[0] {
            self.best_cost[2] = self.best_cost[1];
            self.best_location[2] = self.best_location[1];
            self.best_cost[1] = cost;
            self.best_location[1] = Some(location);
        } else {
            self.best_cost[2] = self.best_cost[1];
            self.best_location[2] = self.best_location[1];
            self.best_cost[1] = self.best_cost[0];
            self.best_location[1] = self.best_location[0];
            self.best_cost[0] = cost;
            self.best_location[0] = Some(location);
        }
    }
}

impl LocalSearch {
    /// Node index of the start depot of route `r`.
    #[inline]
    pub(crate) fn depot_start(&self, r: usize) -> usize {
        self.num_clients + 1 + r
    }

    /// Node index of the end depot of route `r`.
    #[inline]
    pub(crate) fn depot_end(&self, r: usize) -> usize {
        self.num_clients + 1 + self.routes.len() + r
    }

    /// Size the arena for `num_clients` clients and `num_routes` routes.
    fn allocate(&mut self, num_clients: usize, num_routes: usize) {
        self.num_clients = num_clients;
        self.nodes = vec![Node::default(); num_clients + 1 + 2 * num_routes];
        self.routes = (0..num_routes)
            .map(|r| Route {
                cour: r,
                num_customers: 0,
                when_last_modified: 0,
                when_last_tested_swap_star: 0,
                depot: num_clients + 1 + r,
                duration: 0.0,
                load: 0.0,
                reversal_distance: 0.0,
                penalty: 0.0,
                polar_angle_barycenter: f64::INFINITY,
                sector: CircleSector::default(),
            })
            .collect();
        self.best_insert_client = vec![vec![ThreeBestInsert::default(); num_clients + 1]; num_routes];

        for c in 1..=num_clients {
            self.nodes[c].cour = c;
        }
        for r in 0..num_routes {
            let start = self.depot_start(r);
            let end = self.depot_end(r);
            for idx in [start, end] {
                self.nodes[idx].cour = 0;
                self.nodes[idx].is_depot = true;
                self.nodes[idx].route = r;
            }
        }

        self.order_nodes = (1..=num_clients).collect();
        self.order_routes = (0..num_routes).collect();
    }

    /// Build the linked representation of `individual`.
    pub(crate) fn load_individual(&mut self, individual: &Individual, params: &Params) {
        let num_routes = individual.routes.len();
        if self.num_clients != params.num_clients || self.routes.len() != num_routes {
            self.allocate(params.num_clients, num_routes);
        }

        self.empty_routes.clear();
        self.nb_moves = 0;

        for r in 0..num_routes {
            let start = self.depot_start(r);
            let end = self.depot_end(r);
            self.routes[r].when_last_tested_swap_star = 0;
            self.nodes[start].prev = end;
            self.nodes[end].next = start;

            let mut previous = start;
            for &client in &individual.routes[r] {
                self.nodes[client].route = r;
                self.nodes[client].prev = previous;
                self.nodes[previous].next = client;
                previous = client;
            }
            self.nodes[previous].next = end;
            self.nodes[end].prev = previous;

            self.update_route_data(r, params);
        }

        for c in 1..=self.num_clients {
            self.nodes[c].when_last_tested_ri = 0;
        }
        for row in &mut self.best_insert_client {
            for option in row.iter_mut() {
                option.when_last_calculated = None;
            }
        }
    }

    /// Write the routes back into `individual`, ordered by the polar angle
    /// of their barycenter, and evaluate it with `penalties`.
    pub(crate) fn export_individual(
        &self,
        individual: &mut Individual,
        params: &Params,
        penalties: &Penalties,
    ) {
        let mut order: Vec<usize> = (0..self.routes.len()).collect();
        order.sort_by(|&a, &b| {
            self.routes[a]
                .polar_angle_barycenter
                .total_cmp(&self.routes[b].polar_angle_barycenter)
        });

        individual.giant_tour.clear();
        individual.routes = order.iter().map(|&r| self.route_clients(r)).collect();
        individual
            .giant_tour
            .extend(individual.routes.iter().flatten().copied());
        individual.evaluate_complete_cost(params, penalties);
    }

    /// Clients of route `r` in visiting order.
    pub(crate) fn route_clients(&self, r: usize) -> Vec<usize> {
        let mut clients = Vec::with_capacity(self.routes[r].num_customers);
        let mut node = self.nodes[self.depot_start(r)].next;
        while !self.nodes[node].is_depot {
            clients.push(node);
            node = self.nodes[node].next;
        }
        clients
    }

    /// Relink route `r` so that it visits `clients`. Route data is left to
    /// the caller to refresh.
    pub(crate) fn relink_route(&mut self, r: usize, clients: &[usize]) {
        let start = self.depot_start(r);
        let end = self.depot_end(r);
        let mut previous = start;
        for &client in clients {
            self.nodes[client].route = r;
            self.nodes[client].prev = previous;
            self.nodes[previous].next = client;
            previous = client;
        }
        self.nodes[previous].next = end;
        self.nodes[end].prev = previous;
    }

    /// Recompute positions, cumulated values, sector and penalty of route `r`.
    pub(crate) fn update_route_data(&mut self, r: usize, params: &Params) {
        let start = self.depot_start(r);
        let mut place = 0;
        let mut load = 0.0;
        let mut time = 0.0;
        let mut reversal_distance = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sector: Option<CircleSector> = None;

        let depot = &mut self.nodes[start];
        depot.position = 0;
        depot.cumulated_load = 0.0;
        depot.cumulated_time = 0.0;
        depot.cumulated_reversal_distance = 0.0;

        let mut previous = start;
        let mut node = self.nodes[start].next;
        loop {
            place += 1;
            let (pc, c) = (self.nodes[previous].cour, self.nodes[node].cour);
            let client = &params.clients[c];
            load += client.demand;
            time += params.dist(pc, c) + client.service_duration;
            reversal_distance += params.dist(c, pc) - params.dist(pc, c);

            let current = &mut self.nodes[node];
            current.position = place;
            current.cumulated_load = load;
            current.cumulated_time = time;
            current.cumulated_reversal_distance = reversal_distance;

            if current.is_depot {
                break;
            }
            let (x, y) = client.coordinates.unwrap_or((0.0, 0.0));
            sum_x += x;
            sum_y += y;
            match sector.as_mut() {
                Some(s) => s.extend(client.polar_angle),
                None => sector = Some(CircleSector::new(client.polar_angle)),
            }
            previous = node;
            node = self.nodes[node].next;
        }

        let penalty = self.penalty_excess_duration(time) + self.penalty_excess_load(load);
        let nb_moves = self.nb_moves;
        let route = &mut self.routes[r];
        route.duration = time;
        route.load = load;
        route.penalty = penalty;
        route.num_customers = place - 1;
        route.reversal_distance = reversal_distance;
        route.when_last_modified = nb_moves;
        route.sector = sector.unwrap_or_default();

        if route.num_customers == 0 {
            route.polar_angle_barycenter = f64::INFINITY;
            self.empty_routes.insert(r);
        } else {
            let n = route.num_customers as f64;
            let (x0, y0) = params.clients[0].coordinates.unwrap_or((0.0, 0.0));
            route.polar_angle_barycenter = (sum_y / n - y0).atan2(sum_x / n - x0);
            self.empty_routes.remove(&r);
        }
    }

    /// Move node `u` right after node `v`.
    pub(crate) fn insert_node(&mut self, u: usize, v: usize) {
        let (u_prev, u_next) = (self.nodes[u].prev, self.nodes[u].next);
        self.nodes[u_prev].next = u_next;
        self.nodes[u_next].prev = u_prev;

        let v_next = self.nodes[v].next;
        self.nodes[v_next].prev = u;
        self.nodes[u].prev = v;
        self.nodes[u].next = v_next;
        self.nodes[v].next = u;
        self.nodes[u].route = self.nodes[v].route;
    }

    /// Exchange the places of two non-adjacent nodes.
    pub(crate) fn swap_node(&mut self, u: usize, v: usize) {
        let (u_prev, u_next, u_route) = (self.nodes[u].prev, self.nodes[u].next, self.nodes[u].route);
        let (v_prev, v_next, v_route) = (self.nodes[v].prev, self.nodes[v].next, self.nodes[v].route);

        self.nodes[u_prev].next = v;
        self.nodes[u_next].prev = v;
        self.nodes[v_prev].next = u;
        self.nodes[v_next].prev = u;

        self.nodes[u].prev = v_prev;
        self.nodes[u].next = v_next;
        self.nodes[v].prev = u_prev;
        self.nodes[v].next = u_next;
        self.nodes[u].route = v_route;
        self.nodes[v].route = u_route;
    }

    #[inline]
    pub(crate) fn penalty_excess_load(&self, load: f64) -> f64 {
        (load - self.capacity).max(0.0) * self.penalty_capacity
    }

    #[inline]
    pub(crate) fn penalty_excess_duration(&self, duration: f64) -> f64 {
        (duration - self.duration_limit).max(0.0) * self.penalty_duration
    }
}

#[cfg(test)]
mod tests {
    use super::ThreeBestInsert;

    #[test]
    fn test_three_best_insert_keeps_sorted_minimum() {
        let mut best = ThreeBestInsert::default();
        for (cost, location) in [(5.0, 1), (3.0, 2), (7.0, 3), (1.0, 4), (4.0, 5)] {
            best.compare_and_add(cost, location);
        }
        assert_eq!(best.best_cost, [1.0, 3.0, 4.0]);
        assert_eq!(best.best_location, [Some(4), Some(2), Some(5)]);

        best.reset();
        assert_eq!(best.best_location, [None; 3]);
    }
}
