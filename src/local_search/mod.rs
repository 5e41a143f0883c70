//! Local search operators for the HGS-CVRP algorithm.
//!
//! Routes are held in an arena of linked nodes: clients live at their own
//! index, and every route owns a start and an end depot sentinel. Moves are
//! evaluated on the penalized objective and applied with first improvement.

pub mod relocate;
pub(crate) mod route;
pub mod swap;
pub mod swap_star;
pub mod two_opt;
pub mod two_opt_star;

use crate::individual::Individual;
use crate::params::{Params, Penalties};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use self::route::{Node, Route, ThreeBestInsert};

/// Nodes and cached data of the pair of positions under evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Cursor {
    pub node_u: usize,
    pub node_x: usize,
    pub node_v: usize,
    pub node_y: usize,
    pub route_u: usize,
    pub route_v: usize,
    pub u_prev: usize,
    pub u: usize,
    pub x: usize,
    pub x_next: usize,
    pub v_prev: usize,
    pub v: usize,
    pub y: usize,
    pub y_next: usize,
    pub load_u: f64,
    pub load_x: f64,
    pub load_v: f64,
    pub load_y: f64,
    pub service_u: f64,
    pub service_x: f64,
    pub service_v: f64,
    pub service_y: f64,
    pub intra_route: bool,
}

/// Manages the local search phase of the HGS-CVRP algorithm.
pub struct LocalSearch {
    pub(crate) num_clients: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) routes: Vec<Route>,
    pub(crate) best_insert_client: Vec<Vec<ThreeBestInsert>>,
    pub(crate) empty_routes: BTreeSet<usize>,
    order_nodes: Vec<usize>,
    order_routes: Vec<usize>,
    /// Granular neighbourhoods, reshuffled between runs
    neighbors: Vec<Vec<usize>>,
    /// Number of applied moves, used as timestamp
    pub(crate) nb_moves: usize,
    loop_id: usize,
    search_completed: bool,
    pub(crate) capacity: f64,
    pub(crate) duration_limit: f64,
    pub(crate) penalty_capacity: f64,
    pub(crate) penalty_duration: f64,
    pub(crate) c: Cursor,
    #[cfg(test)]
    pub(crate) move_costs: Vec<f64>,
}

impl LocalSearch {
    /// Create a new local search instance for the instance described by `params`.
    pub fn new(params: &Params) -> Self {
        let mut ls = LocalSearch {
            num_clients: 0,
            nodes: Vec::new(),
            routes: Vec::new(),
            best_insert_client: Vec::new(),
            empty_routes: BTreeSet::new(),
            order_nodes: Vec::new(),
            order_routes: Vec::new(),
            neighbors: params.correlated_vertices.clone(),
            nb_moves: 0,
            loop_id: 0,
            search_completed: false,
            capacity: params.vehicle_capacity,
            duration_limit: params.duration_limit,
            penalty_capacity: 1.0,
            penalty_duration: 1.0,
            c: Cursor::default(),
            #[cfg(test)]
            move_costs: Vec::new(),
        };
        let individual = Individual::from_giant_tour(params, Vec::new());
        ls.load_individual(&individual, params);
        ls
    }

    /// Improve `individual` in place with the given penalty units.
    pub fn educate<R: Rng + ?Sized>(
        &mut self,
        individual: &mut Individual,
        params: &Params,
        penalties: &Penalties,
        rng: &mut R,
    ) {
        self.run(individual, params, penalties, penalties, rng);
    }

    /// Run the search with both penalty units multiplied by `factor` to
    /// drive an infeasible individual back to feasibility.
    ///
    /// The result is evaluated with the regular `penalties`.
    pub fn repair<R: Rng + ?Sized>(
        &mut self,
        individual: &mut Individual,
        params: &Params,
        penalties: &Penalties,
        factor: f64,
        rng: &mut R,
    ) {
        let boosted = penalties.scaled(factor);
        self.run(individual, params, &boosted, penalties, rng);
    }

    /// Number of moves applied by the last run.
    pub fn moves_applied(&self) -> usize {
        self.nb_moves
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        individual: &mut Individual,
        params: &Params,
        search_penalties: &Penalties,
        export_penalties: &Penalties,
        rng: &mut R,
    ) {
        self.capacity = params.vehicle_capacity;
        self.duration_limit = params.duration_limit;
        self.penalty_capacity = search_penalties.capacity;
        self.penalty_duration = search_penalties.duration;
        self.load_individual(individual, params);
        #[cfg(test)]
        {
            self.move_costs.clear();
            self.move_costs.push(self.penalized_cost(params));
        }

        // Pass orders are drawn once per run; neighbourhoods are reshuffled now and then
        self.order_nodes.shuffle(rng);
        self.order_routes.shuffle(rng);
        let granular = params.config.granular_search.max(1);
        for neighbors in self.neighbors.iter_mut().skip(1) {
            if rng.gen_range(0..granular) == 0 {
                neighbors.shuffle(rng);
            }
        }

        self.search_completed = false;
        self.loop_id = 0;
        while !self.search_completed {
            // At least two loops, empty routes are only tried from the second
            if self.loop_id > 1 {
                self.search_completed = true;
            }

            for pos_u in 0..self.order_nodes.len() {
                let node_u = self.order_nodes[pos_u];
                self.route_improvement_moves(node_u, params);
            }

            if params.use_swap_star() {
                self.swap_star_pass(params);
            }

            self.loop_id += 1;
        }

        trace!(
            "local search converged after {} loops and {} moves",
            self.loop_id,
            self.nb_moves
        );
        self.export_individual(individual, params, export_penalties);
    }

    /// All RI moves of `node_u` with its granular neighbours, then with the
    /// first empty route.
    fn route_improvement_moves(&mut self, node_u: usize, params: &Params) {
        let last_test_ri = self.nodes[node_u].when_last_tested_ri;
        self.nodes[node_u].when_last_tested_ri = self.nb_moves;

        let cour_u = self.nodes[node_u].cour;
        for k in 0..self.neighbors[cour_u].len() {
            let node_v = self.neighbors[cour_u][k];
            let modified = self.routes[self.nodes[node_u].route]
                .when_last_modified
                .max(self.routes[self.nodes[node_v].route].when_last_modified);
            if self.loop_id > 0 && modified <= last_test_ri {
                continue;
            }

            self.set_route_u(node_u, params);
            self.set_route_v(node_v, params);
            if self.move1(params) || self.move2(params) || self.move3(params) {
                continue;
            }
            if self.c.u <= self.c.v && self.move4(params) {
                continue;
            }
            if self.move5(params) {
                continue;
            }
            if self.c.u <= self.c.v && self.move6(params) {
                continue;
            }
            if self.c.intra_route && self.move7(params) {
                continue;
            }
            if !self.c.intra_route && (self.move8(params) || self.move9(params)) {
                continue;
            }

            // Insertions right after the depot
            let v_prev = self.nodes[node_v].prev;
            if self.nodes[v_prev].is_depot {
                self.set_route_v(v_prev, params);
                if self.move1(params) || self.move2(params) || self.move3(params) {
                    continue;
                }
                if !self.c.intra_route && (self.move8(params) || self.move9(params)) {
                    continue;
                }
            }
        }

        if self.loop_id > 0 {
            if let Some(&empty) = self.empty_routes.iter().next() {
                let depot = self.depot_start(empty);
                self.set_route_u(node_u, params);
                self.set_route_v(depot, params);
                let _ = self.move1(params)
                    || self.move2(params)
                    || self.move3(params)
                    || self.move9(params);
            }
        }
    }

    /// SWAP* over every pair of non-empty routes whose sectors overlap.
    fn swap_star_pass(&mut self, params: &Params) {
        for ru in 0..self.order_routes.len() {
            let route_u = self.order_routes[ru];
            let last_test = self.routes[route_u].when_last_tested_swap_star;
            self.routes[route_u].when_last_tested_swap_star = self.nb_moves;

            for rv in 0..self.order_routes.len() {
                let route_v = self.order_routes[rv];
                let (a, b) = (&self.routes[route_u], &self.routes[route_v]);
                if a.num_customers == 0 || b.num_customers == 0 || a.cour >= b.cour {
                    continue;
                }
                if self.loop_id > 0 && a.when_last_modified.max(b.when_last_modified) <= last_test {
                    continue;
                }
                if crate::circle_sector::CircleSector::overlap(&a.sector, &b.sector) {
                    self.swap_star(route_u, route_v, params);
                }
            }
        }
    }

    /// Load the cursor fields around node `u`.
    pub(crate) fn set_route_u(&mut self, node_u: usize, params: &Params) {
        let node_x = self.nodes[node_u].next;
        let c = &mut self.c;
        c.node_u = node_u;
        c.node_x = node_x;
        c.route_u = self.nodes[node_u].route;
        c.u = self.nodes[node_u].cour;
        c.u_prev = self.nodes[self.nodes[node_u].prev].cour;
        c.x = self.nodes[node_x].cour;
        c.x_next = self.nodes[self.nodes[node_x].next].cour;
        c.load_u = params.clients[c.u].demand;
        c.service_u = params.clients[c.u].service_duration;
        c.load_x = params.clients[c.x].demand;
        c.service_x = params.clients[c.x].service_duration;
    }

    /// Load the cursor fields around node `v`.
    pub(crate) fn set_route_v(&mut self, node_v: usize, params: &Params) {
        let node_y = self.nodes[node_v].next;
        let c = &mut self.c;
        c.node_v = node_v;
        c.node_y = node_y;
        c.route_v = self.nodes[node_v].route;
        c.v = self.nodes[node_v].cour;
        c.v_prev = self.nodes[self.nodes[node_v].prev].cour;
        c.y = self.nodes[node_y].cour;
        c.y_next = self.nodes[self.nodes[node_y].next].cour;
        c.load_v = params.clients[c.v].demand;
        c.service_v = params.clients[c.v].service_duration;
        c.load_y = params.clients[c.y].demand;
        c.service_y = params.clients[c.y].service_duration;
        c.intra_route = c.route_u == c.route_v;
    }

    /// Bookkeeping after an applied move that touched `route_u` and `route_v`.
    pub(crate) fn commit_move(&mut self, route_u: usize, route_v: usize, params: &Params) {
        self.nb_moves += 1;
        self.search_completed = false;
        self.update_route_data(route_u, params);
        if route_v != route_u {
            self.update_route_data(route_v, params);
        }
        #[cfg(test)]
        {
            let cost = self.penalized_cost(params);
            self.move_costs.push(cost);
        }
    }

    /// Penalized cost of the routes currently held in the arena.
    pub(crate) fn penalized_cost(&self, params: &Params) -> f64 {
        let service: f64 = params.clients.iter().skip(1).map(|c| c.service_duration).sum();
        self.routes
            .iter()
            .map(|r| r.duration + r.penalty)
            .sum::<f64>()
            - service
    }
}
