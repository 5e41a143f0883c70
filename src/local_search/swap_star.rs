//! SWAP* neighborhood for local search.
//!
//! Exchanges two clients of different routes, each client being inserted at
//! its best position in the other route rather than in place of the other
//! client. Only the three cheapest insertion positions of every client are
//! kept per route, which makes the evaluation of all pairs quadratic in the
//! route sizes instead of cubic.

use crate::params::{Params, EPSILON};
use log::trace;

use super::LocalSearch;

/// Best SWAP* or relocation found for a route pair.
#[derive(Debug, Clone, Copy)]
struct SwapStarElement {
    move_cost: f64,
    u: Option<usize>,
    best_position_u: Option<usize>,
    v: Option<usize>,
    best_position_v: Option<usize>,
}

impl Default for SwapStarElement {
    fn default() -> Self {
        SwapStarElement {
            move_cost: f64::INFINITY,
            u: None,
            best_position_u: None,
            v: None,
            best_position_v: None,
        }
    }
}

impl LocalSearch {
    /// Apply the best SWAP* or relocation between two routes, if it improves.
    pub(crate) fn swap_star(&mut self, route_u: usize, route_v: usize, params: &Params) -> bool {
        let d = |i: usize, j: usize| params.dist(i, j);
        self.preprocess_insertions(route_u, route_v, params);
        self.preprocess_insertions(route_v, route_u, params);

        let nodes_u = self.route_clients(route_u);
        let nodes_v = self.route_clients(route_v);
        let (ru, rv) = (&self.routes[route_u], &self.routes[route_v]);
        let mut best = SwapStarElement::default();

        for &u in &nodes_u {
            for &v in &nodes_v {
                let (cu, cv) = (&params.clients[u], &params.clients[v]);
                let delta_pen_u = self.penalty_excess_load(ru.load + cv.demand - cu.demand) - ru.penalty;
                let delta_pen_v = self.penalty_excess_load(rv.load + cu.demand - cv.demand) - rv.penalty;
                let removal_u = self.nodes[u].delta_removal;
                let removal_v = self.nodes[v].delta_removal;

                // Lower bound on the move cost, insertions cost at least nothing
                if delta_pen_u + removal_u + delta_pen_v + removal_v > 0.0 {
                    continue;
                }

                let (extra_v, position_u) = self.cheapest_insert_simult_removal(u, v, params);
                let (extra_u, position_v) = self.cheapest_insert_simult_removal(v, u, params);
                let move_cost = delta_pen_u + removal_u + extra_u + delta_pen_v + removal_v + extra_v
                    + self.penalty_excess_duration(
                        ru.duration + removal_u + extra_u + cv.service_duration - cu.service_duration,
                    )
                    + self.penalty_excess_duration(
                        rv.duration + removal_v + extra_v - cv.service_duration + cu.service_duration,
                    );

                if move_cost < best.move_cost {
                    best = SwapStarElement {
                        move_cost,
                        u: Some(u),
                        best_position_u: Some(position_u),
                        v: Some(v),
                        best_position_v: Some(position_v),
                    };
                }
            }
        }

        // Plain relocations come for free with the insertion data
        for (from, to, movers) in [(route_u, route_v, &nodes_u), (route_v, route_u, &nodes_v)] {
            let (rf, rt) = (&self.routes[from], &self.routes[to]);
            for &u in movers.iter() {
                let cu = &params.clients[u];
                let insert = &self.best_insert_client[to][u];
                let (prev, next) = (self.nodes[self.nodes[u].prev].cour, self.nodes[self.nodes[u].next].cour);
                let delta_from = d(prev, next) - d(prev, u) - d(u, next);
                let delta_to = insert.best_cost[0];
                let move_cost = delta_from
                    + delta_to
                    + self.penalty_excess_load(rf.load - cu.demand)
                    - rf.penalty
                    + self.penalty_excess_load(rt.load + cu.demand)
                    - rt.penalty
                    + self.penalty_excess_duration(rf.duration + delta_from - cu.service_duration)
                    + self.penalty_excess_duration(rt.duration + delta_to + cu.service_duration);

                if move_cost < best.move_cost {
                    best = SwapStarElement {
                        move_cost,
                        u: Some(u),
                        best_position_u: insert.best_location[0],
                        v: None,
                        best_position_v: None,
                    };
                }
            }
        }

        if best.move_cost > -EPSILON {
            return false;
        }

        trace!(
            "swap* {:?} -> {:?}, {:?} -> {:?} ({:.3})",
            best.u,
            best.best_position_u,
            best.v,
            best.best_position_v,
            best.move_cost
        );
        if let (Some(u), Some(position)) = (best.u, best.best_position_u) {
            self.insert_node(u, position);
        }
        if let (Some(v), Some(position)) = (best.v, best.best_position_v) {
            self.insert_node(v, position);
        }
        self.commit_move(route_u, route_v, params);
        true
    }

    /// Refresh the removal gains of the clients of `r1` and their three best
    /// insertion positions in `r2`.
    fn preprocess_insertions(&mut self, r1: usize, r2: usize, params: &Params) {
        let d = |i: usize, j: usize| params.dist(i, j);
        let depot = self.routes[r2].depot;
        let modified = self.routes[r2].when_last_modified;

        // Insertion slots of r2: after the depot, then after every client
        let mut slots = vec![(depot, 0, self.nodes[self.nodes[depot].next].cour)];
        slots.extend(
            self.route_clients(r2)
                .into_iter()
                .map(|v| (v, v, self.nodes[self.nodes[v].next].cour)),
        );

        for u in self.route_clients(r1) {
            let (prev, next) = (self.nodes[self.nodes[u].prev].cour, self.nodes[self.nodes[u].next].cour);
            self.nodes[u].delta_removal = d(prev, next) - d(prev, u) - d(u, next);

            let nb_moves = self.nb_moves;
            let option = &mut self.best_insert_client[r2][u];
            if option.when_last_calculated.map_or(false, |t| modified <= t) {
                continue;
            }
            option.reset();
            option.when_last_calculated = Some(nb_moves);
            for &(location, from, to) in &slots {
                option.compare_and_add(d(from, u) + d(u, to) - d(from, to), location);
            }
        }
    }

    /// Cheapest insertion of `u` in the route of `v` once `v` is removed.
    ///
    /// Returns the insertion cost and the node after which `u` goes.
    fn cheapest_insert_simult_removal(&self, u: usize, v: usize, params: &Params) -> (f64, usize) {
        let d = |i: usize, j: usize| params.dist(i, j);
        let option = &self.best_insert_client[self.nodes[v].route][u];
        let allowed = |location: usize| location != v && self.nodes[location].next != v;

        let mut best: Option<(f64, usize)> = None;
        for k in 0..3 {
            let Some(location) = option.best_location[k] else {
                break;
            };
            // The third position cannot be next to v if the first two are
            if k == 2 || allowed(location) {
                best = Some((option.best_cost[k], location));
                break;
            }
        }

        // Insertion in place of v
        let v_prev = self.nodes[v].prev;
        let (prev, next) = (self.nodes[v_prev].cour, self.nodes[self.nodes[v].next].cour);
        let delta = d(prev, u) + d(u, next) - d(prev, next);

        match best {
            Some((cost, location)) if cost <= delta => (cost, location),
            _ => (delta, v_prev),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circle_sector::CircleSector;
    use crate::config::Config;
    use crate::individual::Individual;
    use crate::params::Penalties;
    use crate::problem::{Client, Problem};
    use std::collections::BTreeSet;

    const PENALTIES: Penalties = Penalties {
        capacity: 1000.0,
        duration: 1.0,
    };

    fn two_route_search(problem: Problem, routes: Vec<Vec<usize>>) -> (Params, LocalSearch) {
        let params = Params::new(&problem.with_num_vehicles(2), &Config::default()).unwrap();
        let mut ls = LocalSearch::new(&params);
        ls.penalty_capacity = PENALTIES.capacity;
        ls.penalty_duration = PENALTIES.duration;
        let individual = Individual::from_routes(&params, routes, &PENALTIES);
        ls.load_individual(&individual, &params);
        (params, ls)
    }

    fn partition(ls: &LocalSearch) -> BTreeSet<BTreeSet<usize>> {
        (0..ls.routes.len())
            .map(|r| ls.route_clients(r).into_iter().collect())
            .collect()
    }

    fn expected_partition(routes: &[&[usize]]) -> BTreeSet<BTreeSet<usize>> {
        routes.iter().map(|r| r.iter().copied().collect()).collect()
    }

    fn arena_distance(ls: &LocalSearch, params: &Params) -> f64 {
        (0..ls.routes.len())
            .map(|r| {
                let clients = ls.route_clients(r);
                let mut total = 0.0;
                let mut previous = 0;
                for &c in &clients {
                    total += params.dist(previous, c);
                    previous = c;
                }
                total + params.dist(previous, 0)
            })
            .sum()
    }

    /// Two routes fanning out above and below the x axis, each serving one
    /// client of the upper pair and one of the lower pair.
    fn crossed_problem() -> Problem {
        let clients = vec![
            Client::at(0.0, 0.0, 0.0),
            Client::at(10.0, 1.0, 1.0),
            Client::at(10.0, -1.0, 1.0),
            Client::at(10.0, 9.0, 1.0),
            Client::at(10.0, -9.0, 1.0),
        ];
        Problem::euclidean("crossed", clients, 2.0)
    }

    #[test]
    fn test_swap_star_exchanges_clients_between_overlapping_routes() {
        let (params, mut ls) = two_route_search(crossed_problem(), vec![vec![1, 4], vec![2, 3]]);
        let before = ls.penalized_cost(&params);
        assert!(CircleSector::overlap(&ls.routes[0].sector, &ls.routes[1].sector));

        assert!(ls.swap_star(0, 1, &params));
        assert_eq!(partition(&ls), expected_partition(&[&[1, 3], &[2, 4]]));

        // Loads stay at capacity, so the cost is the plain travelled distance
        let after = ls.penalized_cost(&params);
        assert!((after - arena_distance(&ls, &params)).abs() < 1e-9);
        let d = |i, j| params.dist(i, j);
        let expected_delta = (d(0, 1) + d(1, 3) + d(3, 0)) + (d(0, 2) + d(2, 4) + d(4, 0))
            - (d(0, 1) + d(1, 4) + d(4, 0))
            - (d(0, 2) + d(2, 3) + d(3, 0));
        assert!(expected_delta < -1.0);
        assert!((after - before - expected_delta).abs() < 1e-6, "{} -> {}", before, after);
        assert_eq!(ls.nb_moves, 1);
    }

    #[test]
    fn test_swap_star_pass_applies_exchange_on_overlapping_routes() {
        let (params, mut ls) = two_route_search(crossed_problem(), vec![vec![1, 4], vec![2, 3]]);
        let before = ls.penalized_cost(&params);

        ls.swap_star_pass(&params);
        assert!(ls.nb_moves > 0);
        assert_eq!(partition(&ls), expected_partition(&[&[1, 3], &[2, 4]]));
        assert!(ls.penalized_cost(&params) < before - 1.0);
    }

    #[test]
    fn test_swap_star_pass_skips_disjoint_sectors() {
        // Clients 1, 2 lie east of the depot and 3, 4 west, but the matrix
        // makes the east-west pairs the cheap ones
        let clients = vec![
            Client::at(0.0, 0.0, 0.0),
            Client::at(10.0, 1.0, 1.0),
            Client::at(10.0, -1.0, 1.0),
            Client::at(-10.0, 1.0, 1.0),
            Client::at(-10.0, -1.0, 1.0),
        ];
        let mut matrix = vec![vec![10.0; 5]; 5];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for (i, j) in [(1, 3), (3, 1), (2, 4), (4, 2)] {
            matrix[i][j] = 1.0;
        }
        let problem = Problem::new("split-sectors", clients, matrix, 2.0);
        let (params, mut ls) = two_route_search(problem, vec![vec![1, 2], vec![3, 4]]);
        let initial = partition(&ls);
        assert!(!CircleSector::overlap(&ls.routes[0].sector, &ls.routes[1].sector));

        ls.swap_star_pass(&params);
        assert_eq!(ls.nb_moves, 0);
        assert_eq!(partition(&ls), initial);
        assert_eq!(ls.route_clients(0), vec![1, 2]);
        assert_eq!(ls.route_clients(1), vec![3, 4]);

        // The exchange itself would pay off
        assert!(ls.swap_star(0, 1, &params));
        assert_eq!(partition(&ls), expected_partition(&[&[1, 3], &[2, 4]]));
        assert!((ls.penalized_cost(&params) - 42.0).abs() < 1e-9);
    }

    /// Depot far below a row of three clients, with client 1 hovering just
    /// above the middle one.
    fn row_problem() -> Problem {
        let clients = vec![
            Client::at(20.0, -30.0, 0.0),
            Client::at(20.0, 1.0, 1.0),
            Client::at(10.0, 0.0, 1.0),
            Client::at(20.0, 0.0, 1.0),
            Client::at(30.0, 0.0, 1.0),
        ];
        Problem::euclidean("row", clients, 10.0)
    }

    #[test]
    fn test_simultaneous_removal_falls_back_to_the_place_of_v() {
        let (params, mut ls) = two_route_search(row_problem(), vec![vec![1], vec![2, 3, 4]]);
        ls.preprocess_insertions(0, 1, &params);

        // Both cheapest slots touch client 3, the third one is far off
        let option = &ls.best_insert_client[1][1];
        assert_eq!(option.best_location[0], Some(2));
        assert_eq!(option.best_location[1], Some(3));
        assert!(option.best_cost[2] > 5.0);

        let (cost, location) = ls.cheapest_insert_simult_removal(1, 3, &params);
        let d = |i, j| params.dist(i, j);
        assert!((cost - (d(2, 1) + d(1, 4) - d(2, 4))).abs() < 1e-9);
        assert_eq!(location, 2);
        assert_eq!(location, ls.nodes[3].prev);
    }

    #[test]
    fn test_simultaneous_removal_of_a_lone_client_reuses_the_depot() {
        let (params, mut ls) = two_route_search(row_problem(), vec![vec![1, 2, 4], vec![3]]);
        ls.preprocess_insertions(0, 1, &params);

        let (cost, location) = ls.cheapest_insert_simult_removal(1, 3, &params);
        assert!((cost - 2.0 * params.dist(0, 1)).abs() < 1e-9);
        assert_eq!(location, ls.depot_start(1));
    }
}
