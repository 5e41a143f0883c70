//! Swap neighborhood for local search.

use crate::params::{Params, EPSILON};
use log::trace;

use super::LocalSearch;

impl LocalSearch {
    /// Swap `u` and `v`.
    pub(crate) fn move4(&mut self, params: &Params) -> bool {
        let c = self.c;
        if c.u == c.v_prev || c.u == c.y {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let mut cost_u = d(c.u_prev, c.v) + d(c.v, c.x) - d(c.u_prev, c.u) - d(c.u, c.x);
        let mut cost_v = d(c.v_prev, c.u) + d(c.u, c.y) - d(c.v_prev, c.v) - d(c.v, c.y);

        if !c.intra_route {
            let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
            if cost_u + cost_v >= ru.penalty + rv.penalty {
                return false;
            }
            cost_u += self.penalty_excess_duration(ru.duration + cost_u + c.service_v - c.service_u)
                + self.penalty_excess_load(ru.load + c.load_v - c.load_u)
                - ru.penalty;
            cost_v += self.penalty_excess_duration(rv.duration + cost_v - c.service_v + c.service_u)
                + self.penalty_excess_load(rv.load + c.load_u - c.load_v)
                - rv.penalty;
        }

        if cost_u + cost_v > -EPSILON {
            return false;
        }

        trace!("swap {} and {} ({:.3})", c.u, c.v, cost_u + cost_v);
        self.swap_node(c.node_u, c.node_v);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }

    /// Swap the pair `(u, x)` with `v`.
    pub(crate) fn move5(&mut self, params: &Params) -> bool {
        let c = self.c;
        if c.u == c.v_prev || c.x == c.v_prev || c.u == c.y || self.nodes[c.node_x].is_depot {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let mut cost_u = d(c.u_prev, c.v) + d(c.v, c.x_next) - d(c.u_prev, c.u) - d(c.x, c.x_next);
        let mut cost_v = d(c.v_prev, c.u) + d(c.x, c.y) - d(c.v_prev, c.v) - d(c.v, c.y);

        if !c.intra_route {
            let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
            if cost_u + cost_v >= ru.penalty + rv.penalty {
                return false;
            }
            cost_u += self.penalty_excess_duration(
                ru.duration + cost_u - d(c.u, c.x) + c.service_v - c.service_u - c.service_x,
            ) + self.penalty_excess_load(ru.load + c.load_v - c.load_u - c.load_x)
                - ru.penalty;
            cost_v += self.penalty_excess_duration(
                rv.duration + cost_v + d(c.u, c.x) - c.service_v + c.service_u + c.service_x,
            ) + self.penalty_excess_load(rv.load + c.load_u + c.load_x - c.load_v)
                - rv.penalty;
        }

        if cost_u + cost_v > -EPSILON {
            return false;
        }

        trace!("swap ({}, {}) and {} ({:.3})", c.u, c.x, c.v, cost_u + cost_v);
        self.swap_node(c.node_u, c.node_v);
        self.insert_node(c.node_x, c.node_u);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }

    /// Swap the pair `(u, x)` with the pair `(v, y)`.
    pub(crate) fn move6(&mut self, params: &Params) -> bool {
        let c = self.c;
        if self.nodes[c.node_x].is_depot
            || self.nodes[c.node_y].is_depot
            || c.y == c.u_prev
            || c.u == c.y
            || c.x == c.v
            || c.v == c.x_next
        {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let mut cost_u = d(c.u_prev, c.v) + d(c.y, c.x_next) - d(c.u_prev, c.u) - d(c.x, c.x_next);
        let mut cost_v = d(c.v_prev, c.u) + d(c.x, c.y_next) - d(c.v_prev, c.v) - d(c.y, c.y_next);

        if !c.intra_route {
            let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
            if cost_u + cost_v >= ru.penalty + rv.penalty {
                return false;
            }
            cost_u += self.penalty_excess_duration(
                ru.duration + cost_u - d(c.u, c.x) + d(c.v, c.y) + c.service_v + c.service_y
                    - c.service_u
                    - c.service_x,
            ) + self.penalty_excess_load(ru.load + c.load_v + c.load_y - c.load_u - c.load_x)
                - ru.penalty;
            cost_v += self.penalty_excess_duration(
                rv.duration + cost_v + d(c.u, c.x) - d(c.v, c.y) - c.service_v - c.service_y
                    + c.service_u
                    + c.service_x,
            ) + self.penalty_excess_load(rv.load + c.load_u + c.load_x - c.load_v - c.load_y)
                - rv.penalty;
        }

        if cost_u + cost_v > -EPSILON {
            return false;
        }

        trace!("swap ({}, {}) and ({}, {}) ({:.3})", c.u, c.x, c.v, c.y, cost_u + cost_v);
        self.swap_node(c.node_u, c.node_v);
        self.swap_node(c.node_x, c.node_y);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }
}
