//! Relocate neighborhood for local search.

use crate::params::{Params, EPSILON};
use log::trace;

use super::LocalSearch;

impl LocalSearch {
    /// Relocate `u` after `v`.
    pub(crate) fn move1(&mut self, params: &Params) -> bool {
        let c = self.c;
        if c.u == c.y {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let mut cost_u = d(c.u_prev, c.x) - d(c.u_prev, c.u) - d(c.u, c.x);
        let mut cost_v = d(c.v, c.u) + d(c.u, c.y) - d(c.v, c.y);

        if !c.intra_route {
            let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
            if cost_u + cost_v >= ru.penalty + rv.penalty {
                return false;
            }
            cost_u += self.penalty_excess_duration(ru.duration + cost_u - c.service_u)
                + self.penalty_excess_load(ru.load - c.load_u)
                - ru.penalty;
            cost_v += self.penalty_excess_duration(rv.duration + cost_v + c.service_u)
                + self.penalty_excess_load(rv.load + c.load_u)
                - rv.penalty;
        }

        if cost_u + cost_v > -EPSILON {
            return false;
        }

        trace!("relocate {} after {} ({:.3})", c.u, c.v, cost_u + cost_v);
        self.insert_node(c.node_u, c.node_v);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }

    /// Relocate the pair `(u, x)` after `v`.
    pub(crate) fn move2(&mut self, params: &Params) -> bool {
        let c = self.c;
        if c.u == c.y || c.v == c.x || self.nodes[c.node_x].is_depot {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let mut cost_u = d(c.u_prev, c.x_next) - d(c.u_prev, c.u) - d(c.x, c.x_next);
        let mut cost_v = d(c.v, c.u) + d(c.x, c.y) - d(c.v, c.y);

        if !c.intra_route {
            let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
            if cost_u + cost_v >= ru.penalty + rv.penalty {
                return false;
            }
            cost_u += self.penalty_excess_duration(
                ru.duration + cost_u - d(c.u, c.x) - c.service_u - c.service_x,
            ) + self.penalty_excess_load(ru.load - c.load_u - c.load_x)
                - ru.penalty;
            cost_v += self.penalty_excess_duration(
                rv.duration + cost_v + d(c.u, c.x) + c.service_u + c.service_x,
            ) + self.penalty_excess_load(rv.load + c.load_u + c.load_x)
                - rv.penalty;
        }

        if cost_u + cost_v > -EPSILON {
            return false;
        }

        trace!("relocate ({}, {}) after {} ({:.3})", c.u, c.x, c.v, cost_u + cost_v);
        self.insert_node(c.node_u, c.node_v);
        self.insert_node(c.node_x, c.node_u);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }

    /// Relocate the pair `(u, x)` after `v` as `(x, u)`.
    pub(crate) fn move3(&mut self, params: &Params) -> bool {
        let c = self.c;
        if c.u == c.y || c.x == c.v || self.nodes[c.node_x].is_depot {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let mut cost_u =
            d(c.u_prev, c.x_next) - d(c.u_prev, c.u) - d(c.u, c.x) - d(c.x, c.x_next);
        let mut cost_v = d(c.v, c.x) + d(c.x, c.u) + d(c.u, c.y) - d(c.v, c.y);

        if !c.intra_route {
            let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
            if cost_u + cost_v >= ru.penalty + rv.penalty {
                return false;
            }
            cost_u += self.penalty_excess_duration(ru.duration + cost_u - c.service_u - c.service_x)
                + self.penalty_excess_load(ru.load - c.load_u - c.load_x)
                - ru.penalty;
            cost_v += self.penalty_excess_duration(rv.duration + cost_v + c.service_u + c.service_x)
                + self.penalty_excess_load(rv.load + c.load_u + c.load_x)
                - rv.penalty;
        }

        if cost_u + cost_v > -EPSILON {
            return false;
        }

        trace!("relocate ({}, {}) reversed after {} ({:.3})", c.u, c.x, c.v, cost_u + cost_v);
        self.insert_node(c.node_x, c.node_v);
        self.insert_node(c.node_u, c.node_x);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }
}
