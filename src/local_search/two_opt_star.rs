//! 2-opt* neighborhood for local search.

use crate::params::{Params, EPSILON};
use log::trace;

use super::LocalSearch;

impl LocalSearch {
    /// Inter-route 2-opt* joining `u` to `v` and `x` to `y`: the route of `u`
    /// ends with the reversed start of the route of `v`, and the route of `v`
    /// starts with the reversed end of the route of `u`.
    pub(crate) fn move8(&mut self, params: &Params) -> bool {
        let c = self.c;
        let d = |i: usize, j: usize| params.dist(i, j);
        let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
        let (nu, nx, nv) = (&self.nodes[c.node_u], &self.nodes[c.node_x], &self.nodes[c.node_v]);

        let mut cost = d(c.u, c.v) + d(c.x, c.y) - d(c.u, c.x) - d(c.v, c.y)
            + nv.cumulated_reversal_distance
            + ru.reversal_distance
            - nx.cumulated_reversal_distance
            - ru.penalty
            - rv.penalty;

        // Cannot improve even if both routes become feasible
        if cost >= 0.0 {
            return false;
        }

        cost += self.penalty_excess_duration(
            nu.cumulated_time + nv.cumulated_time + nv.cumulated_reversal_distance + d(c.u, c.v),
        ) + self.penalty_excess_duration(
            ru.duration - nu.cumulated_time - d(c.u, c.x) + ru.reversal_distance
                - nx.cumulated_reversal_distance
                + rv.duration
                - nv.cumulated_time
                - d(c.v, c.y)
                + d(c.x, c.y),
        ) + self.penalty_excess_load(nu.cumulated_load + nv.cumulated_load)
            + self.penalty_excess_load(
                ru.load + rv.load - nu.cumulated_load - nv.cumulated_load,
            );

        if cost > -EPSILON {
            return false;
        }

        trace!("2-opt* {}-{} / {}-{} ({:.3})", c.u, c.v, c.x, c.y, cost);
        let (pos_u, pos_v) = (nu.position, nv.position);
        let clients_u = self.route_clients(c.route_u);
        let clients_v = self.route_clients(c.route_v);
        let (head_u, tail_u) = clients_u.split_at(pos_u);
        let (head_v, tail_v) = clients_v.split_at(pos_v);

        let new_u: Vec<usize> = head_u.iter().chain(head_v.iter().rev()).copied().collect();
        let new_v: Vec<usize> = tail_u.iter().rev().chain(tail_v.iter()).copied().collect();
        self.relink_route(c.route_u, &new_u);
        self.relink_route(c.route_v, &new_v);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }

    /// Inter-route 2-opt* joining `u` to `y` and `v` to `x`: the two routes
    /// exchange their ends.
    pub(crate) fn move9(&mut self, params: &Params) -> bool {
        let c = self.c;
        let d = |i: usize, j: usize| params.dist(i, j);
        let (ru, rv) = (&self.routes[c.route_u], &self.routes[c.route_v]);
        let (nu, nv) = (&self.nodes[c.node_u], &self.nodes[c.node_v]);

        let mut cost = d(c.u, c.y) + d(c.v, c.x) - d(c.u, c.x) - d(c.v, c.y)
            - ru.penalty
            - rv.penalty;

        // Cannot improve even if both routes become feasible
        if cost >= 0.0 {
            return false;
        }

        cost += self.penalty_excess_duration(
            nu.cumulated_time + rv.duration - nv.cumulated_time - d(c.v, c.y) + d(c.u, c.y),
        ) + self.penalty_excess_duration(
            ru.duration - nu.cumulated_time - d(c.u, c.x) + nv.cumulated_time + d(c.v, c.x),
        ) + self.penalty_excess_load(nu.cumulated_load + rv.load - nv.cumulated_load)
            + self.penalty_excess_load(nv.cumulated_load + ru.load - nu.cumulated_load);

        if cost > -EPSILON {
            return false;
        }

        trace!("2-opt* {}-{} / {}-{} ({:.3})", c.u, c.y, c.v, c.x, cost);
        let (pos_u, pos_v) = (nu.position, nv.position);
        let clients_u = self.route_clients(c.route_u);
        let clients_v = self.route_clients(c.route_v);
        let (head_u, tail_u) = clients_u.split_at(pos_u);
        let (head_v, tail_v) = clients_v.split_at(pos_v);

        let new_u: Vec<usize> = head_u.iter().chain(tail_v.iter()).copied().collect();
        let new_v: Vec<usize> = head_v.iter().chain(tail_u.iter()).copied().collect();
        self.relink_route(c.route_u, &new_u);
        self.relink_route(c.route_v, &new_v);
        self.commit_move(c.route_u, c.route_v, params);
        true
    }
}
