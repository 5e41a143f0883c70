//! 2-opt neighborhood for local search.

use crate::params::{Params, EPSILON};
use log::trace;

use super::LocalSearch;

impl LocalSearch {
    /// Intra-route 2-opt: replace `(u, x)` and `(v, y)` by `(u, v)` and
    /// `(x, y)`, reversing the segment from `x` to `v`.
    pub(crate) fn move7(&mut self, params: &Params) -> bool {
        let c = self.c;
        let (pos_u, pos_v) = (self.nodes[c.node_u].position, self.nodes[c.node_v].position);
        if pos_u > pos_v || c.node_x == c.node_v {
            return false;
        }
        let d = |i: usize, j: usize| params.dist(i, j);

        let cost = d(c.u, c.v) + d(c.x, c.y) - d(c.u, c.x) - d(c.v, c.y)
            + self.nodes[c.node_v].cumulated_reversal_distance
            - self.nodes[c.node_x].cumulated_reversal_distance;

        if cost > -EPSILON {
            return false;
        }

        trace!("2-opt between {} and {} ({:.3})", c.u, c.v, cost);
        let mut clients = self.route_clients(c.route_u);
        // Client positions start at 1, right after the depot
        clients[pos_u..pos_v].reverse();
        self.relink_route(c.route_u, &clients);
        self.commit_move(c.route_u, c.route_u, params);
        true
    }
}
