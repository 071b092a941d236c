use super::{
    local_search::{LocalSearch, MOVE_EPSILON},
    r#move::{Anchor, MoveContext},
};

impl LocalSearch {
    /// Total delta of an inter-route move once penalties are included.
    ///
    /// `None` when the distance delta alone cannot beat the penalties it could remove.
    pub(super) fn inter_route_delta(
        &self,
        context: &MoveContext,
        cost_u: f64,
        cost_v: f64,
        duration_u: f64,
        duration_v: f64,
        load_u: f64,
        load_v: f64,
    ) -> Option<f64> {
        let route_u = &self.routes[context.route_u];
        let route_v = &self.routes[context.route_v];

        if cost_u + cost_v >= route_u.penalty + route_v.penalty {
            return None;
        }

        let delta_u = cost_u
            + self.penalty_excess_duration(route_u.duration + duration_u)
            + self.penalty_excess_load(route_u.load + load_u)
            - route_u.penalty;
        let delta_v = cost_v
            + self.penalty_excess_duration(route_v.duration + duration_v)
            + self.penalty_excess_load(route_v.load + load_v)
            - route_v.penalty;

        Some(delta_u + delta_v)
    }

    /// **Relocate**
    ///
    /// Moves `U` after `V`.
    ///
    /// ```text
    /// BEFORE: [U prev] -> [U] -> [X]        [V] -> [Y]
    /// AFTER:  [U prev] -> [X]               [V] -> [U] -> [Y]
    /// ```
    pub(super) fn relocate(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            u_prev, u, x, v, y, ..
        } = *context;

        let cost_u = self.distance(u_prev, x) - self.distance(u_prev, u) - self.distance(u, x);
        let cost_v = self.distance(v, u) + self.distance(u, y) - self.distance(v, y);

        let delta = if context.intra_route {
            cost_u + cost_v
        } else {
            match self.inter_route_delta(
                context,
                cost_u,
                cost_v,
                cost_u - self.service(u),
                cost_v + self.service(u),
                -self.demand(u),
                self.demand(u),
            ) {
                Some(delta) => delta,
                None => return false,
            }
        };

        if delta > -MOVE_EPSILON || u == y {
            return false;
        }

        self.insert_node(u, Self::anchor_v(context));
        self.commit_move(context);
        true
    }

    /// **Relocate pair**
    ///
    /// Moves `U` and `X` after `V`, keeping their order.
    ///
    /// ```text
    /// BEFORE: [U prev] -> [U] -> [X] -> [X next]        [V] -> [Y]
    /// AFTER:  [U prev] -> [X next]                      [V] -> [U] -> [X] -> [Y]
    /// ```
    pub(super) fn relocate_pair(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            u_prev,
            u,
            x,
            x_next,
            v,
            y,
            ..
        } = *context;

        if context.x_is_depot {
            return false;
        }

        let cost_u = self.distance(u_prev, x_next) - self.distance(u_prev, u) - self.distance(x, x_next);
        let cost_v = self.distance(v, u) + self.distance(x, y) - self.distance(v, y);

        let delta = if context.intra_route {
            cost_u + cost_v
        } else {
            let pair_duration = self.distance(u, x) + self.service(u) + self.service(x);
            let pair_load = self.demand(u) + self.demand(x);
            match self.inter_route_delta(
                context,
                cost_u,
                cost_v,
                cost_u - pair_duration,
                cost_v + pair_duration,
                -pair_load,
                pair_load,
            ) {
                Some(delta) => delta,
                None => return false,
            }
        };

        if delta > -MOVE_EPSILON || u == y || v == x {
            return false;
        }

        self.insert_node(u, Self::anchor_v(context));
        self.insert_node(x, Anchor::Client(u));
        self.commit_move(context);
        true
    }

    /// **Relocate reversed pair**
    ///
    /// Moves `U` and `X` after `V`, inverting their order.
    ///
    /// ```text
    /// BEFORE: [U prev] -> [U] -> [X] -> [X next]        [V] -> [Y]
    /// AFTER:  [U prev] -> [X next]                      [V] -> [X] -> [U] -> [Y]
    /// ```
    pub(super) fn relocate_reversed_pair(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            u_prev,
            u,
            x,
            x_next,
            v,
            y,
            ..
        } = *context;

        if context.x_is_depot {
            return false;
        }

        let cost_u = self.distance(u_prev, x_next)
            - self.distance(u_prev, u)
            - self.distance(u, x)
            - self.distance(x, x_next);
        let cost_v =
            self.distance(v, x) + self.distance(x, u) + self.distance(u, y) - self.distance(v, y);

        let delta = if context.intra_route {
            cost_u + cost_v
        } else {
            let pair_service = self.service(u) + self.service(x);
            let pair_load = self.demand(u) + self.demand(x);
            match self.inter_route_delta(
                context,
                cost_u,
                cost_v,
                cost_u - pair_service,
                cost_v + pair_service,
                -pair_load,
                pair_load,
            ) {
                Some(delta) => delta,
                None => return false,
            }
        };

        if delta > -MOVE_EPSILON || u == y || x == v {
            return false;
        }

        self.insert_node(x, Self::anchor_v(context));
        self.insert_node(u, Anchor::Client(x));
        self.commit_move(context);
        true
    }
}
