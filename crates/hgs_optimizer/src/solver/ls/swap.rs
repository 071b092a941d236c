use super::{
    local_search::{LocalSearch, MOVE_EPSILON},
    r#move::{Anchor, MoveContext},
};

impl LocalSearch {
    /// **Swap**
    ///
    /// Exchanges `U` and `V`.
    ///
    /// ```text
    /// BEFORE: [U prev] -> [U] -> [X]        [V prev] -> [V] -> [Y]
    /// AFTER:  [U prev] -> [V] -> [X]        [V prev] -> [U] -> [Y]
    /// ```
    pub(super) fn swap(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            u_prev,
            u,
            x,
            v_prev,
            v,
            y,
            ..
        } = *context;

        let cost_u = self.distance(u_prev, v) + self.distance(v, x)
            - self.distance(u_prev, u)
            - self.distance(u, x);
        let cost_v = self.distance(v_prev, u) + self.distance(u, y)
            - self.distance(v_prev, v)
            - self.distance(v, y);

        let delta = if context.intra_route {
            cost_u + cost_v
        } else {
            let service_shift = self.service(v) - self.service(u);
            let load_shift = self.demand(v) - self.demand(u);
            match self.inter_route_delta(
                context,
                cost_u,
                cost_v,
                cost_u + service_shift,
                cost_v - service_shift,
                load_shift,
                -load_shift,
            ) {
                Some(delta) => delta,
                None => return false,
            }
        };

        if delta > -MOVE_EPSILON || u == v_prev || u == y {
            return false;
        }

        self.swap_nodes(u, v);
        self.commit_move(context);
        true
    }

    /// **Swap pair with client**
    ///
    /// Exchanges the pair `(U, X)` with `V`.
    ///
    /// ```text
    /// BEFORE: [U prev] -> [U] -> [X] -> [X next]        [V prev] -> [V] -> [Y]
    /// AFTER:  [U prev] -> [V] -> [X next]               [V prev] -> [U] -> [X] -> [Y]
    /// ```
    pub(super) fn swap_pair_with_client(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            u_prev,
            u,
            x,
            x_next,
            v_prev,
            v,
            y,
            ..
        } = *context;

        if context.x_is_depot {
            return false;
        }

        let cost_u = self.distance(u_prev, v) + self.distance(v, x_next)
            - self.distance(u_prev, u)
            - self.distance(x, x_next);
        let cost_v = self.distance(v_prev, u) + self.distance(x, y)
            - self.distance(v_prev, v)
            - self.distance(v, y);

        let delta = if context.intra_route {
            cost_u + cost_v
        } else {
            let duration_shift =
                self.distance(u, x) + self.service(u) + self.service(x) - self.service(v);
            let load_shift = self.demand(u) + self.demand(x) - self.demand(v);
            match self.inter_route_delta(
                context,
                cost_u,
                cost_v,
                cost_u - duration_shift,
                cost_v + duration_shift,
                -load_shift,
                load_shift,
            ) {
                Some(delta) => delta,
                None => return false,
            }
        };

        if delta > -MOVE_EPSILON || u == v_prev || x == v_prev || u == y {
            return false;
        }

        self.swap_nodes(u, v);
        self.insert_node(x, Anchor::Client(u));
        self.commit_move(context);
        true
    }

    /// **Swap pairs**
    ///
    /// Exchanges the pair `(U, X)` with the pair `(V, Y)`.
    ///
    /// ```text
    /// BEFORE: [U prev] -> [U] -> [X] -> [X next]        [V prev] -> [V] -> [Y] -> [Y next]
    /// AFTER:  [U prev] -> [V] -> [Y] -> [X next]        [V prev] -> [U] -> [X] -> [Y next]
    /// ```
    pub(super) fn swap_pairs(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            u_prev,
            u,
            x,
            x_next,
            v_prev,
            v,
            y,
            y_next,
            ..
        } = *context;

        if context.x_is_depot || context.y_is_depot {
            return false;
        }

        let cost_u = self.distance(u_prev, v) + self.distance(y, x_next)
            - self.distance(u_prev, u)
            - self.distance(x, x_next);
        let cost_v = self.distance(v_prev, u) + self.distance(x, y_next)
            - self.distance(v_prev, v)
            - self.distance(y, y_next);

        let delta = if context.intra_route {
            cost_u + cost_v
        } else {
            let duration_shift = self.distance(u, x) - self.distance(v, y)
                + self.service(u)
                + self.service(x)
                - self.service(v)
                - self.service(y);
            let load_shift =
                self.demand(u) + self.demand(x) - self.demand(v) - self.demand(y);
            match self.inter_route_delta(
                context,
                cost_u,
                cost_v,
                cost_u - duration_shift,
                cost_v + duration_shift,
                -load_shift,
                load_shift,
            ) {
                Some(delta) => delta,
                None => return false,
            }
        };

        if delta > -MOVE_EPSILON || y == u_prev || u == y || x == v || v == x_next {
            return false;
        }

        self.swap_nodes(u, v);
        self.swap_nodes(x, y);
        self.commit_move(context);
        true
    }
}
