use super::{
    local_search::{LocalSearch, MOVE_EPSILON},
    r#move::MoveContext,
};

impl LocalSearch {
    /// **Inter-Route 2-Opt\* with reversal**
    ///
    /// Connects `U` to `V` and `X` to `Y`, so both heads and both tails end up
    /// in the same route, one of them travelled backward.
    ///
    /// ```text
    /// BEFORE:
    ///    Route U: (depot) -> ... -> [U] --x--> [X] -> ... -> (depot)
    ///    Route V: (depot) -> ... -> [V] --x--> [Y] -> ... -> (depot)
    ///
    /// AFTER:
    ///    Route U: (depot) -> ... -> [U] -> [V] -> ... (reversed head of V) -> (depot)
    ///    Route V: (depot) -> ... (reversed tail of U) -> [X] -> [Y] -> ... -> (depot)
    /// ```
    pub(super) fn two_opt_star_reversed(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            pos_u,
            pos_v,
            u,
            x,
            v,
            y,
            ..
        } = *context;

        let route_u = &self.routes[context.route_u];
        let route_v = &self.routes[context.route_v];

        let mut delta = self.distance(u, v) + self.distance(x, y)
            - self.distance(u, x)
            - self.distance(v, y)
            + route_v.cumulated_reversal_distance[pos_v]
            + route_u.reversal_distance
            - route_u.cumulated_reversal_distance[pos_u + 1]
            - route_u.penalty
            - route_v.penalty;

        if delta >= 0.0 {
            return false;
        }

        delta += self.penalty_excess_duration(
            route_u.cumulated_time[pos_u]
                + route_v.cumulated_time[pos_v]
                + route_v.cumulated_reversal_distance[pos_v]
                + self.distance(u, v),
        ) + self.penalty_excess_duration(
            route_u.duration - route_u.cumulated_time[pos_u] - self.distance(u, x)
                + route_u.reversal_distance
                - route_u.cumulated_reversal_distance[pos_u + 1]
                + route_v.duration
                - route_v.cumulated_time[pos_v]
                - self.distance(v, y)
                + self.distance(x, y),
        ) + self.penalty_excess_load(route_u.cumulated_load[pos_u] + route_v.cumulated_load[pos_v])
            + self.penalty_excess_load(
                route_u.load + route_v.load
                    - route_u.cumulated_load[pos_u]
                    - route_v.cumulated_load[pos_v],
            );

        if delta > -MOVE_EPSILON {
            return false;
        }

        let head_u = route_u.clients[..pos_u].iter();
        let head_v = route_v.clients[..pos_v].iter().rev();
        let tail_u = route_u.clients[pos_u..].iter().rev();
        let tail_v = route_v.clients[pos_v..].iter();

        let new_u: Vec<usize> = head_u.chain(head_v).copied().collect();
        let new_v: Vec<usize> = tail_u.chain(tail_v).copied().collect();

        self.replace_routes(context, new_u, new_v);
        true
    }

    /// **Inter-Route 2-Opt\***
    ///
    /// Exchanges the tails of both routes.
    ///
    /// ```text
    /// BEFORE:
    ///    Route U: (depot) -> ... -> [U] --x--> [X] -> ... -> (depot)
    ///    Route V: (depot) -> ... -> [V] --x--> [Y] -> ... -> (depot)
    ///
    /// AFTER:
    ///    Route U: (depot) -> ... -> [U] -> [Y] -> ... -> (depot)
    ///    Route V: (depot) -> ... -> [V] -> [X] -> ... -> (depot)
    /// ```
    pub(super) fn two_opt_star(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            pos_u,
            pos_v,
            u,
            x,
            v,
            y,
            ..
        } = *context;

        let route_u = &self.routes[context.route_u];
        let route_v = &self.routes[context.route_v];

        let mut delta = self.distance(u, y) + self.distance(v, x)
            - self.distance(u, x)
            - self.distance(v, y)
            - route_u.penalty
            - route_v.penalty;

        if delta >= 0.0 {
            return false;
        }

        delta += self.penalty_excess_duration(
            route_u.cumulated_time[pos_u] + route_v.duration
                - route_v.cumulated_time[pos_v]
                - self.distance(v, y)
                + self.distance(u, y),
        ) + self.penalty_excess_duration(
            route_u.duration - route_u.cumulated_time[pos_u] - self.distance(u, x)
                + route_v.cumulated_time[pos_v]
                + self.distance(v, x),
        ) + self.penalty_excess_load(
            route_u.cumulated_load[pos_u] + route_v.load - route_v.cumulated_load[pos_v],
        ) + self.penalty_excess_load(
            route_v.cumulated_load[pos_v] + route_u.load - route_u.cumulated_load[pos_u],
        );

        if delta > -MOVE_EPSILON {
            return false;
        }

        let new_u: Vec<usize> = route_u.clients[..pos_u]
            .iter()
            .chain(&route_v.clients[pos_v..])
            .copied()
            .collect();
        let new_v: Vec<usize> = route_v.clients[..pos_v]
            .iter()
            .chain(&route_u.clients[pos_u..])
            .copied()
            .collect();

        self.replace_routes(context, new_u, new_v);
        true
    }

    fn replace_routes(&mut self, context: &MoveContext, clients_u: Vec<usize>, clients_v: Vec<usize>) {
        self.routes[context.route_u].clients = clients_u;
        self.routes[context.route_v].clients = clients_v;
        self.reindex_route(context.route_u);
        self.reindex_route(context.route_v);
        self.commit_move(context);
    }
}
