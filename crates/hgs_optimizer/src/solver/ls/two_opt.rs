use super::{
    local_search::{LocalSearch, MOVE_EPSILON},
    r#move::MoveContext,
};

impl LocalSearch {
    /// **Intra-Route 2-Opt**
    ///
    /// Reverses the sequence between `X` and `V` (inclusive), `U` preceding `V`.
    ///
    /// ```text
    /// BEFORE:
    ///    ... [U] --x--> [X] -> ... -> [V] --x--> [Y] ...
    ///
    /// AFTER (Sequence Reversed):
    ///    ... [U] -----> [V] -> ... -> [X] -----> [Y] ...
    /// ```
    pub(super) fn two_opt(&mut self, context: &MoveContext) -> bool {
        let MoveContext {
            pos_u,
            pos_v,
            u,
            x,
            v,
            y,
            ..
        } = *context;

        if pos_u > pos_v {
            return false;
        }

        let route = &self.routes[context.route_u];
        let delta = self.distance(u, v) + self.distance(x, y)
            - self.distance(u, x)
            - self.distance(v, y)
            + route.cumulated_reversal_distance[pos_v]
            - route.cumulated_reversal_distance[pos_u + 1];

        if delta > -MOVE_EPSILON || pos_v == pos_u + 1 {
            return false;
        }

        self.routes[context.route_u].clients[pos_u..pos_v].reverse();
        self.reindex_route(context.route_u);
        self.commit_move(context);
        true
    }
}
