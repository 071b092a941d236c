use super::local_search::LocalSearch;

/// A node of a route: a client, or the starting depot at position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct NodeRef {
    pub route: usize,
    pub position: usize,
}

/// Insertion point resolved when the move is applied, after earlier removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Anchor {
    Depot(usize),
    Client(usize),
}

/// Neighborhood of a `(U, V)` pair, `X` following `U` and `Y` following `V`.
///
/// ```text
///   ... -> [U prev] -> [U] -> [X] -> [X next] -> ...
///   ... -> [V prev] -> [V] -> [Y] -> [Y next] -> ...
/// ```
///
/// Depots appear as client 0.
#[derive(Debug, Clone, Copy)]
pub(super) struct MoveContext {
    pub route_u: usize,
    pub route_v: usize,
    pub pos_u: usize,
    pub pos_v: usize,

    pub u_prev: usize,
    pub u: usize,
    pub x: usize,
    pub x_next: usize,

    pub v_prev: usize,
    pub v: usize,
    pub y: usize,
    pub y_next: usize,

    pub x_is_depot: bool,
    pub y_is_depot: bool,
    pub intra_route: bool,
}

impl LocalSearch {
    pub(super) fn node_of(&self, client: usize) -> NodeRef {
        NodeRef {
            route: self.client_route[client],
            position: self.client_position[client],
        }
    }

    pub(super) fn move_context(&self, u: usize, v: NodeRef) -> MoveContext {
        let route_u = self.client_route[u];
        let pos_u = self.client_position[u];
        let data_u = &self.routes[route_u];
        let data_v = &self.routes[v.route];

        MoveContext {
            route_u,
            route_v: v.route,
            pos_u,
            pos_v: v.position,

            u_prev: data_u.client_at(pos_u - 1),
            u,
            x: data_u.client_at(pos_u + 1),
            x_next: data_u.client_at(pos_u + 2),

            v_prev: if v.position == 0 {
                0
            } else {
                data_v.client_at(v.position - 1)
            },
            v: data_v.client_at(v.position),
            y: data_v.client_at(v.position + 1),
            y_next: data_v.client_at(v.position + 2),

            x_is_depot: data_u.is_end_depot(pos_u + 1),
            y_is_depot: data_v.is_end_depot(v.position + 1),
            intra_route: route_u == v.route,
        }
    }

    /// Node after which clients are inserted when targeting `V`.
    pub(super) fn anchor_v(context: &MoveContext) -> Anchor {
        if context.pos_v == 0 {
            Anchor::Depot(context.route_v)
        } else {
            Anchor::Client(context.v)
        }
    }

    pub(super) fn commit_move(&mut self, context: &MoveContext) {
        self.nb_moves += 1;
        self.search_completed = false;
        self.update_route_data(context.route_u);
        if !context.intra_route {
            self.update_route_data(context.route_v);
        }
    }
}
