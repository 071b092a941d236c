use std::{collections::BTreeSet, sync::Arc};

use rand::{Rng, rngs::SmallRng, seq::SliceRandom};
use tracing::instrument;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{individual::Individual, penalty::PenaltyWeights},
};

use super::{
    improve_individual::ImproveIndividual,
    r#move::{Anchor, MoveContext, NodeRef},
    route_data::RouteData,
};

/// Improvement threshold under which a move is not applied.
pub(super) const MOVE_EPSILON: f64 = 1e-5;

/// Granular local search over relocate, swap, 2-opt and 2-opt* neighborhoods.
///
/// Moves are only evaluated between a client and its correlated vertices, and
/// a pair is skipped when neither route changed since the client was last tested.
pub struct LocalSearch {
    pub(super) problem: Arc<VehicleRoutingProblem>,
    nb_granular: usize,
    correlated_vertices: Vec<Vec<usize>>,
    order_nodes: Vec<usize>,

    pub(super) routes: Vec<RouteData>,
    pub(super) client_route: Vec<usize>,
    pub(super) client_position: Vec<usize>,
    when_last_tested: Vec<usize>,
    pub(super) empty_routes: BTreeSet<usize>,

    pub(super) nb_moves: usize,
    pub(super) search_completed: bool,
    pub(super) penalties: PenaltyWeights,
}

/// For each client, its `nb_granular` closest clients, made symmetric.
pub fn correlated_vertices(problem: &VehicleRoutingProblem, nb_granular: usize) -> Vec<Vec<usize>> {
    let nb_clients = problem.nb_clients();
    let mut correlated: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nb_clients + 1];

    for i in 1..=nb_clients {
        let mut proximity: Vec<(f64, usize)> = (1..=nb_clients)
            .filter(|&j| j != i)
            .map(|j| (problem.distance(i, j), j))
            .collect();
        proximity.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for &(_, j) in proximity.iter().take(nb_granular.min(nb_clients - 1)) {
            correlated[i].insert(j);
            correlated[j].insert(i);
        }
    }

    correlated
        .into_iter()
        .map(|vertices| vertices.into_iter().collect())
        .collect()
}

impl LocalSearch {
    pub fn new(problem: Arc<VehicleRoutingProblem>, nb_granular: usize) -> Self {
        let nb_clients = problem.nb_clients();

        LocalSearch {
            correlated_vertices: correlated_vertices(&problem, nb_granular),
            nb_granular: nb_granular.max(1),
            order_nodes: (1..=nb_clients).collect(),
            routes: vec![RouteData::default(); problem.nb_vehicles()],
            client_route: vec![0; nb_clients + 1],
            client_position: vec![0; nb_clients + 1],
            when_last_tested: vec![0; nb_clients + 1],
            empty_routes: BTreeSet::new(),
            nb_moves: 0,
            search_completed: false,
            penalties: PenaltyWeights::initial(&problem),
            problem,
        }
    }

    pub fn correlated(&self, client: usize) -> &[usize] {
        &self.correlated_vertices[client]
    }

    /// Number of moves applied by the last run.
    pub fn nb_moves(&self) -> usize {
        self.nb_moves
    }

    #[inline(always)]
    pub(super) fn penalty_excess_load(&self, load: f64) -> f64 {
        self.problem.load_excess(load) * self.penalties.capacity
    }

    #[inline(always)]
    pub(super) fn penalty_excess_duration(&self, duration: f64) -> f64 {
        self.problem.duration_excess(duration) * self.penalties.duration
    }

    #[inline(always)]
    pub(super) fn distance(&self, from: usize, to: usize) -> f64 {
        self.problem.distance(from, to)
    }

    #[inline(always)]
    pub(super) fn demand(&self, client: usize) -> f64 {
        self.problem.demand(client)
    }

    #[inline(always)]
    pub(super) fn service(&self, client: usize) -> f64 {
        self.problem.service_duration(client)
    }

    fn search(&mut self) {
        let nb_clients = self.problem.nb_clients();
        self.search_completed = false;

        let mut loop_id = 0;
        while !self.search_completed {
            // Empty route moves are skipped in the first loop, so at least two loops run
            if loop_id > 1 {
                self.search_completed = true;
            }

            for pos_u in 0..nb_clients {
                let u = self.order_nodes[pos_u];
                let last_tested = self.when_last_tested[u];
                self.when_last_tested[u] = self.nb_moves;

                for pos_v in 0..self.correlated_vertices[u].len() {
                    let v = self.correlated_vertices[u][pos_v];
                    let last_modified = self.routes[self.client_route[u]]
                        .when_last_modified
                        .max(self.routes[self.client_route[v]].when_last_modified);

                    if loop_id == 0 || last_modified > last_tested {
                        let context = self.move_context(u, self.node_of(v));
                        if self.apply_client_moves(&context) {
                            continue;
                        }

                        if context.pos_v == 1 {
                            let depot = NodeRef {
                                route: context.route_v,
                                position: 0,
                            };
                            let context = self.move_context(u, depot);
                            self.apply_depot_moves(&context);
                        }
                    }
                }

                if loop_id > 0 {
                    if let Some(&empty_route) = self.empty_routes.first() {
                        let depot = NodeRef {
                            route: empty_route,
                            position: 0,
                        };
                        let context = self.move_context(u, depot);
                        self.apply_empty_route_moves(&context);
                    }
                }
            }

            loop_id += 1;
        }
    }

    fn apply_client_moves(&mut self, context: &MoveContext) -> bool {
        self.relocate(context)
            || self.relocate_pair(context)
            || self.relocate_reversed_pair(context)
            || (context.u <= context.v && self.swap(context))
            || self.swap_pair_with_client(context)
            || (context.u <= context.v && self.swap_pairs(context))
            || (context.intra_route && self.two_opt(context))
            || (!context.intra_route && self.two_opt_star_reversed(context))
            || (!context.intra_route && self.two_opt_star(context))
    }

    /// Moves inserting after the depot that precedes `V`.
    fn apply_depot_moves(&mut self, context: &MoveContext) -> bool {
        self.relocate(context)
            || self.relocate_pair(context)
            || self.relocate_reversed_pair(context)
            || (!context.intra_route && self.two_opt_star_reversed(context))
            || (!context.intra_route && self.two_opt_star(context))
    }

    fn apply_empty_route_moves(&mut self, context: &MoveContext) -> bool {
        self.relocate(context)
            || self.relocate_pair(context)
            || self.relocate_reversed_pair(context)
            || self.two_opt_star(context)
    }

    fn load_individual(&mut self, individual: &Individual) {
        self.empty_routes.clear();
        self.nb_moves = 0;

        for (index, route) in individual.routes().iter().enumerate() {
            self.routes[index].clients.clear();
            self.routes[index].clients.extend_from_slice(route);
            self.reindex_route(index);
            self.update_route_data(index);
        }

        self.when_last_tested.fill(0);
    }

    /// Writes the routes back, sorted by the polar angle of their barycenter.
    fn export_individual(&self, individual: &mut Individual) {
        let mut order: Vec<(f64, usize)> = self
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| (route.polar_angle_barycenter, index))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut position = 0;
        for (slot, &(_, index)) in order.iter().enumerate() {
            let clients = &self.routes[index].clients;
            individual.routes[slot].clear();
            individual.routes[slot].extend_from_slice(clients);
            individual.chromosome[position..position + clients.len()].copy_from_slice(clients);
            position += clients.len();
        }

        individual.evaluate_complete_cost(&self.problem, &self.penalties);
    }

    pub(super) fn reindex_route(&mut self, route: usize) {
        for (index, &client) in self.routes[route].clients.iter().enumerate() {
            self.client_route[client] = route;
            self.client_position[client] = index + 1;
        }
    }

    pub(super) fn update_route_data(&mut self, route: usize) {
        let problem = &self.problem;
        let depot = problem.depot();
        let data = &mut self.routes[route];
        let len = data.clients.len();

        data.cumulated_load.resize(len + 2, 0.0);
        data.cumulated_time.resize(len + 2, 0.0);
        data.cumulated_reversal_distance.resize(len + 2, 0.0);

        let mut load = 0.0;
        let mut time = 0.0;
        let mut reversal_distance = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut previous = 0;

        data.cumulated_load[0] = 0.0;
        data.cumulated_time[0] = 0.0;
        data.cumulated_reversal_distance[0] = 0.0;

        for position in 1..=len + 1 {
            let client = data.client_at(position);
            load += problem.demand(client);
            time += problem.distance(previous, client) + problem.service_duration(client);
            reversal_distance += problem.distance(client, previous) - problem.distance(previous, client);

            data.cumulated_load[position] = load;
            data.cumulated_time[position] = time;
            data.cumulated_reversal_distance[position] = reversal_distance;

            if client != 0 {
                sum_x += problem.client(client).x();
                sum_y += problem.client(client).y();
            }
            previous = client;
        }

        data.load = load;
        data.duration = time;
        data.reversal_distance = reversal_distance;
        data.penalty = problem.load_excess(load) * self.penalties.capacity
            + problem.duration_excess(time) * self.penalties.duration;
        data.when_last_modified = self.nb_moves;

        if len == 0 {
            data.polar_angle_barycenter = 1e30;
            self.empty_routes.insert(route);
        } else {
            data.polar_angle_barycenter =
                (sum_y / len as f64 - depot.y()).atan2(sum_x / len as f64 - depot.x());
            self.empty_routes.remove(&route);
        }
    }

    pub(super) fn remove_client(&mut self, client: usize) {
        let route = self.client_route[client];
        self.routes[route]
            .clients
            .remove(self.client_position[client] - 1);
        self.reindex_route(route);
    }

    pub(super) fn insert_after(&mut self, client: usize, anchor: Anchor) {
        let (route, index) = match anchor {
            Anchor::Depot(route) => (route, 0),
            Anchor::Client(other) => (self.client_route[other], self.client_position[other]),
        };

        self.routes[route].clients.insert(index, client);
        self.reindex_route(route);
    }

    /// Moves `client` right after `anchor`.
    pub(super) fn insert_node(&mut self, client: usize, anchor: Anchor) {
        self.remove_client(client);
        self.insert_after(client, anchor);
    }

    /// Exchanges the places of two clients.
    pub(super) fn swap_nodes(&mut self, a: usize, b: usize) {
        let node_a = self.node_of(a);
        let node_b = self.node_of(b);

        self.routes[node_a.route].clients[node_a.position - 1] = b;
        self.routes[node_b.route].clients[node_b.position - 1] = a;

        self.client_route[a] = node_b.route;
        self.client_position[a] = node_b.position;
        self.client_route[b] = node_a.route;
        self.client_position[b] = node_a.position;
    }
}

impl ImproveIndividual for LocalSearch {
    #[instrument(skip_all, level = "trace")]
    fn run(&mut self, individual: &mut Individual, penalties: &PenaltyWeights, rng: &mut SmallRng) {
        self.penalties = *penalties;
        self.load_individual(individual);

        self.order_nodes.shuffle(rng);
        for vertices in self.correlated_vertices.iter_mut().skip(1) {
            if rng.random_range(0..self.nb_granular) == 0 {
                vertices.shuffle(rng);
            }
        }

        self.search();
        self.export_individual(individual);
    }
}
