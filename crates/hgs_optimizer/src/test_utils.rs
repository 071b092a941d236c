use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    problem::{
        client::Client,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::solver_params::SolverParams,
};

/// Depot at the origin and `nb_clients` clients at `x = 1..=nb_clients` on the x axis.
pub fn create_line_problem(nb_clients: usize, demand: f64, capacity: f64) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_clients(line_clients(nb_clients, demand, 0.0))
        .set_vehicle_capacity(capacity);

    builder.build().unwrap()
}

pub fn create_line_problem_with_duration(
    nb_clients: usize,
    demand: f64,
    capacity: f64,
    duration_limit: f64,
    service_duration: f64,
) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_clients(line_clients(nb_clients, demand, service_duration))
        .set_vehicle_capacity(capacity)
        .set_duration_limit(Some(duration_limit));

    builder.build().unwrap()
}

fn line_clients(nb_clients: usize, demand: f64, service_duration: f64) -> Vec<Client> {
    let mut clients = vec![Client::from_cartesian(0.0, 0.0, 0.0)];
    clients.extend((1..=nb_clients).map(|index| {
        Client::new(
            geo::Coord {
                x: index as f64,
                y: 0.0,
            },
            demand,
            service_duration,
        )
    }));

    clients
}

/// Clients uniformly spread over a 100x100 square around a central depot.
pub fn create_random_problem(nb_clients: usize, capacity: f64, seed: u64) -> VehicleRoutingProblem {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut clients = vec![Client::from_cartesian(50.0, 50.0, 0.0)];
    clients.extend((0..nb_clients).map(|_| {
        Client::from_cartesian(
            rng.random_range(0.0..100.0),
            rng.random_range(0.0..100.0),
            rng.random_range(1..=10) as f64,
        )
    }));

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_clients(clients)
        .set_vehicle_capacity(capacity)
        .set_round_distances(true);

    builder.build().unwrap()
}

pub fn create_test_params() -> SolverParams {
    SolverParams {
        mu: 5,
        lambda: 10,
        nb_granular: 8,
        nb_iter: 50,
        verbose: false,
        ..SolverParams::default()
    }
}

pub fn shared(problem: VehicleRoutingProblem) -> Arc<VehicleRoutingProblem> {
    Arc::new(problem)
}
