#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, sync::Arc};

use geo::Coord;
use hgs_optimizer::{
    problem::{
        client::Client,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        individual::Individual,
        ls::improve_individual::ImproveIndividual,
        penalty::PenaltyWeights,
        population::evolve_population::EvolvePopulation,
        solver_params::SolverParams,
        split::Split,
    },
};
use rand::rngs::SmallRng;

/// Clients evenly spread on a circle of radius 10 around the depot.
pub fn circle_problem(nb_clients: usize, demand: f64, capacity: f64) -> Arc<VehicleRoutingProblem> {
    let mut clients = vec![Client::depot(Coord { x: 0.0, y: 0.0 })];
    clients.extend((0..nb_clients).map(|index| {
        let angle = 2.0 * std::f64::consts::PI * index as f64 / nb_clients as f64;
        Client::from_cartesian(10.0 * angle.cos(), 10.0 * angle.sin(), demand)
    }));

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_clients(clients)
        .set_vehicle_capacity(capacity)
        .set_round_distances(true);

    Arc::new(builder.build().unwrap())
}

pub fn quiet_params() -> SolverParams {
    SolverParams {
        mu: 5,
        lambda: 10,
        nb_granular: 8,
        nb_iter: 50,
        verbose: false,
        ..SolverParams::default()
    }
}

/// Population returning scripted insertion outcomes and recording every call.
pub struct ScriptedPopulation {
    parent: Individual,
    outcomes: VecDeque<bool>,
    repair_outcomes: VecDeque<bool>,
    pub generated: usize,
    pub restarts: usize,
    pub penalty_updates: usize,
    pub insertions: Vec<bool>,
    pub traces: RefCell<Vec<(usize, usize)>>,
}

impl ScriptedPopulation {
    /// `outcomes[g]` is the value returned by the first insertion of generation `g`,
    /// false once exhausted.
    pub fn new(problem: &VehicleRoutingProblem, outcomes: &[bool]) -> Self {
        let clients: Vec<usize> = (1..=problem.nb_clients()).collect();
        let parent =
            Individual::from_routes(problem, vec![clients], &PenaltyWeights::new(1.0, 1.0));

        ScriptedPopulation {
            parent,
            outcomes: outcomes.iter().copied().collect(),
            repair_outcomes: VecDeque::new(),
            generated: 0,
            restarts: 0,
            penalty_updates: 0,
            insertions: Vec::new(),
            traces: RefCell::new(Vec::new()),
        }
    }

    /// Values returned by the insertions of repaired offspring, false once exhausted.
    pub fn with_repair_outcomes(mut self, outcomes: &[bool]) -> Self {
        self.repair_outcomes = outcomes.iter().copied().collect();
        self
    }

    pub fn weights() -> PenaltyWeights {
        PenaltyWeights::new(1.0, 1.0)
    }
}

impl EvolvePopulation for ScriptedPopulation {
    fn generate_population<L: ImproveIndividual>(
        &mut self,
        _split: &mut Split,
        _local_search: &mut L,
        _rng: &mut SmallRng,
    ) {
        self.generated += 1;
    }

    fn binary_tournament(&self, _rng: &mut SmallRng) -> &Individual {
        &self.parent
    }

    fn add_individual(&mut self, _individual: &Individual, update_biased_fitness: bool) -> bool {
        self.insertions.push(update_biased_fitness);
        let outcomes = if update_biased_fitness {
            &mut self.outcomes
        } else {
            &mut self.repair_outcomes
        };
        outcomes.pop_front().unwrap_or(false)
    }

    fn manage_penalties(&mut self) {
        self.penalty_updates += 1;
    }

    fn restart<L: ImproveIndividual>(
        &mut self,
        _split: &mut Split,
        _local_search: &mut L,
        _rng: &mut SmallRng,
    ) {
        self.restarts += 1;
    }

    fn print_state(&self, iteration: usize, iterations_without_improvement: usize) {
        self.traces
            .borrow_mut()
            .push((iteration, iterations_without_improvement));
    }

    fn best_found(&self) -> Option<&Individual> {
        Some(&self.parent)
    }

    fn penalty_weights(&self) -> PenaltyWeights {
        ScriptedPopulation::weights()
    }
}

/// Local search leaving every individual untouched.
#[derive(Default)]
pub struct IdleLocalSearch {
    pub calls: usize,
}

impl ImproveIndividual for IdleLocalSearch {
    fn run(&mut self, _individual: &mut Individual, _penalties: &PenaltyWeights, _rng: &mut SmallRng) {
        self.calls += 1;
    }
}

/// Local search leaving the offspring infeasible at the population weights and
/// feasible at any other weights, recording the weights of every call.
pub struct RepairingLocalSearch {
    infeasible: Individual,
    feasible: Individual,
    pub received: Vec<PenaltyWeights>,
}

impl RepairingLocalSearch {
    /// `problem` must fit its clients in two routes but not in one.
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        let clients: Vec<usize> = (1..=problem.nb_clients()).collect();
        let (first, second) = clients.split_at(clients.len() / 2);
        let weights = ScriptedPopulation::weights();

        let infeasible = Individual::from_routes(problem, vec![clients.clone()], &weights);
        let feasible =
            Individual::from_routes(problem, vec![first.to_vec(), second.to_vec()], &weights);
        assert!(!infeasible.is_feasible());
        assert!(feasible.is_feasible());

        RepairingLocalSearch {
            infeasible,
            feasible,
            received: Vec::new(),
        }
    }
}

impl ImproveIndividual for RepairingLocalSearch {
    fn run(&mut self, individual: &mut Individual, penalties: &PenaltyWeights, _rng: &mut SmallRng) {
        self.received.push(*penalties);
        if *penalties == ScriptedPopulation::weights() {
            individual.clone_from(&self.infeasible);
        } else {
            individual.clone_from(&self.feasible);
        }
    }
}
