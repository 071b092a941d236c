use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::penalty::PenaltyWeights;

/// Tolerance under which a constraint excess is considered satisfied.
pub const FEASIBILITY_EPSILON: f64 = 1e-5;

/// Penalized cost of an individual that has not been decoded yet.
pub const UNDECODED_COST: f64 = 1e30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub penalized_cost: f64,
    pub nb_routes: usize,
    pub distance: f64,
    pub capacity_excess: f64,
    pub duration_excess: f64,
    pub is_feasible: bool,
}

impl Default for Evaluation {
    fn default() -> Self {
        Evaluation {
            penalized_cost: UNDECODED_COST,
            nb_routes: 0,
            distance: 0.0,
            capacity_excess: 0.0,
            duration_excess: 0.0,
            is_feasible: false,
        }
    }
}

/// A candidate solution: a giant tour over all clients and its decoding into routes.
///
/// Only the split and the local search rewrite the chromosome, and both end by
/// re-evaluating it, so `evaluation()` always describes the current routes.
#[derive(Debug, Clone, Serialize)]
pub struct Individual {
    pub(crate) evaluation: Evaluation,
    /// Giant tour, depot excluded.
    pub(crate) chromosome: Vec<usize>,
    /// One slot per vehicle, empty slots allowed.
    pub(crate) routes: Vec<Vec<usize>>,
    /// Next client of each client in its route, 0 for the depot.
    pub(crate) successors: Vec<usize>,
    /// Previous client of each client in its route, 0 for the depot.
    pub(crate) predecessors: Vec<usize>,
}

impl Individual {
    /// Identity tour, not decoded.
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        let nb_clients = problem.nb_clients();

        Individual {
            evaluation: Evaluation::default(),
            chromosome: (1..=nb_clients).collect(),
            routes: vec![Vec::new(); problem.nb_vehicles()],
            successors: vec![0; nb_clients + 1],
            predecessors: vec![0; nb_clients + 1],
        }
    }

    /// Uniformly shuffled tour, not decoded.
    pub fn random<R: Rng + ?Sized>(problem: &VehicleRoutingProblem, rng: &mut R) -> Self {
        let mut individual = Individual::new(problem);
        individual.chromosome.shuffle(rng);
        individual
    }

    /// Builds an evaluated individual from explicit routes.
    ///
    /// Panics if the routes do not visit every client exactly once or use more
    /// routes than vehicles.
    pub fn from_routes(
        problem: &VehicleRoutingProblem,
        routes: Vec<Vec<usize>>,
        penalties: &PenaltyWeights,
    ) -> Self {
        assert!(
            routes.len() <= problem.nb_vehicles(),
            "{} routes given for {} vehicles",
            routes.len(),
            problem.nb_vehicles()
        );

        let mut individual = Individual::new(problem);
        individual.chromosome = routes.iter().flatten().copied().collect();
        assert!(
            is_permutation(&individual.chromosome, problem.nb_clients()),
            "Routes must visit every client exactly once"
        );

        for (slot, route) in individual.routes.iter_mut().zip(routes) {
            *slot = route;
        }

        individual.evaluate_complete_cost(problem, penalties);
        individual
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn chromosome(&self) -> &[usize] {
        &self.chromosome
    }

    pub fn routes(&self) -> &[Vec<usize>] {
        &self.routes
    }

    pub fn non_empty_routes(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.routes.iter().filter(|route| !route.is_empty())
    }

    pub fn successor(&self, client: usize) -> usize {
        self.successors[client]
    }

    pub fn predecessor(&self, client: usize) -> usize {
        self.predecessors[client]
    }

    #[inline(always)]
    pub fn penalized_cost(&self) -> f64 {
        self.evaluation.penalized_cost
    }

    #[inline(always)]
    pub fn is_feasible(&self) -> bool {
        self.evaluation.is_feasible
    }

    #[inline(always)]
    pub fn nb_routes(&self) -> usize {
        self.evaluation.nb_routes
    }

    /// Recomputes distance, excesses, adjacency and penalized cost from the routes.
    pub fn evaluate_complete_cost(
        &mut self,
        problem: &VehicleRoutingProblem,
        penalties: &PenaltyWeights,
    ) {
        let mut evaluation = Evaluation {
            penalized_cost: 0.0,
            ..Evaluation::default()
        };

        for route in self.routes.iter().filter(|route| !route.is_empty()) {
            let mut previous = 0;
            let mut distance = 0.0;
            let mut load = 0.0;
            let mut service = 0.0;

            for &client in route {
                distance += problem.distance(previous, client);
                load += problem.demand(client);
                service += problem.service_duration(client);
                self.predecessors[client] = previous;
                if previous != 0 {
                    self.successors[previous] = client;
                }
                previous = client;
            }

            self.successors[previous] = 0;
            distance += problem.distance(previous, 0);

            evaluation.distance += distance;
            evaluation.nb_routes += 1;
            evaluation.capacity_excess += problem.load_excess(load);
            evaluation.duration_excess += problem.duration_excess(distance + service);
        }

        evaluation.is_feasible = evaluation.capacity_excess < FEASIBILITY_EPSILON
            && evaluation.duration_excess < FEASIBILITY_EPSILON;
        self.evaluation = evaluation;
        self.update_penalized_cost(penalties);
    }

    /// Re-weights the cached excesses without re-decoding.
    pub fn update_penalized_cost(&mut self, penalties: &PenaltyWeights) {
        self.evaluation.penalized_cost = penalties.penalized_cost(
            self.evaluation.distance,
            self.evaluation.capacity_excess,
            self.evaluation.duration_excess,
        );
    }
}

pub(crate) fn is_permutation(chromosome: &[usize], nb_clients: usize) -> bool {
    if chromosome.len() != nb_clients {
        return false;
    }

    let mut seen = vec![false; nb_clients + 1];
    for &client in chromosome {
        if client == 0 || client > nb_clients || seen[client] {
            return false;
        }
        seen[client] = true;
    }

    true
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::test_utils;

    use super::*;

    #[test]
    fn test_new_individual_is_undecoded() {
        let problem = test_utils::create_line_problem(5, 10.0, 100.0);
        let individual = Individual::new(&problem);

        assert_eq!(individual.chromosome(), &[1, 2, 3, 4, 5]);
        assert_eq!(individual.penalized_cost(), UNDECODED_COST);
        assert_eq!(individual.routes().len(), problem.nb_vehicles());
        assert!(!individual.is_feasible());
    }

    #[test]
    fn test_random_is_permutation() {
        let problem = test_utils::create_line_problem(12, 10.0, 100.0);
        let mut rng = SmallRng::seed_from_u64(3);
        let individual = Individual::random(&problem, &mut rng);

        assert!(is_permutation(individual.chromosome(), 12));
    }

    #[test]
    fn test_evaluate_complete_cost() {
        // Clients on a line at x = 1..=4, demand 10 each, capacity 25
        let problem = test_utils::create_line_problem(4, 10.0, 25.0);
        let penalties = PenaltyWeights::new(2.0, 1.0);

        let individual = Individual::from_routes(&problem, vec![vec![1, 2, 3], vec![4]], &penalties);
        let evaluation = individual.evaluation();

        // 0 -> 1 -> 2 -> 3 -> 0 = 6, 0 -> 4 -> 0 = 8
        assert_eq!(evaluation.distance, 14.0);
        assert_eq!(evaluation.nb_routes, 2);
        assert_eq!(evaluation.capacity_excess, 5.0);
        assert_eq!(evaluation.penalized_cost, 24.0);
        assert!(!evaluation.is_feasible);

        assert_eq!(individual.predecessor(1), 0);
        assert_eq!(individual.successor(1), 2);
        assert_eq!(individual.successor(3), 0);
        assert_eq!(individual.predecessor(4), 0);
        assert_eq!(individual.successor(4), 0);
    }

    #[test]
    fn test_update_penalized_cost() {
        let problem = test_utils::create_line_problem(4, 10.0, 25.0);
        let mut individual = Individual::from_routes(
            &problem,
            vec![vec![1, 2, 3], vec![4]],
            &PenaltyWeights::new(2.0, 1.0),
        );

        individual.update_penalized_cost(&PenaltyWeights::new(10.0, 1.0));
        assert_eq!(individual.penalized_cost(), 64.0);
    }

    #[test]
    fn test_duration_excess() {
        let problem = test_utils::create_line_problem_with_duration(3, 1.0, 100.0, 5.0, 1.0);
        let individual = Individual::from_routes(
            &problem,
            vec![vec![1, 2, 3]],
            &PenaltyWeights::new(1.0, 3.0),
        );

        // distance 6 and service 3 against a limit of 5
        assert_eq!(individual.evaluation().duration_excess, 4.0);
        assert_eq!(individual.penalized_cost(), 6.0 + 12.0);
        assert!(!individual.is_feasible());
    }

    #[test]
    #[should_panic(expected = "exactly once")]
    fn test_from_routes_rejects_missing_client() {
        let problem = test_utils::create_line_problem(4, 10.0, 25.0);
        Individual::from_routes(&problem, vec![vec![1, 2, 3]], &PenaltyWeights::new(1.0, 1.0));
    }
}
