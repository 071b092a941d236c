use std::{collections::VecDeque, sync::Arc};

use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::{individual::Individual, penalty::PenaltyWeights};

const UNREACHED: f64 = 1e30;
const SPLIT_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, Default)]
struct ClientSplit {
    demand: f64,
    service_duration: f64,
    /// Distance from the depot to the client.
    d0_x: f64,
    /// Distance from the client to the depot.
    dx_0: f64,
    /// Distance to the next client of the giant tour.
    d_next: f64,
}

/// Optimal decoding of a giant tour into routes.
///
/// Finds the cheapest partition of the tour into consecutive segments, capacity
/// and duration excesses being penalized instead of forbidden. The unlimited
/// fleet algorithm runs first; the layered limited fleet variant only runs when
/// the result uses more routes than allowed.
pub struct Split {
    problem: Arc<VehicleRoutingProblem>,
    clients: Vec<ClientSplit>,
    /// `potential[k][i]`: cost of serving the first `i` clients with `k` routes.
    potential: Vec<Vec<f64>>,
    predecessors: Vec<Vec<usize>>,
    sum_distance: Vec<f64>,
    sum_load: Vec<f64>,
    queue: VecDeque<usize>,
    max_vehicles: usize,
    penalties: PenaltyWeights,
}

impl Split {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let nb_clients = problem.nb_clients();
        let nb_layers = problem.nb_vehicles().max(problem.vehicles_lower_bound()) + 1;

        Split {
            clients: vec![ClientSplit::default(); nb_clients + 1],
            potential: vec![vec![UNREACHED; nb_clients + 1]; nb_layers],
            predecessors: vec![vec![0; nb_clients + 1]; nb_layers],
            sum_distance: vec![0.0; nb_clients + 1],
            sum_load: vec![0.0; nb_clients + 1],
            queue: VecDeque::with_capacity(nb_clients + 1),
            max_vehicles: 0,
            penalties: PenaltyWeights::initial(&problem),
            problem,
        }
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        &self.problem
    }

    /// Decodes the chromosome of `individual` into at most
    /// `max(nb_max_vehicles, vehicles lower bound)` routes and evaluates it.
    pub fn general_split(
        &mut self,
        individual: &mut Individual,
        nb_max_vehicles: usize,
        penalties: &PenaltyWeights,
    ) {
        self.penalties = *penalties;
        self.max_vehicles = nb_max_vehicles
            .max(self.problem.vehicles_lower_bound())
            .clamp(1, self.problem.nb_vehicles());

        self.load_chromosome(individual.chromosome());

        let nb_routes = match self.split_simple() {
            Some(nb_routes) => nb_routes,
            None => self.split_limited_fleet(),
        };

        self.fill_routes(individual, nb_routes);
        individual.evaluate_complete_cost(&self.problem, penalties);
    }

    fn load_chromosome(&mut self, chromosome: &[usize]) {
        let problem = &self.problem;
        let nb_clients = problem.nb_clients();

        for i in 1..=nb_clients {
            let client = chromosome[i - 1];
            self.clients[i] = ClientSplit {
                demand: problem.demand(client),
                service_duration: problem.service_duration(client),
                d0_x: problem.distance(0, client),
                dx_0: problem.distance(client, 0),
                d_next: if i < nb_clients {
                    problem.distance(client, chromosome[i])
                } else {
                    -UNREACHED
                },
            };

            self.sum_load[i] = self.sum_load[i - 1] + self.clients[i].demand;
            self.sum_distance[i] = self.sum_distance[i - 1] + self.clients[i - 1].d_next;
        }
    }

    /// Cost of the route serving clients `i + 1..=j` after reaching `i` with `k` routes.
    #[inline(always)]
    fn propagate(&self, i: usize, j: usize, k: usize) -> f64 {
        self.potential[k][i] + self.sum_distance[j] - self.sum_distance[i + 1]
            + self.clients[i + 1].d0_x
            + self.clients[j].dx_0
            + self.penalties.capacity
                * (self.sum_load[j] - self.sum_load[i] - self.problem.vehicle_capacity()).max(0.0)
    }

    /// Whether `j` is dominated by `i` as a predecessor, `i < j`.
    #[inline(always)]
    fn dominates(&self, i: usize, j: usize, k: usize) -> bool {
        self.potential[k][j] + self.clients[j + 1].d0_x
            > self.potential[k][i]
                + self.clients[i + 1].d0_x
                + self.sum_distance[j + 1]
                - self.sum_distance[i + 1]
                + self.penalties.capacity * (self.sum_load[j] - self.sum_load[i])
    }

    /// Whether `i` is dominated by `j` as a predecessor, `i < j`.
    #[inline(always)]
    fn dominates_right(&self, i: usize, j: usize, k: usize) -> bool {
        self.potential[k][j] + self.clients[j + 1].d0_x
            < self.potential[k][i] + self.clients[i + 1].d0_x + self.sum_distance[j + 1]
                - self.sum_distance[i + 1]
                + SPLIT_EPSILON
    }

    /// Cost of a route serving clients `i + 1..=j` with duration constraints.
    #[inline(always)]
    fn segment_cost(&self, distance: f64, load: f64, service: f64, j: usize) -> f64 {
        let travel = distance + self.clients[j].dx_0;

        travel
            + self.penalties.capacity * self.problem.load_excess(load)
            + self.penalties.duration * self.problem.duration_excess(travel + service)
    }

    /// Relaxes every route starting after `i` from layer `from` into layer `to`.
    ///
    /// Segments stop growing once their load exceeds 1.5 times the capacity.
    fn relax_bellman(&mut self, i: usize, from: usize, to: usize) {
        let nb_clients = self.problem.nb_clients();
        let load_cutoff = 1.5 * self.problem.vehicle_capacity();

        let mut load = 0.0;
        let mut service = 0.0;
        let mut distance = 0.0;
        let mut j = i + 1;
        while j <= nb_clients && load <= load_cutoff {
            load += self.clients[j].demand;
            service += self.clients[j].service_duration;
            if j == i + 1 {
                distance += self.clients[j].d0_x;
            } else {
                distance += self.clients[j - 1].d_next;
            }

            let cost = self.potential[from][i] + self.segment_cost(distance, load, service, j);
            if cost < self.potential[to][j] {
                self.potential[to][j] = cost;
                self.predecessors[to][j] = i;
            }
            j += 1;
        }
    }

    fn reset_layers(&mut self, nb_layers: usize) {
        for layer in self.potential.iter_mut().take(nb_layers) {
            layer.fill(UNREACHED);
        }
        self.potential[0][0] = 0.0;
    }

    /// Unlimited fleet split, all layers collapsed into `potential[0]`.
    ///
    /// Returns the number of routes used, `None` when it exceeds the fleet.
    fn split_simple(&mut self) -> Option<usize> {
        let nb_clients = self.problem.nb_clients();
        self.reset_layers(1);

        if self.problem.has_duration_limit() {
            for i in 0..nb_clients {
                self.relax_bellman(i, 0, 0);
            }
        } else {
            self.queue.clear();
            self.queue.push_back(0);

            for i in 1..=nb_clients {
                let Some(&front) = self.queue.front() else {
                    break;
                };

                self.potential[0][i] = self.propagate(front, i, 0);
                self.predecessors[0][i] = front;

                if i < nb_clients {
                    self.push_candidate(i, 0);
                }
            }
        }

        assert!(
            self.potential[0][nb_clients] < UNREACHED,
            "Split did not reach the last client of the tour"
        );

        let mut nb_routes = 0;
        let mut end = nb_clients;
        while end > 0 {
            end = self.predecessors[0][end];
            nb_routes += 1;
        }

        (nb_routes <= self.max_vehicles).then_some(nb_routes)
    }

    /// Offers `i` as a predecessor to the queue and drops a front that stopped being useful.
    fn push_candidate(&mut self, i: usize, k: usize) {
        let back_dominates = match self.queue.back() {
            Some(&back) => self.dominates(back, i, k),
            None => false,
        };

        if !back_dominates {
            while let Some(&back) = self.queue.back() {
                if !self.dominates_right(back, i, k) {
                    break;
                }
                self.queue.pop_back();
            }
            self.queue.push_back(i);
        }

        while self.queue.len() > 1 {
            let front = self.queue[0];
            let next_front = self.queue[1];
            if self.propagate(front, i + 1, k) > self.propagate(next_front, i + 1, k) - SPLIT_EPSILON
            {
                self.queue.pop_front();
            } else {
                break;
            }
        }
    }

    /// Split with at most `max_vehicles` routes, layer `k` using exactly `k` routes.
    ///
    /// Returns the cheapest reachable number of routes.
    fn split_limited_fleet(&mut self) -> usize {
        let nb_clients = self.problem.nb_clients();
        let max_vehicles = self.max_vehicles;
        self.reset_layers(max_vehicles + 1);

        if self.problem.has_duration_limit() {
            for k in 0..max_vehicles {
                for i in k..nb_clients {
                    if self.potential[k][i] >= UNREACHED {
                        break;
                    }
                    self.relax_bellman(i, k, k + 1);
                }
            }
        } else {
            for k in 0..max_vehicles {
                self.queue.clear();
                self.queue.push_back(k);

                // Reachable states of a layer form an interval, the queue
                // empties once it is left.
                for i in (k + 1)..=nb_clients {
                    let Some(&front) = self.queue.front() else {
                        break;
                    };

                    self.potential[k + 1][i] = self.propagate(front, i, k);
                    self.predecessors[k + 1][i] = front;

                    if i < nb_clients {
                        self.push_candidate(i, k);
                    }
                }
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for k in 1..=max_vehicles {
            let cost = self.potential[k][nb_clients];
            if cost < UNREACHED && best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((k, cost));
            }
        }

        match best {
            Some((nb_routes, _)) => nb_routes,
            None => panic!(
                "Split did not reach the last client with at most {max_vehicles} routes"
            ),
        }
    }

    /// Writes `nb_routes` routes from layer `nb_routes` (or the collapsed layer 0
    /// after a simple split) into the first route slots.
    fn fill_routes(&self, individual: &mut Individual, nb_routes: usize) {
        let nb_clients = self.problem.nb_clients();
        let collapsed = self.potential[0][nb_clients] < UNREACHED;

        for route in individual.routes.iter_mut() {
            route.clear();
        }

        let mut end = nb_clients;
        for k in (0..nb_routes).rev() {
            let layer = if collapsed { 0 } else { k + 1 };
            let begin = self.predecessors[layer][end];
            assert!(
                begin < end,
                "Split backtracking produced an empty route {k} ending at {end}"
            );

            individual.routes[k].extend_from_slice(&individual.chromosome[begin..end]);
            end = begin;
        }

        assert_eq!(end, 0, "Split backtracking did not reach the depot");
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::{solver::individual::Individual, test_utils};

    use super::*;

    fn brute_force_cost(
        problem: &VehicleRoutingProblem,
        chromosome: &[usize],
        penalties: &PenaltyWeights,
        max_routes: usize,
    ) -> f64 {
        // Enumerates every set of cut points over the tour.
        let n = chromosome.len();
        let mut best = f64::MAX;
        for mask in 0u32..(1 << (n - 1)) {
            let nb_routes = mask.count_ones() as usize + 1;
            if nb_routes > max_routes {
                continue;
            }

            let mut routes = vec![Vec::new()];
            for (index, &client) in chromosome.iter().enumerate() {
                routes.last_mut().unwrap().push(client);
                if index < n - 1 && mask & (1 << index) != 0 {
                    routes.push(Vec::new());
                }
            }

            let individual = Individual::from_routes(problem, routes, penalties);
            best = best.min(individual.penalized_cost());
        }

        best
    }

    #[test]
    fn test_split_line() {
        // Capacity 25 and demand 10: at most two clients per route without penalty
        let problem = Arc::new(test_utils::create_line_problem(4, 10.0, 25.0));
        let mut split = Split::new(Arc::clone(&problem));
        let penalties = PenaltyWeights::new(1000.0, 1.0);

        let mut individual = Individual::new(&problem);
        split.general_split(&mut individual, problem.nb_vehicles(), &penalties);

        assert!(individual.is_feasible());
        assert_eq!(individual.nb_routes(), 2);
        assert_eq!(individual.routes()[0], vec![1, 2]);
        assert_eq!(individual.routes()[1], vec![3, 4]);
        // 0 -> 1 -> 2 -> 0 and 0 -> 3 -> 4 -> 0
        assert_eq!(individual.evaluation().distance, 12.0);
    }

    #[test]
    fn test_split_matches_brute_force() {
        let problem = Arc::new(test_utils::create_random_problem(9, 20.0, 11));
        let mut split = Split::new(Arc::clone(&problem));
        let mut rng = SmallRng::seed_from_u64(5);

        for penalty in [0.5, 5.0, 50.0] {
            let penalties = PenaltyWeights::new(penalty, 1.0);
            for _ in 0..5 {
                let mut individual = Individual::random(&problem, &mut rng);
                split.general_split(&mut individual, problem.nb_vehicles(), &penalties);

                let expected = brute_force_cost(
                    &problem,
                    individual.chromosome(),
                    &penalties,
                    problem.nb_vehicles(),
                );
                assert!(
                    (individual.penalized_cost() - expected).abs() < 1e-6,
                    "split cost {} differs from optimum {}",
                    individual.penalized_cost(),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_split_with_duration_matches_brute_force() {
        let problem = Arc::new(test_utils::create_line_problem_with_duration(
            7, 3.0, 10.0, 9.0, 0.5,
        ));
        let mut split = Split::new(Arc::clone(&problem));
        let mut rng = SmallRng::seed_from_u64(8);
        let penalties = PenaltyWeights::new(4.0, 2.0);

        for _ in 0..5 {
            let mut individual = Individual::random(&problem, &mut rng);
            split.general_split(&mut individual, problem.nb_vehicles(), &penalties);

            let expected = brute_force_cost(
                &problem,
                individual.chromosome(),
                &penalties,
                problem.nb_vehicles(),
            );
            assert!((individual.penalized_cost() - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_limited_fleet() {
        // Excess is cheap, so few long routes are preferred
        let problem = Arc::new(test_utils::create_line_problem(6, 10.0, 10.0));
        let mut split = Split::new(Arc::clone(&problem));
        let penalties = PenaltyWeights::new(0.1, 1.0);

        let mut unlimited = Individual::new(&problem);
        split.general_split(&mut unlimited, problem.nb_vehicles(), &penalties);
        assert!(unlimited.nb_routes() <= problem.nb_vehicles());

        // The lower bound of 6 vehicles always applies
        let mut individual = Individual::new(&problem);
        split.general_split(&mut individual, 1, &penalties);
        assert!(individual.nb_routes() <= 6);
        assert_eq!(
            individual.routes().iter().flatten().copied().collect::<Vec<_>>(),
            individual.chromosome()
        );
    }

    #[test]
    fn test_limited_fleet_matches_brute_force() {
        // Capacity never binds, random tours are cheaper with several returns to the depot
        let problem = Arc::new(test_utils::create_random_problem(9, 1000.0, 4));
        let mut split = Split::new(Arc::clone(&problem));
        let mut rng = SmallRng::seed_from_u64(9);
        let penalties = PenaltyWeights::new(1.0, 1.0);

        for max_routes in [1, 2] {
            for _ in 0..5 {
                let mut individual = Individual::random(&problem, &mut rng);
                split.general_split(&mut individual, max_routes, &penalties);

                assert!(individual.nb_routes() <= max_routes);
                let expected =
                    brute_force_cost(&problem, individual.chromosome(), &penalties, max_routes);
                assert!((individual.penalized_cost() - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let problem = Arc::new(test_utils::create_random_problem(30, 40.0, 2));
        let mut split = Split::new(Arc::clone(&problem));
        let mut rng = SmallRng::seed_from_u64(1);
        let penalties = PenaltyWeights::new(10.0, 1.0);

        let mut individual = Individual::random(&problem, &mut rng);
        split.general_split(&mut individual, 3, &penalties);
        let first = *individual.evaluation();
        let first_routes = individual.routes().to_vec();

        split.general_split(&mut individual, 3, &penalties);
        assert_eq!(*individual.evaluation(), first);
        assert_eq!(individual.routes(), first_routes.as_slice());
    }
}
