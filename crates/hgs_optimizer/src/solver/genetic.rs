use std::sync::Arc;

use jiff::Timestamp;
use rand::{RngCore, SeedableRng, rngs::SmallRng};
use tracing::{debug, info, instrument};

use crate::{
    error::SolverError,
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    timed, timer_debug,
};

use super::{
    crossover::crossover_ox,
    individual::Individual,
    ls::{improve_individual::ImproveIndividual, local_search::LocalSearch},
    population::{evolve_population::EvolvePopulation, population::Population},
    solver_params::SolverParams,
    split::Split,
    statistics::SearchStatistics,
};

/// Hybrid genetic search: crossover, split, local search and population
/// management repeated until the search stagnates or the time runs out.
pub struct Genetic<P = Population, L = LocalSearch> {
    problem: Arc<VehicleRoutingProblem>,
    params: SolverParams,
    started_at: Timestamp,
    rng: SmallRng,
    split: Split,
    local_search: L,
    population: P,
    offspring: Individual,
    statistics: SearchStatistics,
}

impl Genetic {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        params: SolverParams,
    ) -> Result<Self, SolverError> {
        Genetic::with_start(problem, params, Timestamp::now())
    }

    /// Same as [`Genetic::new`] with the time limit counted from `started_at`.
    pub fn with_start(
        problem: Arc<VehicleRoutingProblem>,
        params: SolverParams,
        started_at: Timestamp,
    ) -> Result<Self, SolverError> {
        params.validate()?;

        let local_search = LocalSearch::new(Arc::clone(&problem), params.nb_granular);
        let population = Population::new(Arc::clone(&problem), params.clone(), started_at);

        Genetic::with_components(problem, params, started_at, population, local_search)
    }
}

impl<P: EvolvePopulation, L: ImproveIndividual> Genetic<P, L> {
    /// Wires the loop with the given population and local search.
    pub fn with_components(
        problem: Arc<VehicleRoutingProblem>,
        params: SolverParams,
        started_at: Timestamp,
        population: P,
        local_search: L,
    ) -> Result<Self, SolverError> {
        params.validate()?;

        Ok(Genetic {
            rng: SmallRng::seed_from_u64(params.seed),
            split: Split::new(Arc::clone(&problem)),
            offspring: Individual::new(&problem),
            problem,
            params,
            started_at,
            local_search,
            population,
            statistics: SearchStatistics::default(),
        })
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        &self.problem
    }

    pub fn population(&self) -> &P {
        &self.population
    }

    pub fn local_search(&self) -> &L {
        &self.local_search
    }

    pub fn iterations(&self) -> usize {
        self.statistics.iterations
    }

    pub fn restarts(&self) -> usize {
        self.statistics.restarts
    }

    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    fn time_exhausted(&self) -> bool {
        self.params.time_limit.is_some_and(|time_limit| {
            Timestamp::now().duration_since(self.started_at) >= time_limit
        })
    }

    #[instrument(skip_all, level = "debug")]
    pub fn run(&mut self) {
        timer_debug!(
            "Initial population",
            self.population.generate_population(
                &mut self.split,
                &mut self.local_search,
                &mut self.rng,
            )
        );

        if self.params.verbose {
            info!("----- STARTING GENETIC ALGORITHM");
        }

        let mut iteration = 0;
        let mut iterations_without_improvement = 1;

        while iterations_without_improvement <= self.params.nb_iter && !self.time_exhausted() {
            let penalties = self.population.penalty_weights();

            timed!(self.statistics.crossover, {
                let parent1 = self.population.binary_tournament(&mut self.rng);
                let parent2 = self.population.binary_tournament(&mut self.rng);
                crossover_ox(
                    &mut self.offspring,
                    parent1,
                    parent2,
                    &mut self.split,
                    &penalties,
                    &mut self.rng,
                )
            });

            timed!(
                self.statistics.local_search,
                self.local_search
                    .run(&mut self.offspring, &penalties, &mut self.rng)
            );
            let mut is_new_best = timed!(
                self.statistics.add_individual,
                self.population.add_individual(&self.offspring, true)
            );

            // Repair half of the infeasible offspring
            if !self.offspring.is_feasible() && self.rng.next_u32() % 2 == 0 {
                let repair_penalties = penalties.scaled(10.0);
                timed!(
                    self.statistics.local_search,
                    self.local_search
                        .run(&mut self.offspring, &repair_penalties, &mut self.rng)
                );
                if self.offspring.is_feasible() {
                    is_new_best |= timed!(
                        self.statistics.add_individual,
                        self.population.add_individual(&self.offspring, false)
                    );
                }
            }

            if is_new_best {
                iterations_without_improvement = 1;
            } else {
                iterations_without_improvement += 1;
            }

            if iteration % self.params.nb_iter_penalty_management == 0 {
                self.population.manage_penalties();
            }
            if iteration % self.params.nb_iter_traces == 0 {
                self.population
                    .print_state(iteration, iterations_without_improvement);
            }

            if self.params.time_limit.is_some() && iterations_without_improvement == self.params.nb_iter
            {
                self.population.restart(
                    &mut self.split,
                    &mut self.local_search,
                    &mut self.rng,
                );
                iterations_without_improvement = 1;
                self.statistics.restarts += 1;
            }

            iteration += 1;
        }

        self.statistics.iterations = iteration;
        self.statistics.elapsed = Timestamp::now().duration_since(self.started_at);

        if self.params.verbose {
            info!(
                "----- GENETIC ALGORITHM FINISHED AFTER {} ITERATIONS. TIME SPENT: {:.2}",
                iteration,
                self.statistics.elapsed.as_secs_f64()
            );
        }
        debug!(
            crossover = ?self.statistics.crossover,
            local_search = ?self.statistics.local_search,
            add_individual = ?self.statistics.add_individual,
            restarts = self.statistics.restarts,
            "Time spent per phase"
        );
    }
}
