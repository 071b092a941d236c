use std::{collections::VecDeque, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use rand::{Rng, RngCore, rngs::SmallRng};
use serde::Serialize;
use tracing::info;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        individual::{FEASIBILITY_EPSILON, Individual},
        ls::improve_individual::ImproveIndividual,
        penalty::{MAX_PENALTY, MIN_PENALTY, PenaltyWeights},
        solver_params::SolverParams,
        split::Split,
    },
};

use super::{
    evolve_population::EvolvePopulation,
    subpopulation::{Member, Subpopulation},
};

/// Number of most recent feasibility samples used to adapt penalties.
pub const FEASIBILITY_WINDOW: usize = 100;

const IMPROVEMENT_EPSILON: f64 = 1e-5;

/// A new overall best, found `elapsed` after the solver started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchProgress {
    pub elapsed: SignedDuration,
    pub cost: f64,
}

pub struct Population {
    problem: Arc<VehicleRoutingProblem>,
    params: SolverParams,
    started_at: Timestamp,
    penalties: PenaltyWeights,

    feasible: Subpopulation,
    infeasible: Subpopulation,

    load_feasibility: VecDeque<bool>,
    duration_feasibility: VecDeque<bool>,

    best_since_restart: Option<Individual>,
    best_overall: Option<Individual>,
    search_progress: Vec<SearchProgress>,

    next_id: u64,
}

impl Population {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        params: SolverParams,
        started_at: Timestamp,
    ) -> Self {
        let penalties = PenaltyWeights::initial(&problem);
        let feasible = Subpopulation::new(params.nb_close, params.nb_elite);
        let infeasible = Subpopulation::new(params.nb_close, params.nb_elite);

        Population {
            problem,
            params,
            started_at,
            penalties,
            feasible,
            infeasible,
            load_feasibility: VecDeque::from(vec![true; FEASIBILITY_WINDOW]),
            duration_feasibility: VecDeque::from(vec![true; FEASIBILITY_WINDOW]),
            best_since_restart: None,
            best_overall: None,
            search_progress: Vec::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.feasible.len() + self.infeasible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feasible.is_empty() && self.infeasible.is_empty()
    }

    pub fn feasible_individuals(&self) -> impl Iterator<Item = &Individual> {
        self.feasible.members().iter().map(|member| member.individual())
    }

    pub fn infeasible_individuals(&self) -> impl Iterator<Item = &Individual> {
        self.infeasible.members().iter().map(|member| member.individual())
    }

    pub fn best_since_restart(&self) -> Option<&Individual> {
        self.best_since_restart.as_ref()
    }

    pub fn search_progress(&self) -> &[SearchProgress] {
        &self.search_progress
    }

    /// Share of recent samples that respected the capacity and the duration limit.
    pub fn feasibility_fractions(&self) -> (f64, f64) {
        (
            feasible_fraction(&self.load_feasibility),
            feasible_fraction(&self.duration_feasibility),
        )
    }

    fn elapsed(&self) -> SignedDuration {
        Timestamp::now().duration_since(self.started_at)
    }

    fn time_exhausted(&self) -> bool {
        self.params
            .time_limit
            .is_some_and(|time_limit| self.elapsed() >= time_limit)
    }

    /// Feasible members first, then infeasible ones.
    fn member_at(&self, index: usize) -> &Member {
        if index < self.feasible.len() {
            &self.feasible.members()[index]
        } else {
            &self.infeasible.members()[index - self.feasible.len()]
        }
    }

    fn record_feasibility(&mut self, individual: &Individual) {
        let evaluation = individual.evaluation();
        push_sample(
            &mut self.load_feasibility,
            evaluation.capacity_excess < FEASIBILITY_EPSILON,
        );
        push_sample(
            &mut self.duration_feasibility,
            evaluation.duration_excess < FEASIBILITY_EPSILON,
        );
    }

    fn adjusted_weight(&self, weight: f64, feasible_fraction: f64) -> f64 {
        let target = self.params.target_feasible;
        if feasible_fraction < target - 0.05 && weight < MAX_PENALTY {
            (weight * self.params.penalty_increase).min(MAX_PENALTY)
        } else if feasible_fraction > target + 0.05 && weight > MIN_PENALTY {
            (weight * self.params.penalty_decrease).max(MIN_PENALTY)
        } else {
            weight
        }
    }
}

impl EvolvePopulation for Population {
    fn generate_population<L: ImproveIndividual>(
        &mut self,
        split: &mut Split,
        local_search: &mut L,
        rng: &mut SmallRng,
    ) {
        if self.params.verbose {
            info!("----- BUILDING INITIAL POPULATION");
        }

        for index in 0..self.params.initial_population_size() {
            if index > 0 && self.time_exhausted() {
                break;
            }

            let mut individual = Individual::random(&self.problem, rng);
            split.general_split(&mut individual, self.problem.nb_vehicles(), &self.penalties);
            local_search.run(&mut individual, &self.penalties, rng);
            self.add_individual(&individual, true);

            if !individual.is_feasible() && rng.next_u32() % 2 == 0 {
                local_search.run(&mut individual, &self.penalties.scaled(10.0), rng);
                if individual.is_feasible() {
                    self.add_individual(&individual, false);
                }
            }
        }
    }

    fn binary_tournament(&self, rng: &mut SmallRng) -> &Individual {
        let nb_members = self.len();
        assert!(nb_members > 0, "Binary tournament on an empty population");

        let first = rng.random_range(0..nb_members);
        let second = rng.random_range(0..nb_members);

        self.feasible.refresh_biased_fitness();
        self.infeasible.refresh_biased_fitness();

        let first = self.member_at(first);
        let second = self.member_at(second);
        if first.biased_fitness() < second.biased_fitness() {
            first.individual()
        } else {
            second.individual()
        }
    }

    fn add_individual(&mut self, individual: &Individual, update_biased_fitness: bool) -> bool {
        if update_biased_fitness {
            self.record_feasibility(individual);
        }

        let id = self.next_id;
        self.next_id += 1;

        let subpopulation = if individual.is_feasible() {
            &mut self.feasible
        } else {
            &mut self.infeasible
        };

        subpopulation.insert(id, individual.clone());
        if subpopulation.len() > self.params.max_subpopulation_size() {
            subpopulation.select_survivors(self.params.mu);
        }
        if update_biased_fitness {
            subpopulation.update_biased_fitness();
        }

        let cost = individual.penalized_cost();
        let improves = |best: &Option<Individual>| {
            best.as_ref()
                .is_none_or(|best| cost < best.penalized_cost() - IMPROVEMENT_EPSILON)
        };

        if !individual.is_feasible() || !improves(&self.best_since_restart) {
            return false;
        }

        self.best_since_restart = Some(individual.clone());
        if improves(&self.best_overall) {
            self.best_overall = Some(individual.clone());
            self.search_progress.push(SearchProgress {
                elapsed: self.elapsed(),
                cost,
            });
        }

        true
    }

    fn manage_penalties(&mut self) {
        let (load_fraction, duration_fraction) = self.feasibility_fractions();
        self.penalties = PenaltyWeights::new(
            self.adjusted_weight(self.penalties.capacity, load_fraction),
            self.adjusted_weight(self.penalties.duration, duration_fraction),
        );

        self.infeasible.reprice(&self.penalties);
    }

    fn restart<L: ImproveIndividual>(
        &mut self,
        split: &mut Split,
        local_search: &mut L,
        rng: &mut SmallRng,
    ) {
        if self.params.verbose {
            info!("----- RESET: CREATING A NEW POPULATION -----");
        }

        self.feasible.clear();
        self.infeasible.clear();
        self.best_since_restart = None;

        self.generate_population(split, local_search, rng);
    }

    fn print_state(&self, iteration: usize, iterations_without_improvement: usize) {
        if !self.params.verbose {
            return;
        }

        let mu = self.params.mu;
        let describe = |name: &str, subpopulation: &Subpopulation| match (
            subpopulation.best(),
            subpopulation.average_cost(mu),
        ) {
            (Some(best), Some(average)) => format!(
                "{name} {} {:.2} {:.2}",
                subpopulation.len(),
                best.penalized_cost(),
                average
            ),
            _ => format!("NO-{}", name.to_uppercase()),
        };
        let diversity = |subpopulation: &Subpopulation| subpopulation.diversity(mu).unwrap_or(-1.0);
        let (load_fraction, duration_fraction) = self.feasibility_fractions();

        info!(
            "It {:6} {:6} | T(s) {:.2} | {} | {} | Div {:.2} {:.2} | Feas {:.2} {:.2} | Pen {:.2} {:.2}",
            iteration,
            iterations_without_improvement,
            self.elapsed().as_secs_f64(),
            describe("Feasible", &self.feasible),
            describe("Infeasible", &self.infeasible),
            diversity(&self.feasible),
            diversity(&self.infeasible),
            load_fraction,
            duration_fraction,
            self.penalties.capacity,
            self.penalties.duration,
        );
    }

    fn best_found(&self) -> Option<&Individual> {
        self.best_overall.as_ref()
    }

    fn penalty_weights(&self) -> PenaltyWeights {
        self.penalties
    }
}

fn push_sample(window: &mut VecDeque<bool>, sample: bool) {
    window.push_back(sample);
    if window.len() > FEASIBILITY_WINDOW {
        window.pop_front();
    }
}

fn feasible_fraction(window: &VecDeque<bool>) -> f64 {
    window.iter().filter(|&&sample| sample).count() as f64 / window.len() as f64
}
