use rand::rngs::SmallRng;

use crate::solver::{
    individual::Individual, ls::improve_individual::ImproveIndividual, penalty::PenaltyWeights,
    split::Split,
};

/// Population protocol driven by the genetic loop.
pub trait EvolvePopulation {
    /// Fills the population with educated random individuals.
    fn generate_population<L: ImproveIndividual>(
        &mut self,
        split: &mut Split,
        local_search: &mut L,
        rng: &mut SmallRng,
    );

    /// Picks two members uniformly and returns the one of lower biased fitness.
    ///
    /// Panics on an empty population.
    fn binary_tournament(&self, rng: &mut SmallRng) -> &Individual;

    /// Inserts a copy of `individual`. Returns true when it is a new best
    /// feasible solution since the last restart.
    fn add_individual(&mut self, individual: &Individual, update_biased_fitness: bool) -> bool;

    fn manage_penalties(&mut self);

    /// Drops every member, keeping only the overall best, and regenerates.
    fn restart<L: ImproveIndividual>(
        &mut self,
        split: &mut Split,
        local_search: &mut L,
        rng: &mut SmallRng,
    );

    fn print_state(&self, iteration: usize, iterations_without_improvement: usize);

    fn best_found(&self) -> Option<&Individual>;

    fn penalty_weights(&self) -> PenaltyWeights;
}
