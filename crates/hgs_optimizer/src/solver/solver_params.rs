use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// Parameters of the hybrid genetic search.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Size of the granular neighborhood explored by the local search.
    pub nb_granular: usize,
    /// Minimum size of each subpopulation.
    pub mu: usize,
    /// Number of offspring accumulated before survivors selection.
    pub lambda: usize,
    /// Number of elite individuals protected by the biased fitness.
    pub nb_elite: usize,
    /// Number of closest individuals used to measure diversity.
    pub nb_close: usize,
    /// Target share of feasible individuals after local search.
    pub target_feasible: f64,
    pub seed: u64,
    /// Maximum number of iterations without improvement.
    ///
    /// Ends the search when no time limit is set, triggers a restart otherwise.
    pub nb_iter: usize,
    /// Wall-clock limit on the whole search, including the initial population,
    /// counted from the start time given to `Genetic::with_start`.
    pub time_limit: Option<SignedDuration>,
    pub nb_iter_penalty_management: usize,
    pub nb_iter_traces: usize,
    pub penalty_increase: f64,
    pub penalty_decrease: f64,
    pub verbose: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            nb_granular: 20,
            mu: 25,
            lambda: 40,
            nb_elite: 4,
            nb_close: 5,
            target_feasible: 0.2,
            seed: 0,
            nb_iter: 20_000,
            time_limit: None,
            nb_iter_penalty_management: 100,
            nb_iter_traces: 500,
            penalty_increase: 1.2,
            penalty_decrease: 0.85,
            verbose: true,
        }
    }
}

fn invalid(name: &'static str, reason: &str) -> SolverError {
    SolverError::InvalidParameter {
        name,
        reason: reason.to_owned(),
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.nb_granular == 0 {
            return Err(invalid("nb_granular", "must be at least 1"));
        }
        if self.mu == 0 {
            return Err(invalid("mu", "must be at least 1"));
        }
        if self.nb_close == 0 {
            return Err(invalid("nb_close", "must be at least 1"));
        }
        if self.nb_iter == 0 {
            return Err(invalid("nb_iter", "must be at least 1"));
        }
        if self.nb_iter_penalty_management == 0 {
            return Err(invalid("nb_iter_penalty_management", "must be at least 1"));
        }
        if self.nb_iter_traces == 0 {
            return Err(invalid("nb_iter_traces", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.target_feasible) {
            return Err(invalid("target_feasible", "must be within [0, 1]"));
        }
        if self.penalty_increase.is_nan() || self.penalty_increase < 1.0 {
            return Err(invalid("penalty_increase", "must be at least 1"));
        }
        if !(self.penalty_decrease > 0.0 && self.penalty_decrease <= 1.0) {
            return Err(invalid("penalty_decrease", "must be within (0, 1]"));
        }
        if self
            .time_limit
            .is_some_and(|time_limit| !time_limit.is_positive())
        {
            return Err(invalid("time_limit", "must be positive"));
        }

        Ok(())
    }

    /// Number of individuals created by the initial population.
    pub fn initial_population_size(&self) -> usize {
        4 * self.mu
    }

    /// Size at which survivors selection is triggered.
    pub fn max_subpopulation_size(&self) -> usize {
        self.mu + self.lambda
    }
}
