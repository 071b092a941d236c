use serde::Serialize;

use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

pub const MIN_PENALTY: f64 = 0.1;
pub const MAX_PENALTY: f64 = 100_000.0;

/// Weights turning constraint violations into objective cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PenaltyWeights {
    pub capacity: f64,
    pub duration: f64,
}

impl PenaltyWeights {
    pub fn new(capacity: f64, duration: f64) -> Self {
        PenaltyWeights { capacity, duration }
    }

    pub fn initial(problem: &VehicleRoutingProblem) -> Self {
        PenaltyWeights {
            capacity: problem.initial_capacity_penalty(),
            duration: 1.0,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        PenaltyWeights {
            capacity: self.capacity * factor,
            duration: self.duration * factor,
        }
    }

    #[inline(always)]
    pub fn penalized_cost(&self, distance: f64, capacity_excess: f64, duration_excess: f64) -> f64 {
        distance + self.capacity * capacity_excess + self.duration * duration_excess
    }
}
