use rand::rngs::SmallRng;

use crate::solver::{individual::Individual, penalty::PenaltyWeights};

pub trait ImproveIndividual {
    /// Moves `individual` toward a local optimum of its distance plus penalties
    /// weighted by `penalties`, then re-evaluates it with those weights.
    fn run(&mut self, individual: &mut Individual, penalties: &PenaltyWeights, rng: &mut SmallRng);
}
