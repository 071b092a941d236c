use jiff::SignedDuration;
use serde::Serialize;

/// Counters and time spent per phase of the genetic loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SearchStatistics {
    pub iterations: usize,
    pub restarts: usize,
    pub elapsed: SignedDuration,
    pub crossover: SignedDuration,
    pub local_search: SignedDuration,
    pub add_individual: SignedDuration,
}
