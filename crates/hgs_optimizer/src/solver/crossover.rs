use rand::Rng;

use super::{individual::Individual, penalty::PenaltyWeights, split::Split};

/// Cyclic range of chromosome positions inherited from the first parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverSegment {
    pub start: usize,
    pub end: usize,
}

impl CrossoverSegment {
    /// Draws two distinct positions uniformly, `end` being resampled until it differs from `start`.
    pub fn draw<R: Rng + ?Sized>(nb_clients: usize, rng: &mut R) -> Self {
        assert!(
            nb_clients >= 2,
            "Order crossover needs at least two clients, got {nb_clients}"
        );

        let start = rng.random_range(0..nb_clients);
        let mut end = rng.random_range(0..nb_clients);
        while end == start {
            end = rng.random_range(0..nb_clients);
        }

        CrossoverSegment { start, end }
    }

    /// Number of positions covered, wrapping around the end of the chromosome.
    ///
    /// A segment ending right before its start covers nothing.
    pub fn len(&self, nb_clients: usize) -> usize {
        (self.end + 1 + nb_clients - self.start) % nb_clients
    }

    pub fn contains(&self, position: usize, nb_clients: usize) -> bool {
        (position + nb_clients - self.start) % nb_clients < self.len(nb_clients)
    }
}

/// Order crossover (OX) on raw chromosomes.
///
/// ```text
/// parent1:  1 [2 3 4 5] 6        segment start = 1, end = 4
/// parent2:  6  5 4 3 2  1        scanned from end + 1: 1 6 5 4 3 2
/// result:   6 [2 3 4 5] 1        free positions filled from end + 1
/// ```
pub fn order_crossover(
    result: &mut [usize],
    parent1: &[usize],
    parent2: &[usize],
    segment: CrossoverSegment,
) {
    let nb_clients = parent1.len();
    let mut inherited = vec![false; nb_clients + 1];

    let mut position = segment.start;
    for _ in 0..segment.len(nb_clients) {
        let index = position % nb_clients;
        result[index] = parent1[index];
        inherited[result[index]] = true;
        position += 1;
    }

    for offset in 1..=nb_clients {
        let client = parent2[(segment.end + offset) % nb_clients];
        if !inherited[client] {
            result[position % nb_clients] = client;
            position += 1;
        }
    }
}

/// Writes the OX child of both parents into `result` and decodes it with a
/// target of as many routes as `parent1` uses.
pub fn crossover_ox<R: Rng + ?Sized>(
    result: &mut Individual,
    parent1: &Individual,
    parent2: &Individual,
    split: &mut Split,
    penalties: &PenaltyWeights,
    rng: &mut R,
) -> CrossoverSegment {
    let segment = CrossoverSegment::draw(parent1.chromosome.len(), rng);
    order_crossover(
        &mut result.chromosome,
        &parent1.chromosome,
        &parent2.chromosome,
        segment,
    );

    split.general_split(result, parent1.nb_routes(), penalties);

    segment
}
