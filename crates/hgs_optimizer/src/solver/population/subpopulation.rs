use std::cell::Cell;

use crate::{
    solver::{individual::Individual, penalty::PenaltyWeights},
    utils::broken_pairs_distance::broken_pairs_distance,
};

/// Below this distance, two members are considered clones.
const CLONE_DISTANCE: f64 = 1e-5;
const COST_EPSILON: f64 = 1e-5;

pub(crate) struct Member {
    id: u64,
    individual: Individual,
    /// Distance to every other member, increasing.
    proximity: Vec<(f64, u64)>,
    biased_fitness: Cell<f64>,
}

impl Member {
    pub fn individual(&self) -> &Individual {
        &self.individual
    }

    pub fn biased_fitness(&self) -> f64 {
        self.biased_fitness.get()
    }

    /// Average distance to the `nb_closest` nearest members.
    pub fn average_distance_closest(&self, nb_closest: usize) -> f64 {
        let count = nb_closest.min(self.proximity.len());
        if count == 0 {
            return 0.0;
        }

        self.proximity[..count]
            .iter()
            .map(|&(distance, _)| distance)
            .sum::<f64>()
            / count as f64
    }

    fn is_clone(&self) -> bool {
        self.average_distance_closest(1) < CLONE_DISTANCE
    }
}

/// Members sorted by increasing penalized cost, with the broken-pairs
/// distances between every pair of them.
pub(crate) struct Subpopulation {
    members: Vec<Member>,
    nb_close: usize,
    nb_elite: usize,
    fitness_stale: Cell<bool>,
}

impl Subpopulation {
    pub fn new(nb_close: usize, nb_elite: usize) -> Self {
        Subpopulation {
            members: Vec::new(),
            nb_close,
            nb_elite,
            fitness_stale: Cell::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn best(&self) -> Option<&Individual> {
        self.members.first().map(Member::individual)
    }

    pub fn insert(&mut self, id: u64, individual: Individual) {
        let mut proximity = Vec::with_capacity(self.members.len());
        for member in &mut self.members {
            let distance = broken_pairs_distance(&individual, &member.individual);
            let position = member
                .proximity
                .partition_point(|&(other, _)| other <= distance);
            member.proximity.insert(position, (distance, id));
            proximity.push((distance, member.id));
        }
        proximity.sort_by(|a, b| a.0.total_cmp(&b.0));

        let cost = individual.penalized_cost();
        let mut position = self.members.len();
        while position > 0
            && self.members[position - 1].individual.penalized_cost() > cost - COST_EPSILON
        {
            position -= 1;
        }

        self.members.insert(
            position,
            Member {
                id,
                individual,
                proximity,
                biased_fitness: Cell::new(0.0),
            },
        );
        self.fitness_stale.set(true);
    }

    /// Evicts members of worst biased fitness until `target_size` remain.
    pub fn select_survivors(&mut self, target_size: usize) {
        while self.members.len() > target_size.max(1) {
            self.remove_worst_biased_fitness();
        }
    }

    /// Clones go first; the cost-best member is never evicted.
    fn remove_worst_biased_fitness(&mut self) {
        self.update_biased_fitness();

        let mut worst: Option<(usize, bool, f64)> = None;
        for (index, member) in self.members.iter().enumerate().skip(1) {
            let is_clone = member.is_clone();
            let fitness = member.biased_fitness();
            let is_worse = match worst {
                None => true,
                Some((_, worst_is_clone, worst_fitness)) => {
                    (is_clone && !worst_is_clone)
                        || (is_clone == worst_is_clone && fitness > worst_fitness)
                }
            };
            if is_worse {
                worst = Some((index, is_clone, fitness));
            }
        }

        if let Some((index, _, _)) = worst {
            let removed = self.members.remove(index);
            for member in &mut self.members {
                member.proximity.retain(|&(_, id)| id != removed.id);
            }
            self.fitness_stale.set(true);
        }
    }

    /// Ranks members by cost and by diversity contribution and blends both ranks.
    pub fn update_biased_fitness(&self) {
        let nb_members = self.members.len();
        if nb_members == 1 {
            self.members[0].biased_fitness.set(0.0);
        } else if nb_members > 1 {
            let mut ranking: Vec<(f64, usize)> = self
                .members
                .iter()
                .enumerate()
                .map(|(index, member)| (-member.average_distance_closest(self.nb_close), index))
                .collect();
            ranking.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let last_rank = (nb_members - 1) as f64;
            for (diversity_rank, &(_, cost_rank)) in ranking.iter().enumerate() {
                let div_rank = diversity_rank as f64 / last_rank;
                let fit_rank = cost_rank as f64 / last_rank;
                let fitness = if nb_members <= self.nb_elite {
                    fit_rank
                } else {
                    fit_rank + (1.0 - self.nb_elite as f64 / nb_members as f64) * div_rank
                };
                self.members[cost_rank].biased_fitness.set(fitness);
            }
        }

        self.fitness_stale.set(false);
    }

    pub fn refresh_biased_fitness(&self) {
        if self.fitness_stale.get() {
            self.update_biased_fitness();
        }
    }

    /// Re-weights every member with `penalties` and restores cost order.
    pub fn reprice(&mut self, penalties: &PenaltyWeights) {
        for member in &mut self.members {
            member.individual.update_penalized_cost(penalties);
        }
        self.members.sort_by(|a, b| {
            a.individual
                .penalized_cost()
                .total_cmp(&b.individual.penalized_cost())
        });
        self.fitness_stale.set(true);
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.fitness_stale.set(false);
    }

    /// Average penalized cost of the `nb_best` first members, `None` when empty.
    pub fn average_cost(&self, nb_best: usize) -> Option<f64> {
        let count = nb_best.min(self.members.len());
        (count > 0).then(|| {
            self.members[..count]
                .iter()
                .map(|member| member.individual.penalized_cost())
                .sum::<f64>()
                / count as f64
        })
    }

    /// Average distance between the `nb_best` first members and their nearest ones.
    pub fn diversity(&self, nb_best: usize) -> Option<f64> {
        let count = nb_best.min(self.members.len());
        (count > 0).then(|| {
            self.members[..count]
                .iter()
                .map(|member| member.average_distance_closest(count))
                .sum::<f64>()
                / count as f64
        })
    }
}
