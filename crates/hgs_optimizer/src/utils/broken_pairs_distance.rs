use crate::solver::individual::Individual;

/// Share of clients whose adjacency in `a` is not found in `b`, either way round.
///
/// A client starting a route in `a` but sitting inside a route of `b` also
/// counts as a difference. Returns a value in `[0, 2]`.
pub fn broken_pairs_distance(a: &Individual, b: &Individual) -> f64 {
    let nb_clients = a.successors.len() - 1;
    let mut differences = 0;

    for client in 1..=nb_clients {
        if a.successors[client] != b.successors[client]
            && a.successors[client] != b.predecessors[client]
        {
            differences += 1;
        }
        if a.predecessors[client] == 0
            && b.predecessors[client] != 0
            && b.successors[client] != 0
        {
            differences += 1;
        }
    }

    differences as f64 / nb_clients as f64
}

#[cfg(test)]
mod tests {
    use crate::{
        solver::{individual::Individual, penalty::PenaltyWeights},
        test_utils,
    };

    use super::*;

    #[test]
    fn test_broken_pairs_distance() {
        let problem = test_utils::create_line_problem(6, 1.0, 100.0);
        let penalties = PenaltyWeights::new(1.0, 1.0);

        let a = Individual::from_routes(&problem, vec![vec![1, 2, 3], vec![4, 5, 6]], &penalties);
        let reversed =
            Individual::from_routes(&problem, vec![vec![6, 5, 4], vec![3, 2, 1]], &penalties);
        let other =
            Individual::from_routes(&problem, vec![vec![1, 2], vec![3, 4, 5, 6]], &penalties);

        assert_eq!(broken_pairs_distance(&a, &a), 0.0);
        assert_eq!(broken_pairs_distance(&a, &reversed), 0.0);

        // 2 -> 3 is broken and 4 starts a route only in `a`
        assert!((broken_pairs_distance(&a, &other) - 2.0 / 6.0).abs() < 1e-12);
    }
}
