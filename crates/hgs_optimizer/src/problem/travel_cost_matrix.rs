use serde::{Deserialize, Serialize};

use super::client::Client;

pub type Distance = f64;

/// This matrix use a flat structure to store travel costs between locations.
/// To find the index for a pair of locations, use the formula:
/// `index = from * num_locations + to`, where `num_locations` is the total
/// number of locations, depot included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelCostMatrix {
    costs: Vec<Distance>,
    num_locations: usize,
    is_symmetric: bool,
}

fn is_flat_matrix_symmetric(matrix: &[f64], num_locations: usize) -> bool {
    for i in 0..num_locations {
        for j in (i + 1)..num_locations {
            if matrix[i * num_locations + j] != matrix[j * num_locations + i] {
                return false;
            }
        }
    }
    true
}

impl TravelCostMatrix {
    /// Builds the matrix from rows. Every row must have as many entries as there are rows.
    pub fn from_rows(rows: Vec<Vec<Distance>>) -> Option<Self> {
        let num_locations = rows.len();
        if rows.iter().any(|row| row.len() != num_locations) {
            return None;
        }

        let costs: Vec<Distance> = rows.into_iter().flatten().collect();
        let is_symmetric = is_flat_matrix_symmetric(&costs, num_locations);

        Some(TravelCostMatrix {
            costs,
            num_locations,
            is_symmetric,
        })
    }

    pub fn from_euclidean(clients: &[Client], round: bool) -> Self {
        let num_locations = clients.len();
        let mut costs: Vec<Distance> = vec![0.0; num_locations * num_locations];

        for (i, from) in clients.iter().enumerate() {
            for (j, to) in clients.iter().enumerate() {
                costs[i * num_locations + j] = if round {
                    from.euclidean_distance(to).round()
                } else {
                    from.euclidean_distance(to)
                }
            }
        }

        TravelCostMatrix {
            costs,
            num_locations,
            is_symmetric: true,
        }
    }

    #[inline(always)]
    fn index(&self, from: usize, to: usize) -> usize {
        from * self.num_locations + to
    }

    #[inline(always)]
    pub fn cost(&self, from: usize, to: usize) -> Distance {
        self.costs[self.index(from, to)]
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }

    pub fn is_symmetric(&self) -> bool {
        self.is_symmetric
    }

    pub fn max_cost(&self) -> Distance {
        self.costs.iter().copied().fold(0.0, f64::max)
    }
}
