pub mod broken_pairs_distance;
pub mod time;
