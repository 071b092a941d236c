pub mod crossover;
pub mod genetic;
pub mod individual;
pub mod ls;
pub mod penalty;
pub mod population;
pub mod solver_params;
pub mod split;
pub mod statistics;
