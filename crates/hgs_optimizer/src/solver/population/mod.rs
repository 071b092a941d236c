pub mod evolve_population;
#[allow(clippy::module_inception)]
pub mod population;
mod subpopulation;
