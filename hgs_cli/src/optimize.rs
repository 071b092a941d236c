use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::Args;
use jiff::Timestamp;
use hgs_optimizer::{
    export::{write_cvrplib_solution, write_search_progress},
    parsers::{cvrplib::CVRPLibParser, parser::DatasetParser},
    solver::{
        genetic::Genetic, population::evolve_population::EvolvePopulation,
        solver_params::SolverParams,
    },
};
use tracing::{debug, info, warn};

use crate::{file_utils, parsers};

#[derive(Args)]
pub struct OptimizeArgs {
    /// The CVRPLIB instance to optimize
    #[arg(short, long)]
    instance: PathBuf,

    /// Where to write the best solution, the search progress goes to `<solution>.PG.csv`
    #[arg(short, long)]
    solution: Option<PathBuf>,

    /// Timeout for the solver (e.g., "30s", "5m", "PT1H30M", "2.5")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    time_limit: Option<jiff::SignedDuration>,

    /// Maximum number of iterations without improvement
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Fleet size, overriding the instance
    #[arg(long)]
    vehicles: Option<usize>,

    /// Keep fractional euclidean distances
    #[arg(long)]
    no_round: bool,

    /// JSON file of solver parameters, explicit flags take precedence
    #[arg(long)]
    params: Option<PathBuf>,

    /// Disable the population traces
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: OptimizeArgs) -> anyhow::Result<()> {
    let started_at = Timestamp::now();
    let params = solver_params(&args)?;
    let parser = CVRPLibParser {
        round_distances: !args.no_round,
        nb_vehicles: args.vehicles,
    };

    let problem = parser.parse(&args.instance)?;
    info!(
        clients = problem.nb_clients(),
        vehicles = problem.nb_vehicles(),
        capacity = problem.vehicle_capacity(),
        "Loaded {}",
        args.instance.display()
    );

    let seed = params.seed;
    let mut genetic = Genetic::with_start(Arc::new(problem), params, started_at)?;
    genetic.run();

    let population = genetic.population();
    match population.best_found() {
        Some(best) => {
            info!(
                routes = best.nb_routes(),
                cost = best.penalized_cost(),
                iterations = genetic.iterations(),
                restarts = genetic.restarts(),
                "Best solution found"
            );

            if let Some(solution) = &args.solution {
                write_cvrplib_solution(best, solution)?;
                write_search_progress(
                    population.search_progress(),
                    progress_path(solution),
                    &file_utils::instance_name(&args.instance),
                    seed,
                )?;
                info!("Solution written to {}", solution.display());
            }
        }
        None => warn!("No feasible solution found"),
    }

    debug!(
        "Search statistics: {}",
        serde_json::to_string(genetic.statistics())?
    );

    Ok(())
}

fn solver_params(args: &OptimizeArgs) -> anyhow::Result<SolverParams> {
    let mut params = match &args.params {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid solver parameters in {}", path.display()))?
        }
        None => SolverParams::default(),
    };

    if args.time_limit.is_some() {
        params.time_limit = args.time_limit;
    }
    if let Some(iterations) = args.iterations {
        params.nb_iter = iterations;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if args.quiet {
        params.verbose = false;
    }

    Ok(params)
}

fn progress_path(solution: &Path) -> PathBuf {
    let mut path = solution.as_os_str().to_owned();
    path.push(".PG.csv");
    PathBuf::from(path)
}
