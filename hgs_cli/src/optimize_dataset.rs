use std::{path::PathBuf, sync::Arc, thread, time::Duration};

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use hgs_optimizer::{
    export::write_cvrplib_solution,
    parsers::{
        cvrplib::{CVRPLibParser, parse_solution_file},
        parser::DatasetParser,
    },
    solver::{
        genetic::Genetic, population::evolve_population::EvolvePopulation,
        solver_params::SolverParams,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use jiff::Timestamp;
use tracing::info;

use crate::{
    file_utils::{instance_name, read_folder, solution_path},
    parsers,
};

#[derive(Args)]
pub struct OptimizeDatasetArgs {
    /// A .vrp file or a folder of .vrp files
    #[arg(short, long)]
    dataset: PathBuf,

    #[arg(short, long, value_parser=parsers::parse_duration, default_value = "5s")]
    time_limit: jiff::SignedDuration,

    /// Maximum number of iterations without improvement before a restart
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output folder for .sol files
    #[arg(short, long)]
    output: Option<PathBuf>,
}

struct DatasetRow {
    instance: String,
    routes: Option<usize>,
    cost: Option<f64>,
    best_known: Option<f64>,
    seconds: f64,
}

impl DatasetRow {
    fn gap(&self) -> Option<f64> {
        match (self.cost, self.best_known) {
            (Some(cost), Some(best_known)) if best_known > 0.0 => {
                Some((cost - best_known) / best_known * 100.0)
            }
            _ => None,
        }
    }
}

pub fn run(args: OptimizeDatasetArgs) -> Result<(), anyhow::Error> {
    info!("Optimizing dataset {:?}", args.dataset);
    let paths = if args.dataset.is_file() {
        vec![args.dataset.clone()]
    } else {
        read_folder(&args.dataset)?
    };

    if let Some(output) = &args.output {
        std::fs::create_dir_all(output)?;
    }

    let mut rows = Vec::with_capacity(paths.len());
    for path in paths {
        let name = instance_name(&path);
        let started_at = Timestamp::now();
        let problem = CVRPLibParser::default().parse(&path)?;

        let params = SolverParams {
            time_limit: Some(args.time_limit),
            nb_iter: args.iterations.unwrap_or(SolverParams::default().nb_iter),
            seed: args.seed,
            verbose: false,
            ..SolverParams::default()
        };
        let mut genetic = Genetic::with_start(Arc::new(problem), params, started_at)?;

        let seconds = args.time_limit.as_secs();
        let bar = Arc::new(ProgressBar::new(seconds as u64));
        bar.set_prefix(name.clone());
        bar.enable_steady_tick(Duration::from_secs(1));
        bar.set_style(ProgressStyle::default_bar().template("{prefix} [{bar:40}] ({elapsed}/{len}s)")?);

        let t_bar = Arc::clone(&bar);
        let ticker = thread::spawn(move || {
            for i in 0..seconds {
                t_bar.set_position(i as u64);
                thread::sleep(Duration::from_secs(1));
            }
        });

        genetic.run();

        bar.finish_and_clear();
        ticker
            .join()
            .map_err(|_| anyhow::anyhow!("Progress bar thread panicked"))?;

        let best = genetic.population().best_found();
        if let (Some(best), Some(output)) = (best, &args.output) {
            write_cvrplib_solution(best, output.join(format!("{name}.sol")))?;
        }

        let row = DatasetRow {
            instance: name,
            routes: best.map(|best| best.nb_routes()),
            cost: best.map(|best| best.penalized_cost()),
            best_known: parse_solution_file(solution_path(&path)),
            seconds: genetic.statistics().elapsed.as_secs_f64(),
        };
        info!(
            instance = %row.instance,
            cost = ?row.cost,
            gap = ?row.gap(),
            "Instance optimized"
        );
        rows.push(row);
    }

    println!("{}", summary_table(&rows));

    Ok(())
}

fn summary_table(rows: &[DatasetRow]) -> Table {
    let format_option = |value: Option<f64>, precision: usize| {
        value.map_or_else(|| String::from("-"), |value| format!("{value:.precision$}"))
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Instance", "Routes", "Cost", "BKS", "Gap (%)", "Time (s)"]);

    for row in rows {
        table.add_row(vec![
            row.instance.clone(),
            row.routes
                .map_or_else(|| String::from("-"), |routes| routes.to_string()),
            format_option(row.cost, 0),
            format_option(row.best_known, 0),
            format_option(row.gap(), 2),
            format!("{:.1}", row.seconds),
        ]);
    }

    let gaps: Vec<f64> = rows.iter().filter_map(DatasetRow::gap).collect();
    if !gaps.is_empty() {
        let average = gaps.iter().sum::<f64>() / gaps.len() as f64;
        table.add_row(vec![
            String::from("Average"),
            String::new(),
            String::new(),
            String::new(),
            format!("{average:.2}"),
            String::new(),
        ]);
    }

    table
}
