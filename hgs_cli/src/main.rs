use clap::{Parser, Subcommand};

#[cfg(not(feature = "dhat-heap"))]
use mimalloc::MiMalloc;

use crate::{optimize::OptimizeArgs, optimize_dataset::OptimizeDatasetArgs};

mod file_utils;
mod optimize;
mod optimize_dataset;
mod parsers;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[cfg(not(feature = "dhat-heap"))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solves a single CVRPLIB instance
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },
    /// Solves every instance of a folder and compares with the best known solutions
    OptimizeDataset {
        #[command(flatten)]
        args: OptimizeDatasetArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Optimize { args } => optimize::run(args)?,
        Commands::OptimizeDataset { args } => optimize_dataset::run(args)?,
    }

    Ok(())
}
