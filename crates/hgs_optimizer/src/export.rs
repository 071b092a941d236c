use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context;

use crate::solver::{individual::Individual, population::population::SearchProgress};

/// Writes the routes of `individual` in the CVRPLIB solution format.
///
/// ```text
/// Route #1: 3 1 2
/// Route #2: 4 5
/// Cost 784
/// ```
pub fn write_cvrplib_solution<P: AsRef<Path>>(
    individual: &Individual,
    path: P,
) -> Result<(), anyhow::Error> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_solution(individual, &mut writer)?;
    writer.flush()?;

    Ok(())
}

fn write_solution<W: Write>(individual: &Individual, writer: &mut W) -> std::io::Result<()> {
    for (index, route) in individual.non_empty_routes().enumerate() {
        write!(writer, "Route #{}:", index + 1)?;
        for client in route {
            write!(writer, " {client}")?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "Cost {}", individual.penalized_cost())
}

/// Writes one `instance;seed;cost;seconds` line per improvement.
pub fn write_search_progress<P: AsRef<Path>>(
    progress: &[SearchProgress],
    path: P,
    instance_name: &str,
    seed: u64,
) -> Result<(), anyhow::Error> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_progress(progress, &mut writer, instance_name, seed)?;
    writer.flush()?;

    Ok(())
}

fn write_progress<W: Write>(
    progress: &[SearchProgress],
    writer: &mut W,
    instance_name: &str,
    seed: u64,
) -> std::io::Result<()> {
    for row in progress {
        writeln!(
            writer,
            "{};{};{};{:.2}",
            instance_name,
            seed,
            row.cost,
            row.elapsed.as_secs_f64()
        )?;
    }

    Ok(())
}
