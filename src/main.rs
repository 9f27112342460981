use std::fs::File;
use std::{fmt::Debug, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsp_anneal::anneal::{Annealer, CoolingSchedule, Problem};

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    /// File holding the city count followed by one "<name> <x> <y>" line per city
    input: PathBuf,

    /// Cooling schedule: 1 (linear), 2 (geometric) or 3 (inverse-iteration)
    schedule: CoolingSchedule,

    /// Seed for a reproducible run
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let input = File::open(&args.input)
        .with_context(|| format!("Cannot open {}", args.input.display()))?;
    let problem = Problem::try_from_file(input)
        .with_context(|| format!("Invalid input in {}", args.input.display()))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let now = std::time::Instant::now();
    let tour = Annealer::default().solve(&problem.points, args.schedule, &mut rng)?;
    info!(elapsed = ?now.elapsed(), cost = tour.cost(), "annealing done");

    println!("{}", tour);

    Ok(())
}
