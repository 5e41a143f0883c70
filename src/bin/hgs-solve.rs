//! Command-line runner: solves a JSON instance and prints the best solution.

use clap::Parser;
use hgs_core::config::Config;
use hgs_core::error::{HgsError, Result};
use hgs_core::problem::Problem;
use hgs_core::utils::{export_cvrplib_format, export_search_progress};
use hgs_core::HgsAlgorithm;
use log::{error, info};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instance file in JSON format
    instance: PathBuf,

    /// Algorithm configuration in JSON format; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Time limit in seconds; enables restarts
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Iterations without improvement before stopping or restarting
    #[arg(short = 'i', long)]
    iterations: Option<usize>,

    /// Write the best solution in CVRPLIB format to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the search progress to this file
    #[arg(long)]
    progress: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Converts a time limit in seconds; negative, infinite and NaN values are rejected.
fn time_limit(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| HgsError::InvalidConfig(format!("invalid time limit {}: {}", secs, e)))
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(secs) = args.time_limit {
        config = config.with_time_limit(time_limit(secs)?);
    }
    if let Some(iterations) = args.iterations {
        config = config.with_num_iters(iterations);
    }
    Ok(config)
}

fn solve(args: &Args) -> Result<()> {
    let problem = Problem::from_json_file(&args.instance)?;
    let config = load_config(args)?;
    let seed = config.seed;
    info!("loaded {} with {} clients", problem.name, problem.get_client_count());

    let mut algorithm = HgsAlgorithm::new(problem, config)?;
    let solution = algorithm.run()?;

    println!("{:?}", solution);
    println!("{}", algorithm.statistics().format());

    if let Some(path) = &args.output {
        export_cvrplib_format(&solution, path)?;
        info!("solution written to {}", path.display());
    }
    if let Some(path) = &args.progress {
        export_search_progress(&algorithm.progress, &algorithm.problem.name, seed, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match solve(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
