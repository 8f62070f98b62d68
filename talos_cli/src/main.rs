use std::{fs::File, io::BufReader, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use talos_optimizer::{
    json::{solution::JsonSolution, types::JsonProblem},
    solver::solver_params::SolverParams,
};

/// Solve a multi-worker task routing problem described by a JSON document.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Path to the problem document.
    input: PathBuf,

    /// Pretty-print the solution document.
    #[arg(long)]
    pretty: bool,

    /// Fixed seed for the work-simulation RNG, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("LOG_LEVEL"))
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let file = File::open(&cli.input)?;
    let document: JsonProblem = serde_json::from_reader(BufReader::new(file))?;

    let problem = document.build_problem()?;
    let itinerary = talos_optimizer::solve(
        &problem,
        &SolverParams {
            seed: cli.seed,
            ..SolverParams::default()
        },
    )?;

    let solution = JsonSolution::from_itinerary(&problem, &itinerary);
    if cli.pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &solution)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), &solution)?;
    }
    println!();

    Ok(())
}
