use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use pixscatter::{LaunchConfig, cli, invert_file, run_world};

/// Invert every pixel of a bitmap across a world of ranks
///
/// Ranks are processes started by `mpirun -np N` (with the `mpi` feature)
/// or threads, chosen by PIXSCATTER_TRANSPORT (`mpi` or `threads`); the
/// thread count is PIXSCATTER_WORLD_SIZE (default 1).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bitmap to read
    #[arg(long, default_value = "before.bmp")]
    input: PathBuf,

    /// Bitmap to write
    #[arg(long, default_value = "after.bmp")]
    output: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn run(args: &Args) -> Result<()> {
    let config = LaunchConfig::from_env().context("reading launch settings")?;
    run_world(&config, |comm| invert_file(comm, &args.input, &args.output))
        .with_context(|| format!("inverting {}", args.input.display()))
}

fn main() -> ExitCode {
    let args: Args = cli::parse_args();
    cli::init_logger(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pixscatter-invert: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
