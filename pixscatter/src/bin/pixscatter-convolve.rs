use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use pixscatter::filter::KernelName;
use pixscatter::{Boundary, ConvolveOptions, Extraction, LaunchConfig, Mapping, cli, convolve_file, run_world};

/// Convolve one channel of a bitmap across a world of ranks
///
/// Ranks are processes started by `mpirun -np N` (with the `mpi` feature)
/// or threads, chosen by PIXSCATTER_TRANSPORT (`mpi` or `threads`); the
/// thread count is PIXSCATTER_WORLD_SIZE (default 1).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bitmap to read
    input: PathBuf,

    /// Bitmap to write
    output: PathBuf,

    /// Number of convolution passes
    #[arg(short, long, default_value_t = 1)]
    iterations: u32,

    /// Catalog kernel: identity, sobel-x, sobel-y, laplacian1, laplacian2,
    /// laplacian3 or gaussian
    #[arg(short, long, default_value_t = KernelName::Laplacian1)]
    kernel: KernelName,

    /// How a pixel becomes one sample: average, red, green or blue
    #[arg(short, long, default_value_t = Extraction::Average)]
    extract: Extraction,

    /// How a sample goes back into a pixel: equal, red, green or blue
    #[arg(short, long, default_value_t = Mapping::Equal)]
    map: Mapping,

    /// Exchange neighbour rows between ranks before every pass, so the
    /// result does not depend on the number of ranks
    #[arg(long)]
    halo: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn run(args: &Args) -> Result<()> {
    let config = LaunchConfig::from_env().context("reading launch settings")?;
    let options = ConvolveOptions {
        iterations: args.iterations,
        kernel: args.kernel,
        extraction: args.extract,
        mapping: args.map,
        boundary: if args.halo {
            Boundary::Halo
        } else {
            Boundary::Partition
        },
    };
    run_world(&config, |comm| {
        convolve_file(comm, &args.input, &args.output, &options)
    })
    .with_context(|| format!("convolving {}", args.input.display()))
}

fn main() -> ExitCode {
    let args: Args = cli::parse_args();
    cli::init_logger(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pixscatter-convolve: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
