//! pixscatter - Distributed row-partitioned raster filtering
//!
//! Runs one of two operations over a fixed world of ranks:
//!
//! - inversion: every pixel component `c` becomes `255 - c`
//! - convolution: a single channel is extracted, convolved with a catalog
//!   kernel one or more times, and mapped back into the pixels
//!
//! Rank 0 loads the input, splits its rows between the ranks, and gathers
//! and saves the result. Ranks are threads ([`comm::LocalWorld`]) or, with
//! the `mpi` feature, processes started by `mpirun`; see [`launch`] for how
//! a world is set up.
//!
//! # Example
//!
//! ```
//! use pixscatter::comm::{Communicator, LocalWorld};
//! use pixscatter::{Pixel, Raster, invert_distributed};
//!
//! let raster = Raster::filled(4, 4, Pixel::new(200, 100, 50)).unwrap();
//! let results = LocalWorld::run(2, |mut comm| {
//!     let input = if comm.rank() == 0 { Some(&raster) } else { None };
//!     invert_distributed(&mut comm, input).unwrap()
//! })
//! .unwrap();
//! let inverted = results[0].as_ref().unwrap();
//! assert_eq!(inverted.get(3, 3), Some(Pixel::new(55, 155, 205)));
//! ```

pub mod cli;
mod error;
pub mod launch;
pub mod pipeline;

pub use error::{PipelineError, PipelineResult};
pub use launch::{LaunchConfig, Transport, run_world};
pub use pipeline::{
    Announcement, Boundary, ConvolveOptions, RunMetadata, abort_run, convolve_distributed,
    convolve_file, invert_distributed, invert_file,
};

// Re-export core types (primary data structures used everywhere)
pub use pixscatter_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use pixscatter_comm as comm;
pub use pixscatter_filter as filter;
pub use pixscatter_io as io;
