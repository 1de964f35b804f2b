//! World setup
//!
//! A run is described by a [`LaunchConfig`] read from the environment:
//!
//! - `PIXSCATTER_TRANSPORT`: `mpi` or `threads`. Defaults to `mpi` when
//!   built with the `mpi` feature and to `threads` otherwise.
//! - `PIXSCATTER_WORLD_SIZE`: number of thread ranks (default 1). Under MPI
//!   the launcher fixes the world size (`mpirun -np N`) and this variable
//!   is ignored.

use std::env;
use std::fmt;
use std::str::FromStr;

use pixscatter_comm::{Communicator, LocalWorld};

use crate::{PipelineError, PipelineResult};

pub const WORLD_SIZE_VAR: &str = "PIXSCATTER_WORLD_SIZE";
pub const TRANSPORT_VAR: &str = "PIXSCATTER_TRANSPORT";

/// How ranks are hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// One OS process per rank, started by the MPI launcher
    Mpi,
    /// One thread per rank inside this process
    Threads,
}

impl Default for Transport {
    fn default() -> Self {
        if cfg!(feature = "mpi") {
            Transport::Mpi
        } else {
            Transport::Threads
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transport::Mpi => "mpi",
            Transport::Threads => "threads",
        })
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mpi" => Ok(Transport::Mpi),
            "threads" | "thread" => Ok(Transport::Threads),
            _ => Err("expected 'mpi' or 'threads'".to_string()),
        }
    }
}

/// Where the ranks of a run come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchConfig {
    /// Requested rank count; `None` means one thread, or whatever the MPI
    /// launcher started
    pub world_size: Option<usize>,
    pub transport: Transport,
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> PipelineResult<T>
where
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| PipelineError::Launch {
        name,
        reason: e.to_string(),
        value,
    })
}

impl LaunchConfig {
    /// Read the launch variables from the process environment.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the launch variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(WORLD_SIZE_VAR) {
            let size: usize = parse_var(WORLD_SIZE_VAR, value.clone())?;
            if size == 0 {
                return Err(PipelineError::Launch {
                    name: WORLD_SIZE_VAR,
                    value,
                    reason: "must be at least 1".into(),
                });
            }
            config.world_size = Some(size);
        }
        if let Some(value) = lookup(TRANSPORT_VAR) {
            config.transport = parse_var(TRANSPORT_VAR, value)?;
        }
        Ok(config)
    }
}

/// Run `body` as this process's rank(s) of the world described by `config`.
///
/// - Thread transport: `body` runs once per rank on its own thread; the
///   first failing rank's error is returned.
/// - MPI transport: `body` runs once, as the rank the MPI launcher gave
///   this process. A rank that fails takes the whole world down with
///   `MPI_Abort` so no peer is left blocked in a transfer.
pub fn run_world<F>(config: &LaunchConfig, body: F) -> PipelineResult<()>
where
    F: Fn(&mut dyn Communicator) -> PipelineResult<()> + Sync,
{
    match config.transport {
        Transport::Threads => {
            let size = config.world_size.unwrap_or(1);
            log::info!("running {} ranks on threads", size);
            let results = LocalWorld::run(size, |mut comm| body(&mut comm))?;
            results.into_iter().collect()
        }
        Transport::Mpi => run_mpi(config, body),
    }
}

#[cfg(feature = "mpi")]
fn run_mpi<F>(config: &LaunchConfig, body: F) -> PipelineResult<()>
where
    F: Fn(&mut dyn Communicator) -> PipelineResult<()>,
{
    let world = pixscatter_comm::MpiWorld::initialize()?;
    let mut comm = world.comm();
    if comm.is_root() {
        log::info!("running {} ranks under MPI", comm.size());
        if let Some(requested) = config.world_size.filter(|&n| n != comm.size()) {
            log::warn!(
                "{}={} ignored; the MPI launcher started {} ranks",
                WORLD_SIZE_VAR,
                requested,
                comm.size()
            );
        }
    }

    let result = body(&mut comm);
    match &result {
        // Rank 0 announced the abort and is tearing the world down itself
        Err(PipelineError::Aborted) => {}
        Err(e) if comm.size() > 1 => {
            log::error!("rank {}: {}", comm.rank(), e);
            comm.abort(1);
        }
        _ => {}
    }
    result
}

#[cfg(not(feature = "mpi"))]
fn run_mpi<F>(_config: &LaunchConfig, _body: F) -> PipelineResult<()>
where
    F: Fn(&mut dyn Communicator) -> PipelineResult<()>,
{
    Err(pixscatter_comm::CommError::MpiUnavailable("built without the mpi feature").into())
}
