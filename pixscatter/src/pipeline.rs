//! Distribution coordinator
//!
//! Both modes follow the same shape: rank 0 owns the global raster, the
//! rows are split with [`partition`], each rank works on its own rows, and
//! the rows are gathered back in rank order.
//!
//! - Inversion sends each worker its rows point-to-point and needs no
//!   metadata; workers accept whatever the root sends.
//! - Convolution first broadcasts an [`Announcement`] so every rank can
//!   rebuild the same partition table, then scatters pixels with
//!   [`scatterv`].
//!
//! Every function here must be called by all ranks of the world, in the
//! same order. Rank 0 passes the raster and options; the other ranks pass
//! `None` and get `None` back.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use pixscatter_comm::{
    CommError, CommResult, Communicator, PartitionTable, ROOT, WireMessage, broadcast, gatherv,
    partition, receive_partition, scatterv, send_partition,
};
use pixscatter_core::{ChannelPlane, Extraction, Mapping, Pixel, Raster, invert_pixels, map_channel};
use pixscatter_filter::{Kernel, KernelName, PingPong, iterate};

use crate::{PipelineError, PipelineResult};

/// How a rank treats the top and bottom edges of its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Boundary {
    /// Zero-pad at partition edges, as at image edges. Results show seams
    /// where partitions meet.
    #[default]
    Partition,
    /// Refresh neighbour rows from the other ranks before every pass.
    /// Results match a single-rank run exactly.
    Halo,
}

impl Boundary {
    pub fn code(self) -> u32 {
        match self {
            Boundary::Partition => 0,
            Boundary::Halo => 1,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Boundary::Partition),
            1 => Some(Boundary::Halo),
            _ => None,
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Boundary::Partition => "partition",
            Boundary::Halo => "halo",
        })
    }
}

impl FromStr for Boundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "partition" => Ok(Boundary::Partition),
            "halo" => Ok(Boundary::Halo),
            _ => Err(format!("unknown boundary mode '{}'", s)),
        }
    }
}

/// Options of a convolution run, chosen on rank 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolveOptions {
    pub iterations: u32,
    pub kernel: KernelName,
    pub extraction: Extraction,
    pub mapping: Mapping,
    pub boundary: Boundary,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            kernel: KernelName::default(),
            extraction: Extraction::Average,
            mapping: Mapping::Equal,
            boundary: Boundary::default(),
        }
    }
}

/// Everything a worker needs to take part in a convolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMetadata {
    pub width: u32,
    pub height: u32,
    pub options: ConvolveOptions,
}

/// First message of a convolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    Run(RunMetadata),
    /// Rank 0 failed before distributing any data
    Abort,
}

const ANNOUNCE_ABORT: u32 = 0;
const ANNOUNCE_RUN: u32 = 1;

fn malformed(what: impl fmt::Display) -> CommError {
    CommError::Malformed(what.to_string())
}

impl WireMessage for Announcement {
    fn to_fields(&self) -> Vec<u32> {
        match self {
            Announcement::Abort => vec![ANNOUNCE_ABORT],
            Announcement::Run(meta) => vec![
                ANNOUNCE_RUN,
                meta.width,
                meta.height,
                meta.options.iterations,
                meta.options.kernel.code(),
                meta.options.extraction.code(),
                meta.options.mapping.code(),
                meta.options.boundary.code(),
            ],
        }
    }

    fn from_fields(fields: &[u32]) -> CommResult<Self> {
        match *fields {
            [ANNOUNCE_ABORT] => Ok(Announcement::Abort),
            [ANNOUNCE_RUN, width, height, iterations, kernel, extraction, mapping, boundary] => {
                Ok(Announcement::Run(RunMetadata {
                    width,
                    height,
                    options: ConvolveOptions {
                        iterations,
                        kernel: KernelName::from_code(kernel).map_err(malformed)?,
                        extraction: Extraction::from_code(extraction).map_err(malformed)?,
                        mapping: Mapping::from_code(mapping).map_err(malformed)?,
                        boundary: Boundary::from_code(boundary).ok_or_else(|| {
                            malformed(format!("unknown boundary code {}", boundary))
                        })?,
                    },
                }))
            }
            _ => Err(malformed(format!(
                "unrecognized announcement of {} fields",
                fields.len()
            ))),
        }
    }
}

fn missing(what: &'static str) -> PipelineError {
    CommError::MissingRootData { rank: ROOT, what }.into()
}

/// Invert a raster across all ranks.
///
/// Rank 0 returns the inverted raster; workers return `None`.
pub fn invert_distributed<C>(comm: &mut C, raster: Option<&Raster>) -> PipelineResult<Option<Raster>>
where
    C: Communicator + ?Sized,
{
    if !comm.is_root() {
        let mut local: Vec<Pixel> = receive_partition(comm, ROOT, None)?;
        log::debug!("rank {}: inverting {} pixels", comm.rank(), local.len());
        invert_pixels(&mut local);
        send_partition(comm, ROOT, &local)?;
        return Ok(None);
    }

    let raster = raster.ok_or_else(|| missing("input raster"))?;
    let (width, height) = raster.dimensions();
    let table = partition(height, comm.size())?;
    log_partitions(&table);
    let spans = table.spans(width);

    let mut local = scatterv(comm, ROOT, Some(raster.pixels()), &spans)?;
    invert_pixels(&mut local);

    let mut output = raster.clone();
    gatherv(comm, ROOT, &local, &spans, Some(output.pixels_mut()))?;
    log::info!("inverted {}x{} on {} ranks", width, height, comm.size());
    Ok(Some(output))
}

/// Tell every worker waiting in [`convolve_distributed`] to give up.
///
/// Only rank 0 calls this, in place of `convolve_distributed`.
pub fn abort_run<C>(comm: &mut C) -> PipelineResult<()>
where
    C: Communicator + ?Sized,
{
    log::warn!("aborting run on {} ranks", comm.size());
    broadcast(comm, ROOT, Some(Announcement::Abort))?;
    Ok(())
}

/// Convolve a raster across all ranks.
///
/// Rank 0 passes the raster and options and returns the result; workers
/// pass `None` for both and return `None`.
///
/// # Errors
///
/// Workers return [`PipelineError::Aborted`] if rank 0 called
/// [`abort_run`] instead.
pub fn convolve_distributed<C>(
    comm: &mut C,
    raster: Option<&Raster>,
    options: Option<&ConvolveOptions>,
) -> PipelineResult<Option<Raster>>
where
    C: Communicator + ?Sized,
{
    let announcement = if comm.is_root() {
        let raster = raster.ok_or_else(|| missing("input raster"))?;
        let options = options.ok_or_else(|| missing("run options"))?;
        Some(Announcement::Run(RunMetadata {
            width: raster.width(),
            height: raster.height(),
            options: *options,
        }))
    } else {
        None
    };

    let meta = match broadcast(comm, ROOT, announcement)? {
        Announcement::Run(meta) => meta,
        Announcement::Abort => return Err(PipelineError::Aborted),
    };
    let opts = meta.options;
    let kernel = opts.kernel.kernel();

    let table = partition(meta.height, comm.size())?;
    let part = *table.get(comm.rank())?;
    if comm.is_root() {
        log::info!(
            "convolving {}x{} with {} x{} on {} ranks ({} boundary)",
            meta.width,
            meta.height,
            kernel.name(),
            opts.iterations,
            comm.size(),
            opts.boundary
        );
        log_partitions(&table);
        if opts.boundary == Boundary::Partition && kernel.dim() > 1 && comm.size() > 1 {
            log::warn!(
                "{} is {}x{}; partition edges are zero-padded and will show seams",
                kernel.name(),
                kernel.dim(),
                kernel.dim()
            );
        }
    }

    let spans = table.spans(meta.width);
    let pixels = scatterv(comm, ROOT, raster.map(Raster::pixels), &spans)?;
    let mut local = Raster::from_pixels(meta.width, part.rows, pixels)?;

    let plane = ChannelPlane::extract(&local, opts.extraction)?;
    let plane = match opts.boundary {
        Boundary::Partition => iterate(plane, kernel, opts.iterations)?,
        Boundary::Halo => iterate_with_halo(comm, &table, meta.width, plane, kernel, opts.iterations)?,
    };
    map_channel(&mut local, &plane, opts.mapping)?;

    let mut output = raster.cloned();
    gatherv(
        comm,
        ROOT,
        local.pixels(),
        &spans,
        output.as_mut().map(Raster::pixels_mut),
    )?;
    Ok(output)
}

/// Run the iteration controller on a plane whose neighbour rows are
/// refreshed through rank 0 before every pass.
///
/// Each rank keeps an extended plane holding its own rows plus up to
/// `kernel.radius()` rows of each neighbour. After a pass only the own rows
/// are valid; they are gathered into rank 0's global plane and the
/// overlapping extended slices are scattered back into the arena.
fn iterate_with_halo<C>(
    comm: &mut C,
    table: &PartitionTable,
    width: u32,
    own: ChannelPlane,
    kernel: &Kernel,
    iterations: u32,
) -> PipelineResult<ChannelPlane>
where
    C: Communicator + ?Sized,
{
    if iterations == 0 {
        return Ok(own);
    }

    let rank = comm.rank();
    let part = *table.get(rank)?;
    let extent = table.halo_extent(rank, kernel.radius())?;
    let own_spans = table.spans(width);
    let halo_spans = table.halo_spans(width, kernel.radius());
    let own_rows = {
        let w = width as usize;
        extent.above as usize * w..(extent.above + part.rows) as usize * w
    };

    let mut global = if comm.is_root() {
        Some(vec![0u8; table.total_rows() as usize * width as usize])
    } else {
        None
    };

    gatherv(comm, ROOT, own.samples(), &own_spans, global.as_deref_mut())?;
    let extended = scatterv(comm, ROOT, global.as_deref(), &halo_spans)?;
    let mut arena = PingPong::new(ChannelPlane::from_rows(width, extended)?)?;
    log::debug!(
        "rank {}: halo {} above, {} below",
        rank,
        extent.above,
        extent.below
    );

    for pass in 0..iterations {
        if pass > 0 {
            gatherv(
                comm,
                ROOT,
                &arena.current().samples()[own_rows.clone()],
                &own_spans,
                global.as_deref_mut(),
            )?;
            let extended = scatterv(comm, ROOT, global.as_deref(), &halo_spans)?;
            arena.current_mut().samples_mut().copy_from_slice(&extended);
        }
        arena.step(kernel)?;
    }

    Ok(arena.current().crop_rows(extent.above, part.rows)?)
}

fn log_partitions(table: &PartitionTable) {
    for p in table {
        log::debug!(
            "rank {}: rows {}..{} ({} rows)",
            p.rank,
            p.row_offset,
            p.end_row(),
            p.rows
        );
    }
}

/// Load `input` on rank 0, invert it across all ranks, save to `output`.
///
/// Workers ignore both paths. If rank 0 cannot load the input it returns
/// the error without sending anything. Thread workers then see rank 0's
/// channels close; under MPI [`crate::run_world`] aborts the world.
pub fn invert_file<C>(comm: &mut C, input: &Path, output: &Path) -> PipelineResult<()>
where
    C: Communicator + ?Sized,
{
    if !comm.is_root() {
        invert_distributed(comm, None)?;
        return Ok(());
    }

    let raster = pixscatter_io::read_raster(input)?;
    if let Some(result) = invert_distributed(comm, Some(&raster))? {
        pixscatter_io::write_raster(output, &result)?;
    }
    Ok(())
}

/// Load `input` on rank 0, convolve it across all ranks, save to `output`.
///
/// If rank 0 cannot load the input it aborts the run so workers return
/// [`PipelineError::Aborted`] instead of waiting forever.
pub fn convolve_file<C>(
    comm: &mut C,
    input: &Path,
    output: &Path,
    options: &ConvolveOptions,
) -> PipelineResult<()>
where
    C: Communicator + ?Sized,
{
    if !comm.is_root() {
        convolve_distributed(comm, None, None)?;
        return Ok(());
    }

    let raster = match pixscatter_io::read_raster(input) {
        Ok(raster) => raster,
        Err(e) => {
            abort_run(comm)?;
            return Err(e.into());
        }
    };
    if let Some(result) = convolve_distributed(comm, Some(&raster), Some(options))? {
        pixscatter_io::write_raster(output, &result)?;
    }
    Ok(())
}
