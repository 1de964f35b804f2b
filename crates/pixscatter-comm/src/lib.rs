//! pixscatter-comm - Row partitioning and SPMD transport
//!
//! Every rank runs the same program. Rank 0 ([`ROOT`]) owns the global
//! raster; the others only ever see the rows delivered to them.
//!
//! - [`partition`] splits image rows between ranks. All ranks must derive
//!   partition boundaries from broadcast metadata using this same
//!   deterministic function; nothing else lines up the two sides of a
//!   scatter or gather.
//! - [`Communicator`] is the point-to-point transport, implemented by
//!   [`LocalComm`] (threads in one process) and, with the `mpi` feature,
//!   `MpiComm` (one process per rank, started by `mpirun`).
//! - [`broadcast`], [`scatterv`] and [`gatherv`] are the rooted
//!   collectives. Every rank must call them in the same order.

pub mod collective;
pub mod communicator;
mod error;
pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi_comm;
pub mod partition;
pub mod wire;

pub use collective::{broadcast, gatherv, receive_partition, scatterv, send_partition};
pub use communicator::{Communicator, ROOT};
pub use error::{CommError, CommResult};
pub use local::{LocalComm, LocalWorld};
pub use partition::{HaloExtent, Partition, PartitionTable, Span, partition};
#[cfg(feature = "mpi")]
pub use mpi_comm::{MpiComm, MpiWorld};
pub use wire::{Element, Tag, Transferable, WireMessage};
