//! Point-to-point transport

use crate::{CommResult, Tag};

/// Rank that owns the global raster and performs all file I/O.
pub const ROOT: usize = 0;

/// Blocking, ordered, point-to-point messaging between ranks.
///
/// Messages between one pair of ranks arrive in the order they were sent.
/// `recv` blocks until a message from `source` is available; there is no
/// timeout. A peer that has gone away is reported as
/// [`crate::CommError::Disconnected`].
pub trait Communicator {
    /// This rank, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the world.
    fn size(&self) -> usize;

    /// Send one frame to `dest`.
    fn send(&mut self, dest: usize, tag: Tag, payload: &[u8]) -> CommResult<()>;

    /// Receive the next frame from `source`, which must carry `tag`.
    fn recv(&mut self, source: usize, tag: Tag) -> CommResult<Vec<u8>>;

    /// Whether this rank is [`ROOT`].
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    /// The MPI communicator behind this rank, if any.
    ///
    /// Collectives use it to hand whole transfers to the MPI runtime
    /// instead of building them from `send`/`recv`.
    #[cfg(feature = "mpi")]
    fn as_mpi(&self) -> Option<&crate::MpiComm> {
        None
    }
}

impl<C: Communicator + ?Sized> Communicator for &mut C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn send(&mut self, dest: usize, tag: Tag, payload: &[u8]) -> CommResult<()> {
        (**self).send(dest, tag, payload)
    }

    fn recv(&mut self, source: usize, tag: Tag) -> CommResult<Vec<u8>> {
        (**self).recv(source, tag)
    }

    #[cfg(feature = "mpi")]
    fn as_mpi(&self) -> Option<&crate::MpiComm> {
        (**self).as_mpi()
    }
}
