//! Multi-process world over MPI
//!
//! Every rank is an OS process started by the MPI launcher
//! (`mpirun -np N`), which also fixes the world size. [`MpiWorld`] owns the
//! MPI environment; [`MpiComm`] is one rank's view of `MPI_COMM_WORLD`.
//!
//! Point-to-point frames use the [`Tag`] as the MPI message tag, so MPI's
//! tag matching replaces the explicit check the in-process transport does.
//! The rooted collectives in [`crate::collective`] hand whole transfers to
//! `MPI_Bcast`, `MPI_Scatterv` and `MPI_Gatherv` through
//! [`crate::Communicator::as_mpi`].

use mpi::Count;
use mpi::datatype::{Partition as Displaced, PartitionMut as DisplacedMut};
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, Destination as _, Root as _, Source as _};

use crate::{CommError, CommResult, Communicator, Element, Span, Tag};

/// The MPI environment of this process. MPI is finalized when it drops.
pub struct MpiWorld {
    universe: Universe,
}

impl MpiWorld {
    /// Initialize MPI.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::MpiUnavailable`] if MPI was already initialized
    /// in this process.
    pub fn initialize() -> CommResult<Self> {
        let universe = mpi::initialize().ok_or(CommError::MpiUnavailable(
            "MPI is already initialized in this process",
        ))?;
        Ok(Self { universe })
    }

    /// This process's rank of `MPI_COMM_WORLD`.
    pub fn comm(&self) -> MpiComm {
        MpiComm::new(self.universe.world())
    }
}

/// Communicator for one rank of an MPI world.
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: usize,
    size: usize,
}

fn counts_and_displs(spans: &[Span], len: usize) -> CommResult<(Vec<Count>, Vec<Count>)> {
    let to_count = |n: usize| {
        Count::try_from(n).map_err(|_| {
            CommError::InvalidPartition(format!("{} elements exceed the MPI count range", n))
        })
    };
    let mut counts = Vec::with_capacity(spans.len());
    let mut displs = Vec::with_capacity(spans.len());
    for span in spans {
        if span.offset + span.count > len {
            return Err(CommError::LengthMismatch {
                expected: span.offset + span.count,
                actual: len,
            });
        }
        counts.push(to_count(span.count)?);
        displs.push(to_count(span.offset)?);
    }
    Ok((counts, displs))
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Self { world, rank, size }
    }

    /// Terminate every rank of the world with exit status `code`.
    pub fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }

    fn peer(&self, rank: usize) -> CommResult<i32> {
        if rank >= self.size {
            return Err(CommError::InvalidRank {
                rank,
                size: self.size,
            });
        }
        Ok(rank as i32)
    }

    /// `MPI_Bcast` of a field record: its length first, then the fields.
    pub(crate) fn broadcast_fields(&self, root: usize, fields: Option<Vec<u32>>) -> CommResult<Vec<u32>> {
        let root_process = self.world.process_at_rank(self.peer(root)?);
        let mut fields = match fields {
            Some(fields) => fields,
            None if self.rank == root => {
                return Err(CommError::MissingRootData {
                    rank: root,
                    what: "broadcast message",
                });
            }
            None => Vec::new(),
        };
        let mut len = fields.len() as u64;
        root_process.broadcast_into(&mut len);
        fields.resize(len as usize, 0);
        root_process.broadcast_into(&mut fields[..]);
        Ok(fields)
    }

    /// `MPI_Scatterv` of `spans` of the root's `global` buffer.
    ///
    /// The span table must already be checked against the world size.
    pub(crate) fn scatterv<T: Element>(&self, root: usize, global: Option<&[T]>, spans: &[Span]) -> CommResult<Vec<T>> {
        let root_process = self.world.process_at_rank(self.peer(root)?);
        let mut local = vec![T::default(); spans[self.rank].count];
        if self.rank == root {
            let global = global.ok_or(CommError::MissingRootData {
                rank: root,
                what: "scatter buffer",
            })?;
            let (counts, displs) = counts_and_displs(spans, global.len())?;
            let send = Displaced::new(global, counts, displs);
            root_process.scatter_varcount_into_root(&send, &mut local[..]);
        } else {
            root_process.scatter_varcount_into(&mut local[..]);
        }
        Ok(local)
    }

    /// `MPI_Gatherv` of every rank's `local` into `spans` of the root's
    /// `global` buffer.
    ///
    /// The span table and `local` must already be checked.
    pub(crate) fn gatherv<T: Element>(
        &self,
        root: usize,
        local: &[T],
        spans: &[Span],
        global: Option<&mut [T]>,
    ) -> CommResult<()> {
        let root_process = self.world.process_at_rank(self.peer(root)?);
        if self.rank == root {
            let global = global.ok_or(CommError::MissingRootData {
                rank: root,
                what: "gather buffer",
            })?;
            let (counts, displs) = counts_and_displs(spans, global.len())?;
            let mut recv = DisplacedMut::new(global, counts, displs);
            root_process.gather_varcount_into_root(local, &mut recv);
        } else {
            root_process.gather_varcount_into(local);
        }
        Ok(())
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&mut self, dest: usize, tag: Tag, payload: &[u8]) -> CommResult<()> {
        self.world
            .process_at_rank(self.peer(dest)?)
            .send_with_tag(payload, tag as i32);
        Ok(())
    }

    fn recv(&mut self, source: usize, tag: Tag) -> CommResult<Vec<u8>> {
        let (payload, _status) = self
            .world
            .process_at_rank(self.peer(source)?)
            .receive_vec_with_tag::<u8>(tag as i32);
        Ok(payload)
    }

    fn as_mpi(&self) -> Option<&MpiComm> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ROOT, WireMessage, broadcast, gatherv, partition, scatterv};
    use pixscatter_core::Pixel;

    struct Dims(u32, u32);

    impl WireMessage for Dims {
        fn to_fields(&self) -> Vec<u32> {
            vec![self.0, self.1]
        }

        fn from_fields(fields: &[u32]) -> CommResult<Self> {
            match *fields {
                [w, h] => Ok(Dims(w, h)),
                _ => Err(CommError::Malformed(format!("{} fields", fields.len()))),
            }
        }
    }

    #[test]
    fn test_counts_and_displs() {
        let spans = [Span { offset: 0, count: 6 }, Span { offset: 6, count: 3 }];
        let (counts, displs) = counts_and_displs(&spans, 9).unwrap();
        assert_eq!(counts, vec![6, 3]);
        assert_eq!(displs, vec![0, 6]);
        assert!(matches!(
            counts_and_displs(&spans, 8),
            Err(CommError::LengthMismatch { expected: 9, actual: 8 })
        ));
    }

    // MPI can be initialized once per process, so every collective is
    // exercised from this one test. Run under `mpirun -np N` for N > 1.
    #[test]
    fn test_world_collectives() {
        let world = MpiWorld::initialize().unwrap();
        let mut comm = world.comm();
        assert!(comm.as_mpi().is_some());
        assert!(MpiWorld::initialize().is_err());

        let dims = if comm.is_root() { Some(Dims(4, 9)) } else { None };
        let Dims(width, height) = broadcast(&mut comm, ROOT, dims).unwrap();
        assert_eq!((width, height), (4, 9));

        let table = partition(height, comm.size()).unwrap();
        let spans = table.spans(width);
        let global: Vec<Pixel> = (0..36).map(|i| Pixel::gray(i as u8)).collect();
        let source = if comm.is_root() { Some(global.as_slice()) } else { None };
        let mut local = scatterv(&mut comm, ROOT, source, &spans).unwrap();
        assert_eq!(local.as_slice(), &global[spans[comm.rank()].range()]);

        pixscatter_core::invert_pixels(&mut local);
        let mut out = if comm.is_root() {
            Some(vec![Pixel::default(); global.len()])
        } else {
            None
        };
        gatherv(&mut comm, ROOT, &local, &spans, out.as_deref_mut()).unwrap();
        if let Some(out) = out {
            assert!(out.iter().zip(&global).all(|(o, g)| o.r == 255 - g.r));
        }
    }
}
