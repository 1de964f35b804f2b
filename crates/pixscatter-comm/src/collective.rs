//! Rooted collectives
//!
//! All collectives are rooted: data flows between the root and each other
//! rank, never between two workers. On a transport without native
//! collectives they are built from `send`/`recv`, with the root visiting
//! ranks in ascending order so gathered partitions land in rank order.
//! Under MPI they map onto `MPI_Bcast`, `MPI_Scatterv` and `MPI_Gatherv`.
//!
//! [`scatterv`] and [`gatherv`] take a per-rank [`Span`] table (element
//! offset and count). The worker halves, [`receive_partition`] and
//! [`send_partition`], are public on their own: a worker that does not
//! know the span table can still take part by accepting whatever the root
//! sends, which is how the inversion mode works.

use crate::wire::{decode_vec, encode_slice};
use crate::{CommError, CommResult, Communicator, Element, Span, Tag, WireMessage};

fn check_world<C: Communicator + ?Sized>(comm: &C, root: usize, spans: Option<&[Span]>) -> CommResult<()> {
    let size = comm.size();
    if root >= size {
        return Err(CommError::InvalidRank { rank: root, size });
    }
    match spans {
        Some(spans) if spans.len() != size => Err(CommError::InvalidPartition(format!(
            "{} spans for a world of {} ranks",
            spans.len(),
            size
        ))),
        _ => Ok(()),
    }
}

fn slice_span<T>(buf: &[T], span: Span) -> CommResult<&[T]> {
    buf.get(span.range()).ok_or(CommError::LengthMismatch {
        expected: span.offset + span.count,
        actual: buf.len(),
    })
}

/// Whether no element is handed to two ranks. Every rank derives the same
/// span table, so every rank reaches the same answer.
#[cfg(feature = "mpi")]
fn spans_disjoint(spans: &[Span]) -> bool {
    let mut sorted: Vec<Span> = spans.iter().copied().filter(|s| s.count > 0).collect();
    sorted.sort_by_key(|s| s.offset);
    sorted.windows(2).all(|w| w[0].offset + w[0].count <= w[1].offset)
}

fn check_count(expected: usize, actual: usize) -> CommResult<()> {
    if expected != actual {
        return Err(CommError::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// Send `message` from `root` to every rank.
///
/// The root passes `Some(message)`; other ranks pass `None` and receive
/// the root's value. Every rank returns the same value.
pub fn broadcast<C, M>(comm: &mut C, root: usize, message: Option<M>) -> CommResult<M>
where
    C: Communicator + ?Sized,
    M: WireMessage,
{
    check_world(comm, root, None)?;
    if comm.rank() != root {
        #[cfg(feature = "mpi")]
        if let Some(mpi) = comm.as_mpi() {
            return M::from_fields(&mpi.broadcast_fields(root, None)?);
        }
        let bytes = comm.recv(root, Tag::Broadcast)?;
        return M::from_fields(&decode_vec::<u32>(&bytes)?);
    }

    let message = message.ok_or(CommError::MissingRootData {
        rank: root,
        what: "broadcast message",
    })?;
    let fields = message.to_fields();
    #[cfg(feature = "mpi")]
    if let Some(mpi) = comm.as_mpi() {
        mpi.broadcast_fields(root, Some(fields))?;
        return Ok(message);
    }
    let bytes = encode_slice(&fields);
    for dest in (0..comm.size()).filter(|&r| r != root) {
        comm.send(dest, Tag::Broadcast, &bytes)?;
    }
    Ok(message)
}

/// Distribute `spans[r]` of the root's `global` buffer to each rank `r`.
///
/// Spans may overlap. Returns this rank's elements.
pub fn scatterv<C, T>(comm: &mut C, root: usize, global: Option<&[T]>, spans: &[Span]) -> CommResult<Vec<T>>
where
    C: Communicator + ?Sized,
    T: Element,
{
    check_world(comm, root, Some(spans))?;
    #[cfg(feature = "mpi")]
    if let Some(mpi) = comm.as_mpi() {
        // MPI_Scatterv may not read a root element twice
        if spans_disjoint(spans) {
            return mpi.scatterv(root, global, spans);
        }
    }
    let rank = comm.rank();
    if rank != root {
        return receive_partition(comm, root, Some(spans[rank].count));
    }

    let global = global.ok_or(CommError::MissingRootData {
        rank: root,
        what: "scatter buffer",
    })?;
    for (dest, &span) in spans.iter().enumerate() {
        if dest == root {
            continue;
        }
        let part = slice_span(global, span)?;
        comm.send(dest, Tag::Scatter, &encode_slice(part))?;
    }
    Ok(slice_span(global, spans[root])?.to_vec())
}

/// Worker half of a scatter: receive one partition from `root`.
///
/// With `expected = None` any length is accepted.
pub fn receive_partition<C, T>(comm: &mut C, root: usize, expected: Option<usize>) -> CommResult<Vec<T>>
where
    C: Communicator + ?Sized,
    T: Element,
{
    let bytes = comm.recv(root, Tag::Scatter)?;
    let part = decode_vec::<T>(&bytes)?;
    if let Some(expected) = expected {
        check_count(expected, part.len())?;
    }
    Ok(part)
}

/// Collect every rank's `local` elements into `spans[r]` of the root's
/// `global` buffer.
///
/// Spans must not overlap.
pub fn gatherv<C, T>(
    comm: &mut C,
    root: usize,
    local: &[T],
    spans: &[Span],
    global: Option<&mut [T]>,
) -> CommResult<()>
where
    C: Communicator + ?Sized,
    T: Element,
{
    check_world(comm, root, Some(spans))?;
    let rank = comm.rank();
    check_count(spans[rank].count, local.len())?;
    #[cfg(feature = "mpi")]
    if let Some(mpi) = comm.as_mpi() {
        if spans_disjoint(spans) {
            return mpi.gatherv(root, local, spans, global);
        }
    }
    if rank != root {
        return send_partition(comm, root, local);
    }

    let global = global.ok_or(CommError::MissingRootData {
        rank: root,
        what: "gather buffer",
    })?;
    let global_len = global.len();
    let mut place = |span: Span, part: &[T]| -> CommResult<()> {
        check_count(span.count, part.len())?;
        let dst = global.get_mut(span.range()).ok_or(CommError::LengthMismatch {
            expected: span.offset + span.count,
            actual: global_len,
        })?;
        dst.copy_from_slice(part);
        Ok(())
    };

    for (source, &span) in spans.iter().enumerate() {
        if source == root {
            place(span, local)?;
        } else {
            let bytes = comm.recv(source, Tag::Gather)?;
            place(span, &decode_vec::<T>(&bytes)?)?;
        }
    }
    Ok(())
}

/// Worker half of a gather: send this rank's partition to `root`.
pub fn send_partition<C, T>(comm: &mut C, root: usize, local: &[T]) -> CommResult<()>
where
    C: Communicator + ?Sized,
    T: Element,
{
    comm.send(root, Tag::Gather, &encode_slice(local))
}
