//! Wire encoding
//!
//! Partition data and broadcast messages are typed element slices. The
//! in-process transport moves them as bytes: pixels are packed as
//! consecutive `r, g, b` triples, samples as single bytes, and message
//! fields as little-endian `u32`. Under MPI the same slices go through the
//! native datatypes instead, which is why every [`Element`] must also be
//! [`Transferable`].

use pixscatter_core::Pixel;

use crate::{CommError, CommResult};

/// Kind of a point-to-point frame, checked on receipt to catch collectives
/// called out of order. Doubles as the MPI message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Broadcast payload
    Broadcast = 1,
    /// Root-to-worker partition data
    Scatter = 2,
    /// Worker-to-root partition data
    Gather = 3,
}

/// Types the MPI runtime can move without repacking.
#[cfg(feature = "mpi")]
pub trait Transferable: mpi::datatype::Equivalence {}

#[cfg(feature = "mpi")]
impl<T: mpi::datatype::Equivalence> Transferable for T {}

/// Types the MPI runtime can move without repacking.
#[cfg(not(feature = "mpi"))]
pub trait Transferable {}

#[cfg(not(feature = "mpi"))]
impl<T> Transferable for T {}

/// Fixed-size value that can be packed into a scatter/gather payload.
pub trait Element: Transferable + Copy + Default + Send + 'static {
    /// Encoded size in bytes
    const WIRE_SIZE: usize;

    /// Append the encoding of `self` to `out`.
    fn put(&self, out: &mut Vec<u8>);

    /// Decode from exactly `WIRE_SIZE` bytes.
    fn take(bytes: &[u8]) -> Self;
}

impl Element for u8 {
    const WIRE_SIZE: usize = 1;

    #[inline]
    fn put(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    #[inline]
    fn take(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Element for u32 {
    const WIRE_SIZE: usize = 4;

    #[inline]
    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    #[inline]
    fn take(bytes: &[u8]) -> Self {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl Element for Pixel {
    const WIRE_SIZE: usize = 3;

    #[inline]
    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_array());
    }

    #[inline]
    fn take(bytes: &[u8]) -> Self {
        Pixel::new(bytes[0], bytes[1], bytes[2])
    }
}

/// Pack a slice of elements.
pub fn encode_slice<T: Element>(items: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(items.len() * T::WIRE_SIZE);
    for item in items {
        item.put(&mut out);
    }
    out
}

/// Unpack a payload into elements.
///
/// # Errors
///
/// Returns [`CommError::Malformed`] if the payload is not a whole number of
/// elements.
pub fn decode_vec<T: Element>(bytes: &[u8]) -> CommResult<Vec<T>> {
    if bytes.len() % T::WIRE_SIZE != 0 {
        return Err(CommError::Malformed(format!(
            "{} bytes is not a multiple of the {}-byte element size",
            bytes.len(),
            T::WIRE_SIZE
        )));
    }
    Ok(bytes.chunks_exact(T::WIRE_SIZE).map(T::take).collect())
}

/// Structured message sent with [`crate::broadcast`], flattened to a
/// record of `u32` fields.
pub trait WireMessage: Sized {
    fn to_fields(&self) -> Vec<u32>;
    fn from_fields(fields: &[u32]) -> CommResult<Self>;
}
