//! Row partitioning
//!
//! Splits `total_rows` image rows between `workers` ranks:
//!
//! - every rank gets `total_rows / workers` rows,
//! - rank 0 additionally gets the `total_rows % workers` remainder rows,
//! - offsets accumulate in rank order from row 0.
//!
//! The table is a pure function of its two inputs. Each rank recomputes it
//! locally after the metadata broadcast; scatter and gather only agree on
//! where one partition ends and the next begins because every rank runs
//! this same function on the same numbers.

use std::ops::Range;

use crate::{CommError, CommResult};

/// Contiguous element range of a flat buffer, in elements (not bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub offset: usize,
    pub count: usize,
}

impl Span {
    #[inline]
    pub fn range(self) -> Range<usize> {
        self.offset..self.offset + self.count
    }
}

/// Rows of the global image assigned to one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    pub rank: usize,
    /// First global row
    pub row_offset: u32,
    /// Number of rows (local height)
    pub rows: u32,
}

impl Partition {
    /// One past the last global row.
    #[inline]
    pub fn end_row(&self) -> u32 {
        self.row_offset + self.rows
    }

    /// Element span of this partition in a row-major buffer `width` wide.
    #[inline]
    pub fn span(&self, width: u32) -> Span {
        Span {
            offset: self.row_offset as usize * width as usize,
            count: self.rows as usize * width as usize,
        }
    }
}

/// Neighbour rows added above and below a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HaloExtent {
    pub above: u32,
    pub below: u32,
}

/// Partitions of all ranks, ordered by rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionTable {
    total_rows: u32,
    parts: Vec<Partition>,
}

impl PartitionTable {
    /// Split `total_rows` rows between `workers` ranks.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::InvalidPartition`] if `workers` is zero or
    /// greater than `total_rows` (zero-row partitions are not supported).
    pub fn new(total_rows: u32, workers: usize) -> CommResult<Self> {
        if workers == 0 {
            return Err(CommError::InvalidPartition(
                "worker count must be at least 1".into(),
            ));
        }
        if workers > total_rows as usize {
            return Err(CommError::InvalidPartition(format!(
                "cannot split {} rows across {} workers",
                total_rows, workers
            )));
        }

        // workers <= total_rows, so it fits in u32
        let n = workers as u32;
        let base = total_rows / n;
        let remainder = total_rows % n;

        let mut parts = Vec::with_capacity(workers);
        let mut offset = 0u32;
        for rank in 0..workers {
            let rows = if rank == 0 { base + remainder } else { base };
            parts.push(Partition {
                rank,
                row_offset: offset,
                rows,
            });
            offset += rows;
        }
        debug_assert_eq!(offset, total_rows);

        Ok(Self { total_rows, parts })
    }

    #[inline]
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// Number of ranks.
    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Partition of `rank`.
    pub fn get(&self, rank: usize) -> CommResult<&Partition> {
        self.parts.get(rank).ok_or(CommError::InvalidRank {
            rank,
            size: self.parts.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Partition> {
        self.parts.iter()
    }

    /// Per-rank element spans for a row-major buffer `width` wide.
    pub fn spans(&self, width: u32) -> Vec<Span> {
        self.parts.iter().map(|p| p.span(width)).collect()
    }

    /// Neighbour rows `rank` needs to see `halo` rows past each partition
    /// edge, clipped at the image edges.
    pub fn halo_extent(&self, rank: usize, halo: u32) -> CommResult<HaloExtent> {
        let p = self.get(rank)?;
        Ok(HaloExtent {
            above: halo.min(p.row_offset),
            below: halo.min(self.total_rows - p.end_row()),
        })
    }

    /// Per-rank spans extended by up to `halo` rows on each side.
    ///
    /// Adjacent spans overlap; a scatter with these spans hands every rank
    /// copies of its neighbours' edge rows.
    pub fn halo_spans(&self, width: u32, halo: u32) -> Vec<Span> {
        self.parts
            .iter()
            .map(|p| {
                let above = halo.min(p.row_offset);
                let below = halo.min(self.total_rows - p.end_row());
                Span {
                    offset: (p.row_offset - above) as usize * width as usize,
                    count: (above + p.rows + below) as usize * width as usize,
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a PartitionTable {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

/// Split `total_rows` rows between `workers` ranks.
///
/// See [`PartitionTable::new`].
pub fn partition(total_rows: u32, workers: usize) -> CommResult<PartitionTable> {
    PartitionTable::new(total_rows, workers)
}
