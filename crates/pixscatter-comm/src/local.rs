//! In-process world: one thread per rank
//!
//! Every ordered pair of ranks gets its own unbounded `flume` channel, so
//! messages between two ranks keep their order and a receive from one peer
//! never has to skip past frames from another. Sends are buffered and
//! never block; receives block until a frame arrives or the sending rank
//! has dropped its communicator.

use flume::{Receiver, Sender};

use crate::{CommError, CommResult, Communicator, Tag};

#[derive(Debug)]
struct Frame {
    tag: Tag,
    payload: Vec<u8>,
}

/// Communicator for one rank of a [`LocalWorld`].
#[derive(Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    /// Indexed by destination rank
    outboxes: Vec<Sender<Frame>>,
    /// Indexed by source rank
    inboxes: Vec<Receiver<Frame>>,
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&mut self, dest: usize, tag: Tag, payload: &[u8]) -> CommResult<()> {
        let outbox = self.outboxes.get(dest).ok_or(CommError::InvalidRank {
            rank: dest,
            size: self.size,
        })?;
        outbox
            .send(Frame {
                tag,
                payload: payload.to_vec(),
            })
            .map_err(|_| CommError::Disconnected { peer: dest })
    }

    fn recv(&mut self, source: usize, tag: Tag) -> CommResult<Vec<u8>> {
        let inbox = self.inboxes.get(source).ok_or(CommError::InvalidRank {
            rank: source,
            size: self.size,
        })?;
        let frame = inbox
            .recv()
            .map_err(|_| CommError::Disconnected { peer: source })?;
        if frame.tag != tag {
            return Err(CommError::UnexpectedTag {
                peer: source,
                expected: tag,
                actual: frame.tag,
            });
        }
        Ok(frame.payload)
    }
}

/// A fixed set of ranks connected in memory.
#[derive(Debug)]
pub struct LocalWorld {
    comms: Vec<LocalComm>,
}

impl LocalWorld {
    /// Wire up `size` ranks.
    pub fn new(size: usize) -> CommResult<Self> {
        if size == 0 {
            return Err(CommError::InvalidPartition(
                "world size must be at least 1".into(),
            ));
        }

        // links[src][dst]
        let links: Vec<Vec<(Sender<Frame>, Receiver<Frame>)>> = (0..size)
            .map(|_| (0..size).map(|_| flume::unbounded()).collect())
            .collect();

        let comms = (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                outboxes: (0..size).map(|dst| links[rank][dst].0.clone()).collect(),
                inboxes: (0..size).map(|src| links[src][rank].1.clone()).collect(),
            })
            .collect();

        Ok(Self { comms })
    }

    pub fn size(&self) -> usize {
        self.comms.len()
    }

    /// Hand out the per-rank communicators, in rank order.
    pub fn into_comms(self) -> Vec<LocalComm> {
        self.comms
    }

    /// Run `body` once per rank, each on its own thread, and collect the
    /// results in rank order.
    ///
    /// Each rank's communicator is dropped when its `body` returns, so a
    /// rank that bails out early wakes peers blocked on it with
    /// [`CommError::Disconnected`] instead of leaving them hanging.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::RankPanicked`] for the lowest rank whose thread
    /// panicked.
    pub fn run<R, F>(size: usize, body: F) -> CommResult<Vec<R>>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let world = Self::new(size)?;
        let body = &body;
        std::thread::scope(|scope| {
            let handles: Vec<_> = world
                .into_comms()
                .into_iter()
                .map(|comm| {
                    let rank = comm.rank;
                    let handle = std::thread::Builder::new()
                        .name(format!("rank-{}", rank))
                        .spawn_scoped(scope, move || body(comm));
                    (rank, handle)
                })
                .collect();

            let mut results = Vec::with_capacity(size);
            for (rank, handle) in handles {
                let handle = handle?;
                let result = handle
                    .join()
                    .map_err(|_| CommError::RankPanicked { rank })?;
                results.push(result);
            }
            Ok(results)
        })
    }
}
