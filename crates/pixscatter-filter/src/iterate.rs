//! Iteration controller
//!
//! Applies a kernel repeatedly using two buffers. Each pass reads the
//! current slot and writes the other one, then the current index toggles,
//! so the next pass reads what was just produced. No plane is copied
//! between passes.

use crate::{FilterResult, Kernel, apply_kernel};
use pixscatter_core::ChannelPlane;

/// Two-slot buffer arena with an explicit current index.
#[derive(Debug)]
pub struct PingPong {
    slots: [ChannelPlane; 2],
    current: usize,
    passes: u32,
}

impl PingPong {
    /// Put `initial` in the current slot and allocate a spare of the same size.
    pub fn new(initial: ChannelPlane) -> FilterResult<Self> {
        let spare = ChannelPlane::new(initial.width(), initial.height())?;
        Ok(Self {
            slots: [initial, spare],
            current: 0,
            passes: 0,
        })
    }

    /// The plane the next pass reads from.
    #[inline]
    pub fn current(&self) -> &ChannelPlane {
        &self.slots[self.current]
    }

    /// Mutable access to the current plane, to refresh rows between passes.
    #[inline]
    pub fn current_mut(&mut self) -> &mut ChannelPlane {
        &mut self.slots[self.current]
    }

    /// Number of passes applied so far.
    #[inline]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Apply one pass and swap the roles of the two slots.
    pub fn step(&mut self, kernel: &Kernel) -> FilterResult<()> {
        let [a, b] = &mut self.slots;
        let (src, dst) = if self.current == 0 { (&*a, b) } else { (&*b, a) };
        apply_kernel(src, dst, kernel)?;
        self.current ^= 1;
        self.passes += 1;
        Ok(())
    }

    /// Take the current plane, releasing the spare.
    pub fn into_current(self) -> ChannelPlane {
        let [a, b] = self.slots;
        if self.current == 0 { a } else { b }
    }
}

/// Apply `kernel` to `initial` `iterations` times.
///
/// With `iterations == 0` the input is returned unchanged.
pub fn iterate(initial: ChannelPlane, kernel: &Kernel, iterations: u32) -> FilterResult<ChannelPlane> {
    if iterations == 0 {
        return Ok(initial);
    }
    let mut arena = PingPong::new(initial)?;
    for _ in 0..iterations {
        arena.step(kernel)?;
    }
    log::debug!(
        "applied {} x{} to {}x{} plane",
        kernel.name(),
        arena.passes(),
        arena.current().width(),
        arena.current().height()
    );
    Ok(arena.into_current())
}
