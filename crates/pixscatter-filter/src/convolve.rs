//! Convolution engine
//!
//! One pass of a square kernel over a [`ChannelPlane`]. The kernel is
//! applied flipped (true convolution, not correlation). Footprint cells
//! outside the plane contribute nothing, which is zero padding: there is no
//! wraparound and no edge replication. A plane holding one worker's rows
//! therefore treats the partition's first and last rows as image edges.

use crate::{FilterError, FilterResult, Kernel};
use pixscatter_core::ChannelPlane;

/// Scale an accumulated sum by the kernel factor and clamp it to a sample.
///
/// The product is truncated toward zero before clamping, so `-0.9` becomes
/// `0` and `255.9` becomes `255`.
#[inline]
fn saturate(acc: i64, factor: f32) -> u8 {
    let scaled = (acc as f32 * factor) as i64;
    scaled.clamp(0, 255) as u8
}

/// Convolve `src` with `kernel`, writing every cell of `dst`.
///
/// # Errors
///
/// Returns [`FilterError::SizeMismatch`] if the planes differ in size.
pub fn apply_kernel(src: &ChannelPlane, dst: &mut ChannelPlane, kernel: &Kernel) -> FilterResult<()> {
    if src.dimensions() != dst.dimensions() {
        return Err(FilterError::SizeMismatch {
            src: src.dimensions(),
            dst: dst.dimensions(),
        });
    }

    let w = src.width() as i64;
    let h = src.height() as i64;
    let dim = kernel.dim() as i64;
    let center = dim / 2;
    let weights = kernel.weights();
    let factor = kernel.factor();
    let input = src.samples();
    let output = dst.samples_mut();

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0i64;

            for ky in 0..dim {
                let yy = y + ky - center;
                if yy < 0 || yy >= h {
                    continue;
                }
                let row = (yy * w) as usize;
                let flipped_row = ((dim - 1 - ky) * dim) as usize;

                for kx in 0..dim {
                    let xx = x + kx - center;
                    if xx < 0 || xx >= w {
                        continue;
                    }
                    let weight = weights[flipped_row + (dim - 1 - kx) as usize];
                    acc += input[row + xx as usize] as i64 * weight as i64;
                }
            }

            output[(y * w + x) as usize] = saturate(acc, factor);
        }
    }

    Ok(())
}

/// Convolve into a newly allocated plane.
pub fn convolve_plane(src: &ChannelPlane, kernel: &Kernel) -> FilterResult<ChannelPlane> {
    let mut dst = ChannelPlane::new(src.width(), src.height())?;
    apply_kernel(src, &mut dst, kernel)?;
    Ok(dst)
}
