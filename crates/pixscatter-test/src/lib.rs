//! pixscatter-test - Regression test framework for pixscatter
//!
//! Provides [`RegParams`], a counter of numbered checks that records every
//! failure and reports them together, plus deterministic synthetic rasters
//! so tests never depend on image files checked into the tree.
//!
//! # Usage
//!
//! ```ignore
//! use pixscatter_test::RegParams;
//!
//! let mut rp = RegParams::new("invert");
//! rp.compare_values(55.0, out.get(0, 0).unwrap().r as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "display" to also write result rasters to
//!   `tests/regout` for inspection

mod error;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

use pixscatter_core::{ChannelPlane, Pixel, Raster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // pixscatter-test is at crates/pixscatter-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}

/// A raster with every pixel set to `pixel`.
pub fn solid_raster(width: u32, height: u32, pixel: Pixel) -> TestResult<Raster> {
    Ok(Raster::filled(width, height, pixel)?)
}

/// A raster whose red ramps along x, green ramps along y and blue is the
/// sum of both, all modulo 256.
///
/// Every row differs from its neighbours, which makes misplaced partitions
/// visible.
pub fn gradient_raster(width: u32, height: u32) -> TestResult<Raster> {
    let mut data = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(Pixel::new(
                (x * 7) as u8,
                (y * 11) as u8,
                (x * 7 + y * 11) as u8,
            ));
        }
    }
    Ok(Raster::from_pixels(width, height, data)?)
}

/// A raster of uniformly random pixels, reproducible from `seed`.
pub fn random_raster(width: u32, height: u32, seed: u64) -> TestResult<Raster> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width as usize * height as usize)
        .map(|_| Pixel::new(rng.r#gen(), rng.r#gen(), rng.r#gen()))
        .collect();
    Ok(Raster::from_pixels(width, height, data)?)
}

/// A plane of uniformly random samples, reproducible from `seed`.
pub fn random_plane(width: u32, height: u32, seed: u64) -> TestResult<ChannelPlane> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width as usize * height as usize)
        .map(|_| rng.r#gen())
        .collect();
    Ok(ChannelPlane::from_samples(width, height, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_raster_is_reproducible() {
        let a = random_raster(8, 5, 42).unwrap();
        let b = random_raster(8, 5, 42).unwrap();
        let c = random_raster(8, 5, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_gradient_rows_differ() {
        let r = gradient_raster(4, 3).unwrap();
        assert_ne!(r.row(0), r.row(1));
        assert_eq!(r.get(2, 1), Some(Pixel::new(14, 11, 25)));
    }
}
