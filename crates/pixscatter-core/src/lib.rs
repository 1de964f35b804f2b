//! pixscatter core - raster data structures for distributed filtering
//!
//! This crate provides the data model shared by every other crate in the
//! workspace:
//!
//! - [`Pixel`] - a 3-component 8-bit RGB value
//! - [`Raster`] - a row-major grid of pixels
//! - [`ChannelPlane`] - a single-channel intensity plane derived from a raster
//! - [`Extraction`] / [`Mapping`] - rules converting between the two
//!
//! Rasters and planes are plain owned buffers. Worker partitions are
//! separate `Raster` values holding a contiguous row range of the global
//! image.

pub mod channel;
pub mod error;
pub mod invert;
pub mod raster;

pub use channel::{ChannelPlane, Extraction, Mapping, extract_channel, map_channel};
pub use error::{Error, Result};
pub use invert::{invert_pixels, invert_raster};
pub use raster::{Pixel, Raster};

/// Component indices of a [`Pixel`] in RGB order.
pub mod color {
    /// Red component
    pub const RED: usize = 0;
    /// Green component
    pub const GREEN: usize = 1;
    /// Blue component
    pub const BLUE: usize = 2;

    /// Number of components per pixel
    pub const COMPONENTS: usize = 3;
}
