//! pixscatter-filter - Single-channel convolution
//!
//! This crate provides:
//!
//! - [`Kernel`] and the named kernel catalog ([`KernelName`])
//! - The convolution engine ([`apply_kernel`]), zero-padded at the plane
//!   edges and saturating to `[0, 255]`
//! - The iteration controller ([`iterate`]) that ping-pongs between two
//!   buffers

pub mod convolve;
mod error;
pub mod iterate;
pub mod kernel;

pub use convolve::{apply_kernel, convolve_plane};
pub use error::{FilterError, FilterResult};
pub use iterate::{PingPong, iterate};
pub use kernel::{Kernel, KernelName};
