//! Channel planes and raster <-> plane conversion
//!
//! Filtering works on a single intensity channel. A [`ChannelPlane`] is
//! extracted from a [`Raster`] with an [`Extraction`] rule and written back
//! with a [`Mapping`] rule. Both directions require the plane and the
//! raster to have exactly the same dimensions; a mismatch is reported as
//! [`Error::DimensionMismatch`] instead of truncating.

use std::fmt;
use std::str::FromStr;

use crate::color::{BLUE, GREEN, RED};
use crate::error::{Error, Result};
use crate::raster::{Pixel, Raster, alloc_grid, grid_len};

/// Rule reducing a pixel to one intensity sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Extraction {
    /// `(r + g + b) / 3`, truncating
    #[default]
    Average,
    /// Red component only
    Red,
    /// Green component only
    Green,
    /// Blue component only
    Blue,
}

impl Extraction {
    /// Reduce one pixel.
    #[inline]
    pub fn apply(self, pixel: Pixel) -> u8 {
        match self {
            Extraction::Average => {
                ((pixel.r as u16 + pixel.g as u16 + pixel.b as u16) / 3) as u8
            }
            Extraction::Red => pixel.r,
            Extraction::Green => pixel.g,
            Extraction::Blue => pixel.b,
        }
    }

    /// Stable numeric code used on the wire.
    pub fn code(self) -> u32 {
        match self {
            Extraction::Average => 0,
            Extraction::Red => 1,
            Extraction::Green => 2,
            Extraction::Blue => 3,
        }
    }

    /// Inverse of [`Extraction::code`].
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Extraction::Average),
            1 => Ok(Extraction::Red),
            2 => Ok(Extraction::Green),
            3 => Ok(Extraction::Blue),
            _ => Err(Error::InvalidParameter(format!(
                "unknown extraction code {code}"
            ))),
        }
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Extraction::Average => "average",
            Extraction::Red => "red",
            Extraction::Green => "green",
            Extraction::Blue => "blue",
        };
        f.write_str(name)
    }
}

impl FromStr for Extraction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(Extraction::Average),
            "red" => Ok(Extraction::Red),
            "green" => Ok(Extraction::Green),
            "blue" => Ok(Extraction::Blue),
            _ => Err(Error::InvalidParameter(format!(
                "unknown extraction '{s}' (expected average, red, green or blue)"
            ))),
        }
    }
}

/// Rule expanding one intensity sample back into a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mapping {
    /// Write the sample to all three components
    #[default]
    Equal,
    /// Write only the red component
    Red,
    /// Write only the green component
    Green,
    /// Write only the blue component
    Blue,
}

impl Mapping {
    /// Expand `sample` into `prior`, the pixel currently in the raster.
    #[inline]
    pub fn apply(self, prior: Pixel, sample: u8) -> Pixel {
        match self {
            Mapping::Equal => Pixel::gray(sample),
            Mapping::Red => prior.with_component(RED, sample),
            Mapping::Green => prior.with_component(GREEN, sample),
            Mapping::Blue => prior.with_component(BLUE, sample),
        }
    }

    /// Stable numeric code used on the wire.
    pub fn code(self) -> u32 {
        match self {
            Mapping::Equal => 0,
            Mapping::Red => 1,
            Mapping::Green => 2,
            Mapping::Blue => 3,
        }
    }

    /// Inverse of [`Mapping::code`].
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Mapping::Equal),
            1 => Ok(Mapping::Red),
            2 => Ok(Mapping::Green),
            3 => Ok(Mapping::Blue),
            _ => Err(Error::InvalidParameter(format!(
                "unknown mapping code {code}"
            ))),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mapping::Equal => "equal",
            Mapping::Red => "red",
            Mapping::Green => "green",
            Mapping::Blue => "blue",
        };
        f.write_str(name)
    }
}

impl FromStr for Mapping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equal" => Ok(Mapping::Equal),
            "red" => Ok(Mapping::Red),
            "green" => Ok(Mapping::Green),
            "blue" => Ok(Mapping::Blue),
            _ => Err(Error::InvalidParameter(format!(
                "unknown mapping '{s}' (expected equal, red, green or blue)"
            ))),
        }
    }
}

/// Single-channel 8-bit plane, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ChannelPlane {
    /// Create a zeroed plane.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            width,
            height,
            data: alloc_grid(width, height, 0)?,
        })
    }

    /// Wrap an existing row-major sample buffer.
    pub fn from_samples(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = grid_len(width, height)?;
        if data.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap a buffer whose height is implied by its length.
    pub fn from_rows(width: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || data.len() % width as usize != 0 {
            return Err(Error::InvalidParameter(format!(
                "{} samples do not form whole rows of width {}",
                data.len(),
                width
            )));
        }
        let height = u32::try_from(data.len() / width as usize)
            .map_err(|_| Error::InvalidParameter("row count exceeds u32".into()))?;
        Self::from_samples(width, height, data)
    }

    /// Allocate a plane the size of `raster` and extract into it.
    pub fn extract(raster: &Raster, rule: Extraction) -> Result<Self> {
        let mut plane = Self::new(raster.width(), raster.height())?;
        extract_channel(&mut plane, raster, rule)?;
        Ok(plane)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.data
    }

    /// Get the sample at `(x, y)`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// Set the sample at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, value: u8) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: y as usize * self.width as usize + x as usize,
                len: self.data.len(),
            });
        }
        self.data[y as usize * self.width as usize + x as usize] = value;
        Ok(())
    }

    /// Samples of row `y`.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(&self.data[start..start + self.width as usize])
    }

    /// Copy `rows` rows starting at `start` into a new plane.
    pub fn crop_rows(&self, start: u32, rows: u32) -> Result<Self> {
        let Some(end) = start.checked_add(rows).filter(|&end| end <= self.height) else {
            return Err(Error::InvalidParameter(format!(
                "row range {}..{} exceeds height {}",
                start,
                start as u64 + rows as u64,
                self.height
            )));
        };
        let w = self.width as usize;
        Self::from_samples(
            self.width,
            rows,
            self.data[start as usize * w..end as usize * w].to_vec(),
        )
    }
}

fn check_same_size(plane: &ChannelPlane, raster: &Raster) -> Result<()> {
    if plane.dimensions() != raster.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: raster.dimensions(),
            actual: plane.dimensions(),
        });
    }
    Ok(())
}

/// Reduce every pixel of `raster` into `plane`.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the sizes differ.
pub fn extract_channel(plane: &mut ChannelPlane, raster: &Raster, rule: Extraction) -> Result<()> {
    check_same_size(plane, raster)?;
    for (dst, &px) in plane.data.iter_mut().zip(raster.pixels()) {
        *dst = rule.apply(px);
    }
    Ok(())
}

/// Expand every sample of `plane` into `raster`.
///
/// Single-component rules leave the other two components of each pixel
/// untouched.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the sizes differ.
pub fn map_channel(raster: &mut Raster, plane: &ChannelPlane, rule: Mapping) -> Result<()> {
    check_same_size(plane, raster)?;
    for (px, &sample) in raster.pixels_mut().iter_mut().zip(&plane.data) {
        *px = rule.apply(*px, sample);
    }
    Ok(())
}
