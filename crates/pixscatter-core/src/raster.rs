//! Raster - the RGB image container
//!
//! A `Raster` owns `width * height` [`Pixel`] values stored row-major, so
//! the pixel at column `x` of row `y` lives at index `y * width + x`.
//! Row-major order matters for the distributed pipeline: a contiguous row
//! range of the image is a contiguous slice of the pixel buffer, which is
//! what the scatter/gather transport moves between ranks.

use crate::color::{BLUE, GREEN, RED};
use crate::error::{Error, Result};

/// A single RGB pixel with 8 bits per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "mpi", derive(mpi::traits::Equivalence))]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    /// Create a pixel from its components.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A pixel with all three components set to `value`.
    #[inline]
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// Components in RGB order.
    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Build a pixel from components in RGB order.
    #[inline]
    pub fn from_array(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    /// Get a component by index (see [`crate::color`]).
    ///
    /// Returns `None` for an index other than `RED`, `GREEN` or `BLUE`.
    #[inline]
    pub fn component(self, index: usize) -> Option<u8> {
        match index {
            RED => Some(self.r),
            GREEN => Some(self.g),
            BLUE => Some(self.b),
            _ => None,
        }
    }

    /// Return a copy of this pixel with one component replaced.
    #[inline]
    pub fn with_component(self, index: usize, value: u8) -> Self {
        match index {
            RED => Self { r: value, ..self },
            GREEN => Self { g: value, ..self },
            BLUE => Self { b: value, ..self },
            _ => self,
        }
    }
}

/// Number of elements in a `width x height` grid.
///
/// The grid must fit in a single allocation when stored as [`Pixel`]s,
/// the widest element any grid holds.
///
/// # Errors
///
/// Returns [`Error::InvalidDimension`] if either side is zero and
/// [`Error::AllocationFailed`] if the grid could never be allocated.
pub(crate) fn grid_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension { width, height });
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or(Error::AllocationFailed { width, height })?;
    match len.checked_mul(std::mem::size_of::<Pixel>()) {
        Some(bytes) if bytes <= isize::MAX as usize => Ok(len),
        _ => Err(Error::AllocationFailed { width, height }),
    }
}

/// Allocate a `width x height` grid filled with `value`.
///
/// # Errors
///
/// Returns [`Error::AllocationFailed`] instead of aborting when the
/// allocator cannot provide the buffer.
pub(crate) fn alloc_grid<T: Clone>(width: u32, height: u32, value: T) -> Result<Vec<T>> {
    let len = grid_len(width, height)?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed { width, height })?;
    data.resize(len, value);
    Ok(data)
}

/// Row-major RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<Pixel>,
}

impl Raster {
    /// Create a black raster.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, Pixel::default())
    }

    /// Create a raster with every pixel set to `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self> {
        Ok(Self {
            width,
            height,
            data: alloc_grid(width, height, pixel)?,
        })
    }

    /// Wrap an existing row-major pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if `data.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, data: Vec<Pixel>) -> Result<Self> {
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
    ///
    /// Used on the receiving side of a row scatter, where only the width
    /// and the delivered pixels are known.
    pub fn from_rows(width: u32, data: Vec<Pixel>) -> Result<Self> {
        if width == 0 || data.len() % width as usize != 0 {
            return Err(Error::InvalidParameter(format!(
                "{} pixels do not form whole rows of width {}",
                data.len(),
                width
            )));
        }
        let height = u32::try_from(data.len() / width as usize)
            .map_err(|_| Error::InvalidParameter("row count exceeds u32".into()))?;
        Self::from_pixels(width, height, data)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.data
    }

    /// Mutable access to all pixels in row-major order.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.data
    }

    /// Consume the raster and return its pixel buffer.
    pub fn into_pixels(self) -> Vec<Pixel> {
        self.data
    }

    /// Get the pixel at `(x, y)`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[self.index(x, y)])
    }

    /// Set the pixel at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: y as usize * self.width as usize + x as usize,
                len: self.data.len(),
            });
        }
        let idx = self.index(x, y);
        self.data[idx] = pixel;
        Ok(())
    }

    /// Pixels of row `y`.
    pub fn row(&self, y: u32) -> Option<&[Pixel]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(&self.data[start..start + self.width as usize])
    }

    /// Copy `rows` rows starting at `start` into a new raster.
    pub fn crop_rows(&self, start: u32, rows: u32) -> Result<Self> {
        let end = start.checked_add(rows).filter(|&end| end <= self.height);
        let Some(end) = end else {
            return Err(Error::InvalidParameter(format!(
                "row range {}..{} exceeds height {}",
                start,
                start as u64 + rows as u64,
                self.height
            )));
        };
        let w = self.width as usize;
        let data = self.data[start as usize * w..end as usize * w].to_vec();
        Self::from_pixels(self.width, rows, data)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
