//! Color inversion
//!
//! Component-wise `255 - c`. Works on bare pixel slices so a worker can
//! invert a received row partition without knowing the image geometry.

use crate::raster::{Pixel, Raster};

impl Pixel {
    /// Component-wise `255 - c`.
    #[inline]
    pub fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }
}

/// Invert every pixel of a slice in place.
pub fn invert_pixels(pixels: &mut [Pixel]) {
    for px in pixels {
        *px = px.inverted();
    }
}

/// Invert every pixel of a raster in place.
pub fn invert_raster(raster: &mut Raster) {
    invert_pixels(raster.pixels_mut());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted() {
        assert_eq!(Pixel::new(200, 100, 50).inverted(), Pixel::new(55, 155, 205));
        assert_eq!(Pixel::new(0, 255, 128).inverted(), Pixel::new(255, 0, 127));
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let mut r = Raster::filled(3, 2, Pixel::new(1, 2, 3)).unwrap();
        let orig = r.clone();
        invert_raster(&mut r);
        assert_ne!(r, orig);
        invert_raster(&mut r);
        assert_eq!(r, orig);
    }
}
