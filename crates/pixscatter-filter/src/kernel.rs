//! Convolution kernels
//!
//! A [`Kernel`] is a square, odd-sized matrix of integer weights plus a
//! floating-point normalization factor. The catalog kernels are `'static`
//! constants looked up through [`KernelName`]; nothing mutates them after
//! construction, so every rank can share them freely.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::{FilterError, FilterResult};

/// A square convolution kernel with integer weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    name: Cow<'static, str>,
    /// Side length (odd)
    dim: u32,
    /// Row-major weights, `dim * dim` entries
    weights: Cow<'static, [i32]>,
    /// Multiplied into the weighted sum before clamping
    factor: f32,
}

impl Kernel {
    /// Create a kernel from owned weights.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernel`] if `dim` is even or zero, or if
    /// `weights.len() != dim * dim`.
    pub fn new(dim: u32, weights: Vec<i32>, factor: f32) -> FilterResult<Self> {
        if dim == 0 || dim % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "dimension must be odd and >= 1, got {}",
                dim
            )));
        }
        let expected = dim as usize * dim as usize;
        if weights.len() != expected {
            return Err(FilterError::InvalidKernel(format!(
                "{}x{} kernel needs {} weights, got {}",
                dim,
                dim,
                expected,
                weights.len()
            )));
        }
        if !factor.is_finite() {
            return Err(FilterError::InvalidKernel(format!(
                "factor must be finite, got {}",
                factor
            )));
        }
        Ok(Self {
            name: Cow::Borrowed("custom"),
            dim,
            weights: Cow::Owned(weights),
            factor,
        })
    }

    /// Rename a kernel (used in log output).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Cow::Owned(name.into());
        self
    }

    const fn fixed(name: &'static str, dim: u32, weights: &'static [i32], factor: f32) -> Self {
        Self {
            name: Cow::Borrowed(name),
            dim,
            weights: Cow::Borrowed(weights),
            factor,
        }
    }

    /// Look up a catalog kernel by name.
    pub fn by_name(name: &str) -> FilterResult<&'static Kernel> {
        name.parse::<KernelName>().map(KernelName::kernel)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side length of the kernel.
    #[inline]
    pub fn dim(&self) -> u32 {
        self.dim
    }

    /// Rows (and columns) of context needed on each side of a cell.
    #[inline]
    pub fn radius(&self) -> u32 {
        self.dim / 2
    }

    #[inline]
    pub fn weights(&self) -> &[i32] {
        &self.weights
    }

    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Weight at column `kx`, row `ky`.
    #[inline]
    pub fn get(&self, kx: u32, ky: u32) -> Option<i32> {
        if kx >= self.dim || ky >= self.dim {
            return None;
        }
        Some(self.weights[(ky * self.dim + kx) as usize])
    }
}

const IDENTITY_WEIGHTS: [i32; 1] = [1];

const SOBEL_Y_WEIGHTS: [i32; 9] = [
    -1, -2, -1, //
    0, 0, 0, //
    1, 2, 1,
];

// Not the antisymmetric textbook operator: both outer columns are negative,
// so the response to non-negative input is never positive.
const SOBEL_X_WEIGHTS: [i32; 9] = [
    -1, 0, -1, //
    -2, 0, -2, //
    -1, 0, -1,
];

const LAPLACIAN1_WEIGHTS: [i32; 9] = [
    -1, -4, -1, //
    -4, 20, -4, //
    -1, -4, -1,
];

const LAPLACIAN2_WEIGHTS: [i32; 9] = [
    0, 1, 0, //
    1, -4, 1, //
    0, 1, 0,
];

const LAPLACIAN3_WEIGHTS: [i32; 9] = [
    -1, -1, -1, //
    -1, 8, -1, //
    -1, -1, -1,
];

const GAUSSIAN_WEIGHTS: [i32; 25] = [
    1, 4, 6, 4, 1, //
    4, 16, 24, 16, 4, //
    6, 24, 36, 24, 6, //
    4, 16, 24, 16, 4, //
    1, 4, 6, 4, 1,
];

static IDENTITY: Kernel = Kernel::fixed("identity", 1, &IDENTITY_WEIGHTS, 1.0);
static SOBEL_Y: Kernel = Kernel::fixed("sobel-y", 3, &SOBEL_Y_WEIGHTS, 1.0);
static SOBEL_X: Kernel = Kernel::fixed("sobel-x", 3, &SOBEL_X_WEIGHTS, 1.0);
static LAPLACIAN1: Kernel = Kernel::fixed("laplacian1", 3, &LAPLACIAN1_WEIGHTS, 1.0);
static LAPLACIAN2: Kernel = Kernel::fixed("laplacian2", 3, &LAPLACIAN2_WEIGHTS, 1.0);
static LAPLACIAN3: Kernel = Kernel::fixed("laplacian3", 3, &LAPLACIAN3_WEIGHTS, 1.0);
// 1 / 256
static GAUSSIAN: Kernel = Kernel::fixed("gaussian", 5, &GAUSSIAN_WEIGHTS, 0.003_906_25);

/// Names of the catalog kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KernelName {
    /// 1x1 pass-through
    Identity,
    /// 3x3 Sobel, vertical gradient
    SobelY,
    /// 3x3 Sobel, horizontal gradient
    SobelX,
    /// 3x3 Laplacian with center weight 20
    #[default]
    Laplacian1,
    /// 3x3 four-neighbour Laplacian
    Laplacian2,
    /// 3x3 eight-neighbour Laplacian
    Laplacian3,
    /// 5x5 binomial blur
    Gaussian,
}

impl KernelName {
    /// Every catalog entry, in wire-code order.
    pub const ALL: [KernelName; 7] = [
        KernelName::Identity,
        KernelName::SobelY,
        KernelName::SobelX,
        KernelName::Laplacian1,
        KernelName::Laplacian2,
        KernelName::Laplacian3,
        KernelName::Gaussian,
    ];

    /// The catalog kernel for this name.
    pub fn kernel(self) -> &'static Kernel {
        match self {
            KernelName::Identity => &IDENTITY,
            KernelName::SobelY => &SOBEL_Y,
            KernelName::SobelX => &SOBEL_X,
            KernelName::Laplacian1 => &LAPLACIAN1,
            KernelName::Laplacian2 => &LAPLACIAN2,
            KernelName::Laplacian3 => &LAPLACIAN3,
            KernelName::Gaussian => &GAUSSIAN,
        }
    }

    /// Stable numeric code used on the wire.
    pub fn code(self) -> u32 {
        match self {
            KernelName::Identity => 0,
            KernelName::SobelY => 1,
            KernelName::SobelX => 2,
            KernelName::Laplacian1 => 3,
            KernelName::Laplacian2 => 4,
            KernelName::Laplacian3 => 5,
            KernelName::Gaussian => 6,
        }
    }

    /// Inverse of [`KernelName::code`].
    pub fn from_code(code: u32) -> FilterResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| FilterError::UnknownKernel(format!("code {}", code)))
    }
}

impl fmt::Display for KernelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel().name())
    }
}

impl FromStr for KernelName {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.kernel().name() == wanted)
            .ok_or_else(|| FilterError::UnknownKernel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_invariants() {
        for name in KernelName::ALL {
            let k = name.kernel();
            assert_eq!(k.dim() % 2, 1, "{} has even dimension", k.name());
            assert_eq!(k.weights().len(), (k.dim() * k.dim()) as usize);
            assert_eq!(KernelName::from_code(name.code()).unwrap(), name);
            assert_eq!(name.to_string().parse::<KernelName>().unwrap(), name);
        }
    }

    #[test]
    fn test_gaussian_factor_normalizes() {
        let k = KernelName::Gaussian.kernel();
        let sum: i32 = k.weights().iter().sum();
        assert_eq!(sum, 256);
        assert_eq!(sum as f32 * k.factor(), 1.0);
    }

    #[test]
    fn test_sobel_x_table() {
        let k = KernelName::SobelX.kernel();
        assert_eq!(k.weights(), &[-1, 0, -1, -2, 0, -2, -1, 0, -1]);
        assert_eq!(k.weights().iter().sum::<i32>(), -8);
        assert_eq!(k.factor(), 1.0);
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Kernel::by_name("LAPLACIAN1").unwrap().get(1, 1), Some(20));
        assert_eq!(Kernel::by_name("sobel_x").unwrap().dim(), 3);
        assert!(matches!(
            Kernel::by_name("emboss"),
            Err(FilterError::UnknownKernel(_))
        ));
    }

    #[test]
    fn test_new_validation() {
        assert!(Kernel::new(2, vec![1; 4], 1.0).is_err());
        assert!(Kernel::new(0, vec![], 1.0).is_err());
        assert!(Kernel::new(3, vec![1; 8], 1.0).is_err());
        assert!(Kernel::new(3, vec![1; 9], f32::NAN).is_err());
        let k = Kernel::new(3, vec![1; 9], 0.5).unwrap().with_name("box");
        assert_eq!(k.name(), "box");
        assert_eq!(k.radius(), 1);
        assert_eq!(k.get(3, 0), None);
    }
}
