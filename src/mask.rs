// src/mask.rs
//
// Discrete Laplacian stencils.
//
// Masks are stored as a dense (2 nm + 1)^2 coefficient grid, row = y offset,
// column = x offset, with the centre at (nm, nm). Entries that a stencil does
// not use stay zero, so the convolution can sweep the whole square.

use tracing::warn;

use crate::error::{DiffusionError, Result};

/// Laplacian stencil selection, keyed by the benchmark's numeric `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stencil {
    /// 5-point, second order, radius 1 (code 53).
    FivePoint,
    /// Compact 9-point, radius 1 (code 93).
    NinePoint,
    /// Wide 13-point, fourth order, radius 2 (code 135).
    ThirteenPoint,
}

impl Stencil {
    /// Map a stencil code to a stencil. Unknown codes fall back to 5-point.
    pub fn from_code(code: u32) -> Self {
        match code {
            53 => Self::FivePoint,
            93 => Self::NinePoint,
            135 => Self::ThirteenPoint,
            other => {
                warn!(code = other, "unknown stencil code, using 5-point Laplacian");
                Self::FivePoint
            }
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::FivePoint => 53,
            Self::NinePoint => 93,
            Self::ThirteenPoint => 135,
        }
    }

    /// Stencil radius `nm`; the field halo must be at least this wide.
    pub fn radius(&self) -> usize {
        match self {
            Self::FivePoint | Self::NinePoint => 1,
            Self::ThirteenPoint => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FivePoint => "5-point",
            Self::NinePoint => "9-point",
            Self::ThirteenPoint => "13-point",
        }
    }
}

/// Immutable Laplacian mask of side `2 * radius + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilMask {
    radius: usize,
    coeffs: Vec<f64>,
}

impl StencilMask {
    /// Build the mask for `stencil` at spacing (dx, dy).
    pub fn new(stencil: Stencil, dx: f64, dy: f64) -> Result<Self> {
        let mut mask = Self::zeros(stencil.radius());
        let radius = set_mask(dx, dy, stencil, &mut mask)?;
        debug_assert_eq!(radius, mask.radius);
        Ok(mask)
    }

    fn zeros(radius: usize) -> Self {
        let side = 2 * radius + 1;
        Self {
            radius,
            coeffs: vec![0.0; side * side],
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    /// Coefficient at row `my`, column `mx` (both in 0..side).
    #[inline]
    pub fn at(&self, my: usize, mx: usize) -> f64 {
        debug_assert!(my < self.side() && mx < self.side());
        self.coeffs[my * self.side() + mx]
    }

    /// Mask rows, top (most negative y offset) first.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.coeffs.chunks_exact(self.side())
    }

    /// Sum of all coefficients; zero for a consistent Laplacian.
    pub fn sum(&self) -> f64 {
        self.coeffs.iter().sum()
    }

    fn put(&mut self, my: usize, mx: usize, value: f64) {
        let side = self.side();
        self.coeffs[my * side + mx] = value;
    }
}

/// Write the Laplacian coefficients for `stencil` into `mask` and return the
/// stencil radius actually used. `mask` is resized to fit.
pub fn set_mask(dx: f64, dy: f64, stencil: Stencil, mask: &mut StencilMask) -> Result<usize> {
    if !(dx.is_finite() && dy.is_finite() && dx > 0.0 && dy > 0.0) {
        return Err(DiffusionError::InvalidSpacing { dx, dy });
    }

    *mask = StencilMask::zeros(stencil.radius());
    let (dx2, dy2) = (dx * dx, dy * dy);

    match stencil {
        Stencil::FivePoint => {
            mask.put(0, 1, 1.0 / dy2); // up
            mask.put(1, 0, 1.0 / dx2); // left
            mask.put(1, 1, -2.0 * (dx2 + dy2) / (dx2 * dy2));
            mask.put(1, 2, 1.0 / dx2); // right
            mask.put(2, 1, 1.0 / dy2); // down
        }
        Stencil::NinePoint => {
            let corner = 1.0 / (6.0 * dx * dy);
            mask.put(0, 0, corner);
            mask.put(0, 1, 4.0 / (6.0 * dy2));
            mask.put(0, 2, corner);
            mask.put(1, 0, 4.0 / (6.0 * dx2));
            mask.put(1, 1, -10.0 * (dx2 + dy2) / (6.0 * dx2 * dy2));
            mask.put(1, 2, 4.0 / (6.0 * dx2));
            mask.put(2, 0, corner);
            mask.put(2, 1, 4.0 / (6.0 * dy2));
            mask.put(2, 2, corner);
        }
        Stencil::ThirteenPoint => {
            mask.put(0, 2, -1.0 / (12.0 * dy2));
            mask.put(1, 2, 4.0 / (3.0 * dy2));
            mask.put(2, 0, -1.0 / (12.0 * dx2));
            mask.put(2, 1, 4.0 / (3.0 * dx2));
            mask.put(2, 2, -5.0 * (dx2 + dy2) / (2.0 * dx2 * dy2));
            mask.put(2, 3, 4.0 / (3.0 * dx2));
            mask.put(2, 4, -1.0 / (12.0 * dx2));
            mask.put(3, 2, 4.0 / (3.0 * dy2));
            mask.put(4, 2, -1.0 / (12.0 * dy2));
        }
    }

    Ok(mask.radius)
}
