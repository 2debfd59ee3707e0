// src/grid.rs

use std::ops::Range;

use crate::error::{DiffusionError, Result};

/// Uniform 2D finite-difference grid.
///
/// `nx` and `ny` count every stored cell, ghost layer included. The outer
/// `halo` rows and columns on each side hold boundary values; the interior
/// `[halo, nx-1-halo] x [halo, ny-1-halo]` is what the solver updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid2D {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    pub halo: usize,
}

impl Grid2D {
    /// Create a grid with nx × ny stored cells, spacings dx, dy and a ghost layer of width `halo`.
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, halo: usize) -> Result<Self> {
        if !(dx.is_finite() && dy.is_finite() && dx > 0.0 && dy > 0.0) {
            return Err(DiffusionError::InvalidSpacing { dx, dy });
        }
        if halo == 0 {
            return Err(DiffusionError::invalid("halo", "ghost layer must be at least one cell wide"));
        }
        if nx <= 2 * halo || ny <= 2 * halo {
            return Err(DiffusionError::invalid(
                "nx/ny",
                format!("{}x{} grid leaves no interior inside a halo of {}", nx, ny, halo),
            ));
        }
        Ok(Self { nx, ny, dx, dy, halo })
    }

    /// Total number of stored cells.
    pub fn n_cells(&self) -> usize {
        self.nx * self.ny
    }

    /// Number of cells the solver updates.
    pub fn n_interior(&self) -> usize {
        (self.nx - 2 * self.halo) * (self.ny - 2 * self.halo)
    }

    /// Interior column range.
    pub fn cols(&self) -> Range<usize> {
        self.halo..self.nx - self.halo
    }

    /// Interior row range.
    pub fn rows(&self) -> Range<usize> {
        self.halo..self.ny - self.halo
    }

    /// (nx, ny, halo), used for shape comparisons between buffers.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.halo)
    }

    /// Convert (i, j) indices to a flat index into a 1D array.
    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny);
        j * self.nx + i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indexing_is_consistent() {
        let g = Grid2D::new(4, 3, 1.0, 1.0, 1).unwrap();
        assert_eq!(g.idx(0, 0), 0);
        assert_eq!(g.idx(1, 0), 1);
        assert_eq!(g.idx(0, 1), 4);
        assert_eq!(g.idx(3, 2), 11); // (j=2)*4 + i=3 = 11
        assert_eq!(g.n_cells(), 12);
        assert_eq!(g.n_interior(), 2);
        assert_eq!(g.cols(), 1..3);
        assert_eq!(g.rows(), 1..2);
    }

    #[test]
    fn rejects_degenerate_geometry() {
        assert!(matches!(
            Grid2D::new(8, 8, 0.0, 1.0, 1),
            Err(DiffusionError::InvalidSpacing { .. })
        ));
        assert!(Grid2D::new(8, 8, 1.0, f64::NAN, 1).is_err());
        assert!(Grid2D::new(4, 8, 1.0, 1.0, 2).is_err());
        assert!(Grid2D::new(8, 8, 1.0, 1.0, 0).is_err());
    }
}
