// src/field.rs

use crate::error::{DiffusionError, Result};
use crate::grid::Grid2D;

/// Concentration field defined on a 2D grid, ghost layer included.
/// Stored row-major in one contiguous buffer with row stride `grid.nx`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField2D {
    pub grid: Grid2D,
    pub data: Vec<f64>,
}

impl ScalarField2D {
    /// Create a new field on the given grid, initialised to zero.
    pub fn new(grid: Grid2D) -> Self {
        Self::filled(grid, 0.0)
    }

    /// Create a new field with every cell (halo included) set to `value`.
    pub fn filled(grid: Grid2D, value: f64) -> Self {
        Self {
            grid,
            data: vec![value; grid.n_cells()],
        }
    }

    /// Set all cells to the same value.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Get the flat index in `data` for grid indices (i, j).
    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        self.grid.idx(i, j)
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let k = self.idx(i, j);
        self.data[k] = value;
    }

    /// Row `j`, halo columns included.
    #[inline]
    pub fn row(&self, j: usize) -> &[f64] {
        let nx = self.grid.nx;
        &self.data[j * nx..(j + 1) * nx]
    }

    /// Fails unless `other` has the same extents and halo.
    pub fn ensure_same_shape(&self, other: &ScalarField2D) -> Result<()> {
        if self.grid.shape() != other.grid.shape() {
            return Err(DiffusionError::ShapeMismatch {
                expected: self.grid.shape(),
                actual: other.grid.shape(),
            });
        }
        Ok(())
    }

    /// Smallest and largest finite value over the interior, if any.
    pub fn interior_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for j in self.grid.rows() {
            for &v in &self.row(j)[self.grid.cols()] {
                if v.is_finite() {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            }
        }
        (lo <= hi).then_some((lo, hi))
    }
}
