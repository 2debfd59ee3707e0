// src/residual.rs
//
// Accuracy check against the analytical solution.
//
// Each source is a half-wall: the left one covers rows j < ny/2 of the first
// interior column, the right one rows j >= ny/2 of the last interior column.
// A cell level with a source is measured straight across to it; any other cell
// is measured to the wall's end point, the nearest point of the half-line.
// The reference value is the superposition of both erfc profiles.

use crate::analytical::{diffusion_width, profile};
use crate::boundaries::BoundaryValues;
use crate::error::Result;
use crate::field::ScalarField2D;
use crate::grid::Grid2D;
use crate::tiling::{ExecConfig, map_tiles, pairwise_sum};

/// Distances from interior cell (i, j) to the left and right sources.
#[inline]
fn source_distances(grid: &Grid2D, i: usize, j: usize) -> (f64, f64) {
    let mid = grid.ny / 2;
    let h = grid.halo;

    let xl = grid.dx * (i - h) as f64;
    let left = if j < mid {
        xl
    } else {
        xl.hypot(grid.dy * (j - mid) as f64)
    };

    let xr = grid.dx * (grid.nx - 1 - h - i) as f64;
    let right = if j >= mid {
        xr
    } else {
        xr.hypot(grid.dy * (mid - j) as f64)
    };

    (left, right)
}

/// Superposed analytical concentration at (i, j) for `width = sqrt(4 D t)`.
#[inline]
pub(crate) fn superposed_value(grid: &Grid2D, i: usize, j: usize, width: f64, bc: &BoundaryValues) -> f64 {
    let (xl, xr) = source_distances(grid, i, j);
    profile(xl, width, bc.left) + profile(xr, width, bc.right)
}

/// Mean squared deviation of `a` from the two-source analytical solution,
/// averaged over the interior cells.
///
/// Per-tile partial sums are reduced with a pairwise join in tile order, so
/// the result is deterministic for a given tile size and agrees across tile
/// sizes to rounding. Fails with `ZeroElapsedTime` for `elapsed <= 0`.
pub fn check_solution(
    a: &ScalarField2D,
    elapsed: f64,
    diffusivity: f64,
    bc: &BoundaryValues,
    exec: &ExecConfig,
) -> Result<f64> {
    let width = diffusion_width(elapsed, diffusivity)?;
    let grid = a.grid;

    let partials = map_tiles(exec, &grid, |tile| {
        let mut sum = 0.0;
        for j in tile.rows.clone() {
            let row = a.row(j);
            for i in tile.cols.clone() {
                let diff = superposed_value(&grid, i, j, width, bc) - row[i];
                sum += diff * diff;
            }
        }
        sum
    });

    Ok(pairwise_sum(&partials) / grid.n_interior() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffusionError;
    use approx::assert_relative_eq;

    fn grid() -> Grid2D {
        Grid2D::new(50, 44, 0.5, 0.4, 1).unwrap()
    }

    fn analytical_field(grid: Grid2D, elapsed: f64, d: f64, bc: &BoundaryValues) -> ScalarField2D {
        let width = diffusion_width(elapsed, d).unwrap();
        let mut f = ScalarField2D::new(grid);
        for j in grid.rows() {
            for i in grid.cols() {
                f.set(i, j, superposed_value(&grid, i, j, width, bc));
            }
        }
        f
    }

    #[test]
    fn distances_follow_the_half_walls() {
        let g = grid();
        let mid = g.ny / 2;
        // first interior column, lower half: on the left source
        assert_eq!(source_distances(&g, 1, 3).0, 0.0);
        // upper half: measured to the end of the left wall
        let (l, _) = source_distances(&g, 4, mid + 3);
        assert_relative_eq!(l, (1.5f64 * 1.5 + 1.2 * 1.2).sqrt());
        // last interior column, upper half: on the right source
        assert_eq!(source_distances(&g, g.nx - 2, mid).1, 0.0);
        let (_, r) = source_distances(&g, g.nx - 2, mid - 2);
        assert_relative_eq!(r, 0.8);
    }

    #[test]
    fn exact_solution_has_zero_residual() {
        let g = grid();
        let bc = BoundaryValues::default();
        let a = analytical_field(g, 40.0, 0.02, &bc);
        let rss = check_solution(&a, 40.0, 0.02, &bc, &ExecConfig::default()).unwrap();
        assert_eq!(rss, 0.0);
    }

    #[test]
    fn uniform_offset_gives_its_square() {
        let g = grid();
        let bc = BoundaryValues::default();
        let mut a = analytical_field(g, 10.0, 0.05, &bc);
        for j in g.rows() {
            for i in g.cols() {
                let v = a.get(i, j);
                a.set(i, j, v + 0.1);
            }
        }
        let rss = check_solution(&a, 10.0, 0.05, &bc, &ExecConfig::default()).unwrap();
        assert_relative_eq!(rss, 0.01, max_relative = 1e-10);
    }

    #[test]
    fn residual_is_invariant_to_tile_size() {
        let g = grid();
        let bc = BoundaryValues::default();
        let mut a = ScalarField2D::new(g);
        for (k, v) in a.data.iter_mut().enumerate() {
            *v = (k % 17) as f64 / 17.0;
        }
        let full = g.nx.max(g.ny);
        let reference = check_solution(&a, 25.0, 0.01, &bc, &ExecConfig::serial(full).unwrap()).unwrap();
        for exec in [
            ExecConfig::serial(1).unwrap(),
            ExecConfig::serial(8).unwrap(),
            ExecConfig::rayon(1).unwrap(),
            ExecConfig::rayon(8).unwrap(),
            ExecConfig::rayon(full).unwrap(),
        ] {
            let rss = check_solution(&a, 25.0, 0.01, &bc, &exec).unwrap();
            assert_relative_eq!(rss, reference, max_relative = 1e-10);
        }
    }

    #[test]
    fn zero_elapsed_time_is_rejected() {
        let g = grid();
        let a = ScalarField2D::new(g);
        let err = check_solution(&a, 0.0, 0.01, &BoundaryValues::default(), &ExecConfig::default());
        assert!(matches!(err, Err(DiffusionError::ZeroElapsedTime { .. })));
    }
}
