// src/convolution.rs

use crate::error::{DiffusionError, Result};
use crate::field::ScalarField2D;
use crate::mask::StencilMask;
use crate::tiling::{ExecConfig, for_each_tile_mut};

/// Apply `mask` to every interior cell of `a`, writing the result into `c`.
///
/// C[j][i] = sum_{mj, mi in [-nm, nm]} M[mj+nm][mi+nm] * A[j+mj][i+mi]
///
/// Halo cells of `c` are left untouched; halo cells of `a` must already hold
/// boundary values. Output does not depend on the tile size or schedule.
pub fn compute_convolution(
    a: &ScalarField2D,
    c: &mut ScalarField2D,
    mask: &StencilMask,
    exec: &ExecConfig,
) -> Result<()> {
    a.ensure_same_shape(c)?;
    let nm = mask.radius();
    if nm > a.grid.halo {
        return Err(DiffusionError::HaloTooNarrow {
            radius: nm,
            halo: a.grid.halo,
        });
    }

    let grid = a.grid;
    for_each_tile_mut(exec, &grid, &mut c.data, |tile| {
        let cols = tile.cols.clone();
        for (j, out) in tile.rows_mut() {
            for (cell, i) in out.iter_mut().zip(cols.clone()) {
                let mut value = 0.0;
                for (my, weights) in mask.rows().enumerate() {
                    // Row j + (my - nm), columns i - nm ..= i + nm
                    let src = &a.row(j + my - nm)[i - nm..=i + nm];
                    for (w, v) in weights.iter().zip(src) {
                        value += w * v;
                    }
                }
                *cell = value;
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid2D;
    use crate::mask::Stencil;

    fn grid(nx: usize, ny: usize, halo: usize) -> Grid2D {
        Grid2D::new(nx, ny, 0.5, 0.25, halo).unwrap()
    }

    #[test]
    fn constant_field_has_zero_laplacian() {
        let g = grid(40, 33, 1);
        let a = ScalarField2D::filled(g, 0.75);
        let mut c = ScalarField2D::filled(g, 123.0);
        let mask = StencilMask::new(Stencil::FivePoint, g.dx, g.dy).unwrap();
        compute_convolution(&a, &mut c, &mask, &ExecConfig::default()).unwrap();

        for j in g.rows() {
            for i in g.cols() {
                assert_eq!(c.get(i, j), 0.0, "cell ({}, {})", i, j);
            }
        }
        // halo untouched
        assert_eq!(c.get(0, 0), 123.0);
        assert_eq!(c.get(g.nx - 1, 5), 123.0);
    }

    #[test]
    fn compact_stencil_is_exact_on_square_cells() {
        let g = Grid2D::new(24, 20, 0.5, 0.5, 1).unwrap();
        let mut a = ScalarField2D::new(g);
        for j in 0..g.ny {
            for i in 0..g.nx {
                let (x, y) = (i as f64 * g.dx, j as f64 * g.dy);
                a.set(i, j, x * x + 3.0 * y * y);
            }
        }
        let mut c = ScalarField2D::new(g);
        let mask = StencilMask::new(Stencil::NinePoint, g.dx, g.dy).unwrap();
        compute_convolution(&a, &mut c, &mask, &ExecConfig::serial(5).unwrap()).unwrap();
        for j in g.rows() {
            for i in g.cols() {
                assert!((c.get(i, j) - 8.0).abs() < 1e-9, "({}, {}): {}", i, j, c.get(i, j));
            }
        }
    }

    #[test]
    fn quadratic_field_gives_exact_laplacian() {
        // u = x^2 + 3 y^2 -> lap u = 2 + 6 = 8, exact for the 5- and 13-point
        // stencils; the compact 9-point one is exact only for dx == dy
        for stencil in [Stencil::FivePoint, Stencil::ThirteenPoint] {
            let g = grid(24, 20, stencil.radius());
            let mut a = ScalarField2D::new(g);
            for j in 0..g.ny {
                for i in 0..g.nx {
                    let x = i as f64 * g.dx;
                    let y = j as f64 * g.dy;
                    a.set(i, j, x * x + 3.0 * y * y);
                }
            }
            let mut c = ScalarField2D::new(g);
            let mask = StencilMask::new(stencil, g.dx, g.dy).unwrap();
            compute_convolution(&a, &mut c, &mask, &ExecConfig::default()).unwrap();
            for j in g.rows() {
                for i in g.cols() {
                    assert!((c.get(i, j) - 8.0).abs() < 1e-9, "{:?} at ({}, {}): {}", stencil, i, j, c.get(i, j));
                }
            }
        }
    }

    #[test]
    fn result_is_independent_of_tile_and_backend() {
        let g = grid(45, 38, 1);
        let mut a = ScalarField2D::new(g);
        for (k, v) in a.data.iter_mut().enumerate() {
            *v = ((k * 7919) % 101) as f64 / 101.0;
        }
        let mask = StencilMask::new(Stencil::NinePoint, g.dx, g.dy).unwrap();

        let mut reference = ScalarField2D::new(g);
        compute_convolution(&a, &mut reference, &mask, &ExecConfig::serial(1).unwrap()).unwrap();

        for exec in [
            ExecConfig::serial(16).unwrap(),
            ExecConfig::rayon(1).unwrap(),
            ExecConfig::rayon(7).unwrap(),
            ExecConfig::rayon(1000).unwrap(),
        ] {
            let mut c = ScalarField2D::new(g);
            compute_convolution(&a, &mut c, &mask, &exec).unwrap();
            assert_eq!(c, reference, "{:?}", exec);
        }
    }

    #[test]
    fn wide_stencil_needs_wide_halo() {
        let g = grid(16, 16, 1);
        let a = ScalarField2D::new(g);
        let mut c = ScalarField2D::new(g);
        let mask = StencilMask::new(Stencil::ThirteenPoint, g.dx, g.dy).unwrap();
        let err = compute_convolution(&a, &mut c, &mask, &ExecConfig::default()).unwrap_err();
        assert!(matches!(err, DiffusionError::HaloTooNarrow { radius: 2, halo: 1 }));
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let a = ScalarField2D::new(grid(16, 16, 1));
        let mut c = ScalarField2D::new(grid(16, 17, 1));
        let mask = StencilMask::new(Stencil::FivePoint, 0.5, 0.25).unwrap();
        assert!(matches!(
            compute_convolution(&a, &mut c, &mask, &ExecConfig::default()),
            Err(DiffusionError::ShapeMismatch { .. })
        ));
    }
}
