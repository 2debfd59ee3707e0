// src/integrator.rs

use crate::error::Result;
use crate::field::ScalarField2D;
use crate::tiling::{ExecConfig, for_each_tile_mut};

/// Advance the field by one explicit Euler step:
///
/// B[j][i] = A[j][i] + dt * D * C[j][i]   (interior cells only)
///
/// `c` holds the Laplacian of `a`. `elapsed` is advanced by `dt`.
/// No stability check happens here; see `SimParams::check_time_step`.
pub fn step_in_time(
    a: &ScalarField2D,
    b: &mut ScalarField2D,
    c: &ScalarField2D,
    diffusivity: f64,
    dt: f64,
    elapsed: &mut f64,
    exec: &ExecConfig,
) -> Result<()> {
    a.ensure_same_shape(b)?;
    a.ensure_same_shape(c)?;

    let grid = a.grid;
    let rate = dt * diffusivity;
    for_each_tile_mut(exec, &grid, &mut b.data, |tile| {
        let cols = tile.cols.clone();
        for (j, out) in tile.rows_mut() {
            let old = &a.row(j)[cols.clone()];
            let lap = &c.row(j)[cols.clone()];
            for ((next, &u), &l) in out.iter_mut().zip(old).zip(lap) {
                *next = u + rate * l;
            }
        }
    });

    *elapsed += dt;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffusionError;
    use crate::grid::Grid2D;

    fn noisy(g: Grid2D, seed: usize) -> ScalarField2D {
        let mut f = ScalarField2D::new(g);
        for (k, v) in f.data.iter_mut().enumerate() {
            *v = ((k + seed) as u64 * 2_654_435_761 % 1000) as f64 / 1000.0 - 0.5;
        }
        f
    }

    #[test]
    fn zero_diffusivity_leaves_field_unchanged() {
        let g = Grid2D::new(33, 29, 0.5, 0.5, 1).unwrap();
        let a = noisy(g, 1);
        let c = noisy(g, 2);
        for dt in [1e-6, 1.0, 1e6] {
            let mut b = ScalarField2D::new(g);
            let mut elapsed = 0.0;
            step_in_time(&a, &mut b, &c, 0.0, dt, &mut elapsed, &ExecConfig::default()).unwrap();
            for j in g.rows() {
                for i in g.cols() {
                    assert_eq!(b.get(i, j), a.get(i, j));
                }
            }
            assert_eq!(elapsed, dt);
        }
    }

    #[test]
    fn euler_update_and_halo_untouched() {
        let g = Grid2D::new(10, 12, 1.0, 1.0, 1).unwrap();
        let a = ScalarField2D::filled(g, 2.0);
        let c = ScalarField2D::filled(g, -4.0);
        let mut b = ScalarField2D::filled(g, 9.0);
        let mut elapsed = 3.0;
        step_in_time(&a, &mut b, &c, 0.25, 0.5, &mut elapsed, &ExecConfig::serial(3).unwrap()).unwrap();

        assert_eq!(b.get(1, 1), 2.0 - 0.5);
        assert_eq!(b.get(8, 10), 1.5);
        assert_eq!(b.get(0, 4), 9.0);
        assert_eq!(b.get(4, 11), 9.0);
        assert_eq!(elapsed, 3.5);
    }

    #[test]
    fn shape_mismatch_does_not_advance_time() {
        let a = ScalarField2D::new(Grid2D::new(10, 10, 1.0, 1.0, 1).unwrap());
        let c = ScalarField2D::new(Grid2D::new(10, 11, 1.0, 1.0, 1).unwrap());
        let mut b = a.clone();
        let mut elapsed = 0.0;
        let err = step_in_time(&a, &mut b, &c, 1.0, 0.1, &mut elapsed, &ExecConfig::default());
        assert!(matches!(err, Err(DiffusionError::ShapeMismatch { .. })));
        assert_eq!(elapsed, 0.0);
    }
}
