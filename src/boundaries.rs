// src/boundaries.rs
//
// Boundary and initial conditions for the two half-wall sources.
//
// Layout (j increases upward, ny/2 = mid):
//
//   j >= mid : right source pinned on columns nx-1-halo .. nx-1
//   j <  mid : left source pinned on columns 0 ..= halo
//
// Everywhere else the ghost layer mirrors the interior (zero flux).

use serde::{Deserialize, Serialize};

use crate::field::ScalarField2D;

/// Boundary concentrations. `left` and `right` are the two source values,
/// `background` fills the domain at t = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryValues {
    pub background: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for BoundaryValues {
    fn default() -> Self {
        Self {
            background: 0.0,
            left: 1.0,
            right: 1.0,
        }
    }
}

/// Fill the field with the background value, then apply boundary conditions.
pub fn apply_initial_conditions(field: &mut ScalarField2D, bc: &BoundaryValues) {
    field.fill(bc.background);
    apply_boundary_conditions(field, bc);
}

/// Refresh ghost cells and source pins. Must run before every convolution.
pub fn apply_boundary_conditions(field: &mut ScalarField2D, bc: &BoundaryValues) {
    let g = field.grid;
    let (nx, ny, h) = (g.nx, g.ny, g.halo);

    // zero flux: mirror columns, then rows (rows pick up the mirrored corners)
    for j in 0..ny {
        for k in 0..h {
            let v = field.get(h + k, j);
            field.set(h - 1 - k, j, v);
            let v = field.get(nx - h - 1 - k, j);
            field.set(nx - h + k, j, v);
        }
    }
    for k in 0..h {
        for i in 0..nx {
            let v = field.get(i, h + k);
            field.set(i, h - 1 - k, v);
            let v = field.get(i, ny - h - 1 - k);
            field.set(i, ny - h + k, v);
        }
    }

    // fixed sources, ghost columns plus the first interior column
    let mid = ny / 2;
    for j in 0..mid {
        for i in 0..=h {
            field.set(i, j, bc.left);
        }
    }
    for j in mid..ny {
        for i in nx - 1 - h..nx {
            field.set(i, j, bc.right);
        }
    }
}
