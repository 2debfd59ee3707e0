// src/analytical.rs
//
// Closed-form solution for diffusion from a constant-concentration planar
// source into a semi-infinite medium:
//
//   c(x, t) = chi * (1 - erf(x / sqrt(4 D t)))

use crate::error::{DiffusionError, Result};

/// Concentration at distance `x` from a source held at `chi`, after time `t`,
/// for diffusivity `d`. Fails for `t <= 0`, where the profile is singular.
pub fn analytical_value(x: f64, t: f64, d: f64, chi: f64) -> Result<f64> {
    let width = diffusion_width(t, d)?;
    Ok(profile(x, width, chi))
}

/// sqrt(4 D t), the length scale shared by every cell at a given time.
pub fn diffusion_width(t: f64, d: f64) -> Result<f64> {
    if !(t.is_finite() && t > 0.0) {
        return Err(DiffusionError::ZeroElapsedTime { elapsed: t });
    }
    if !(d.is_finite() && d > 0.0) {
        return Err(DiffusionError::invalid("diffusivity", format!("must be positive, got {}", d)));
    }
    Ok((4.0 * d * t).sqrt())
}

/// Unchecked profile for a precomputed `width = sqrt(4 D t) > 0`.
#[inline]
pub(crate) fn profile(x: f64, width: f64, chi: f64) -> f64 {
    chi * (1.0 - libm::erf(x / width))
}
