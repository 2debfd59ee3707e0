// src/error.rs

use thiserror::Error;

/// Everything that can go wrong in the solver core and its I/O layer.
///
/// The numerical core operates on pre-validated inputs, so most of these are
/// precondition failures: a caller handed over a time step, buffer shape or
/// elapsed time that would otherwise corrupt results silently.
#[derive(Debug, Error)]
pub enum DiffusionError {
    /// Explicit Euler step exceeds the stability bound h^2 / (4 D).
    #[error("time step dt = {dt} exceeds the explicit stability limit {limit}")]
    InvalidTimeStep { dt: f64, limit: f64 },

    /// The analytical solution is singular at t = 0.
    #[error("analytical solution requested at non-positive elapsed time t = {elapsed}")]
    ZeroElapsedTime { elapsed: f64 },

    /// The stencil reaches further than the ghost layer.
    #[error("stencil radius {radius} exceeds halo width {halo}")]
    HaloTooNarrow { radius: usize, halo: usize },

    #[error("field shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("grid spacing must be positive and finite (dx = {dx}, dy = {dy})")]
    InvalidSpacing { dx: f64, dy: f64 },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// plotters errors are generic over the backend, so they are flattened to text.
    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, DiffusionError>;

impl DiffusionError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
