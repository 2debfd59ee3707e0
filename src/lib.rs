// src/lib.rs

pub mod analytical;
pub mod boundaries;
pub mod config;
pub mod convolution;
pub mod error;
pub mod field;
pub mod grid;
pub mod integrator;
pub mod mask;
pub mod output;
pub mod params;
pub mod residual;
pub mod solver;
pub mod tiling;
pub mod visualisation;

pub use error::{DiffusionError, Result};
