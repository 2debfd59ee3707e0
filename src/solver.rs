// src/solver.rs
//
// Time-stepping driver around the discretization core.
//
// One step:
//   1. C = M * A          (convolution, timed as `conv`)
//   2. B = A + dt D C     (Euler update, timed as `step`)
//   3. swap A <-> B, refresh boundary values on the new A
//
// The residual check (timed as `soln`) always sees a field with valid boundaries.

use std::mem;
use std::time::Instant;

use tracing::debug;

use crate::boundaries::{BoundaryValues, apply_boundary_conditions, apply_initial_conditions};
use crate::convolution::compute_convolution;
use crate::error::{DiffusionError, Result};
use crate::field::ScalarField2D;
use crate::integrator::step_in_time;
use crate::mask::StencilMask;
use crate::params::SimParams;
use crate::residual::check_solution;
use crate::tiling::ExecConfig;

/// Accumulated wall-clock seconds per phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stopwatch {
    pub conv: f64,
    pub step: f64,
    pub file: f64,
    pub soln: f64,
}

impl Stopwatch {
    /// Run `f`, adding its wall time to `slot`.
    pub fn time<T>(slot: &mut f64, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        *slot += start.elapsed().as_secs_f64();
        out
    }
}

pub struct Simulation {
    pub params: SimParams,
    pub exec: ExecConfig,
    pub mask: StencilMask,
    pub dt: f64,
    pub elapsed: f64,
    pub step_index: usize,
    pub stopwatch: Stopwatch,
    current: ScalarField2D,
    next: ScalarField2D,
    lap: ScalarField2D,
}

impl Simulation {
    /// Validate parameters, build the mask and allocate all buffers with initial conditions applied.
    pub fn new(params: SimParams, exec: ExecConfig) -> Result<Self> {
        params.validate()?;
        let grid = params.grid()?;
        let mask = StencilMask::new(params.stencil(), params.dx, params.dy)?;
        let dt = params.time_step();

        let mut stopwatch = Stopwatch::default();
        let mut current = ScalarField2D::new(grid);
        Stopwatch::time(&mut stopwatch.step, || {
            apply_initial_conditions(&mut current, &params.boundaries)
        });
        let next = current.clone();
        let lap = ScalarField2D::new(grid);

        debug!(
            nx = grid.nx,
            ny = grid.ny,
            stencil = params.stencil().as_str(),
            radius = mask.radius(),
            dt,
            backend = exec.backend.as_str(),
            tile = exec.tile,
            "simulation initialised"
        );

        Ok(Self {
            params,
            exec,
            mask,
            dt,
            elapsed: 0.0,
            step_index: 0,
            stopwatch,
            current,
            next,
            lap,
        })
    }

    /// The field after the latest completed step.
    pub fn field(&self) -> &ScalarField2D {
        &self.current
    }

    /// The Laplacian computed during the latest step.
    pub fn laplacian(&self) -> &ScalarField2D {
        &self.lap
    }

    pub fn boundaries(&self) -> &BoundaryValues {
        &self.params.boundaries
    }

    /// Run an output task on the current field, charging its time to `file`.
    pub fn timed_output<T>(&mut self, f: impl FnOnce(&ScalarField2D) -> T) -> T {
        Stopwatch::time(&mut self.stopwatch.file, || f(&self.current))
    }

    /// Advance one explicit step.
    pub fn step(&mut self) -> Result<()> {
        let exec = self.exec;
        let sw = &mut self.stopwatch;

        Stopwatch::time(&mut sw.conv, || {
            compute_convolution(&self.current, &mut self.lap, &self.mask, &exec)
        })?;

        Stopwatch::time(&mut sw.step, || {
            step_in_time(
                &self.current,
                &mut self.next,
                &self.lap,
                self.params.diffusivity,
                self.dt,
                &mut self.elapsed,
                &exec,
            )?;
            mem::swap(&mut self.current, &mut self.next);
            apply_boundary_conditions(&mut self.current, &self.params.boundaries);
            Ok::<(), DiffusionError>(())
        })?;

        self.step_index += 1;
        Ok(())
    }

    /// Advance `n` steps.
    pub fn run(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Mean squared residual against the analytical solution at the current time.
    pub fn check(&mut self) -> Result<f64> {
        let exec = self.exec;
        let rss = Stopwatch::time(&mut self.stopwatch.soln, || {
            check_solution(
                &self.current,
                self.elapsed,
                self.params.diffusivity,
                &self.params.boundaries,
                &exec,
            )
        })?;
        debug!(step = self.step_index, elapsed = self.elapsed, rss, "residual check");
        Ok(rss)
    }
}
