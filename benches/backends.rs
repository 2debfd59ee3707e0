//! Criterion benchmarks of the three hot kernels per backend and tile size.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use diffusion_bench::boundaries::BoundaryValues;
use diffusion_bench::convolution::compute_convolution;
use diffusion_bench::field::ScalarField2D;
use diffusion_bench::integrator::step_in_time;
use diffusion_bench::mask::{Stencil, StencilMask};
use diffusion_bench::params::SimParams;
use diffusion_bench::residual::check_solution;
use diffusion_bench::solver::Simulation;
use diffusion_bench::tiling::{Backend, ExecConfig};

const SIZE: usize = 256;
const TILES: [usize; 3] = [8, 16, 64];

/// A field that has already diffused for a while, so every kernel sees
/// non-trivial data.
fn warmed_up() -> Simulation {
    let params = SimParams {
        nx: SIZE,
        ny: SIZE,
        ..SimParams::default()
    };
    let mut sim = Simulation::new(params, ExecConfig::default()).unwrap();
    sim.run(200).unwrap();
    sim
}

fn execs() -> Vec<ExecConfig> {
    Backend::ALL
        .iter()
        .flat_map(|&b| TILES.iter().map(move |&t| ExecConfig::new(b, t).unwrap()))
        .collect()
}

fn label(exec: &ExecConfig) -> String {
    format!("{}/{}", exec.backend.as_str(), exec.tile)
}

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

fn bench_convolution(c: &mut Criterion) {
    let sim = warmed_up();
    let a = sim.field().clone();
    let mut out = ScalarField2D::new(a.grid);
    let mut group = c.benchmark_group("convolution");

    for stencil in [Stencil::FivePoint, Stencil::NinePoint] {
        let mask = StencilMask::new(stencil, a.grid.dx, a.grid.dy).unwrap();
        for exec in execs() {
            let id = BenchmarkId::new(stencil.as_str(), label(&exec));
            group.bench_function(id, |b| {
                b.iter(|| compute_convolution(black_box(&a), &mut out, &mask, &exec).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let sim = warmed_up();
    let a = sim.field().clone();
    let lap = sim.laplacian().clone();
    let mut b_field = a.clone();
    let (d, dt) = (sim.params.diffusivity, sim.dt);
    let mut group = c.benchmark_group("step_in_time");

    for exec in execs() {
        group.bench_function(label(&exec), |b| {
            let mut elapsed = 0.0;
            b.iter(|| step_in_time(black_box(&a), &mut b_field, &lap, d, dt, &mut elapsed, &exec).unwrap())
        });
    }
    group.finish();
}

fn bench_residual(c: &mut Criterion) {
    let sim = warmed_up();
    let a = sim.field().clone();
    let bc = BoundaryValues::default();
    let (d, t) = (sim.params.diffusivity, sim.elapsed);
    let mut group = c.benchmark_group("check_solution");

    for exec in execs() {
        group.bench_function(label(&exec), |b| {
            b.iter(|| check_solution(black_box(&a), t, d, &bc, &exec).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convolution, bench_step, bench_residual);
criterion_main!(benches);
