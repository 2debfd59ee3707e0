// src/main.rs
//
// Benchmark driver: explicit 2D diffusion from two half-wall sources,
// timing convolution, stepping and the analytical comparison separately.
//
// Examples:
//
//   cargo run --release
//       -> reference run: 512x512, dx=dy=0.5, D=0.00625, linStab=0.1,
//          100000 steps, rayon backend with 16x16 tiles.
//
//   cargo run --release -- --backend serial --steps 20000 --nx 256 --ny 256
//       -> single-threaded baseline on a smaller grid.
//
//   cargo run --release -- --params params.json --code 135 --tile 32
//       -> parameters from JSON, 13-point stencil, larger tiles.
//
// Typical outputs (per run directory):
//   runs/<run_id>/
//     ├── config.json
//     ├── runlog.csv
//     ├── residual.png
//     ├── diffusion.0100000.csv
//     └── frames/diffusion.*.png

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use diffusion_bench::boundaries::BoundaryValues;
use diffusion_bench::config::{RunConfig, RunInfo};
use diffusion_bench::output::{
    Progress, RunLog, default_run_id, sanitize_run_id, step_file_name, unique_run_dir, unix_now,
    write_csv,
};
use diffusion_bench::params::{RESIDUAL_ACCEPTANCE, SimParams};
use diffusion_bench::solver::Simulation;
use diffusion_bench::tiling::{Backend, DEFAULT_TILE, ExecConfig};
use diffusion_bench::visualisation::{save_field_png, save_residual_plot};

#[derive(Debug, Parser)]
#[command(name = "diffusion", version, about = "Explicit 2D semi-infinite diffusion benchmark")]
struct Cli {
    /// JSON parameter file; the flags below override individual values
    #[arg(long)]
    params: Option<PathBuf>,

    /// Stored cells along x (ghost layer included)
    #[arg(long)]
    nx: Option<usize>,
    /// Stored cells along y (ghost layer included)
    #[arg(long)]
    ny: Option<usize>,
    /// Stencil code: 53 (5-point), 93 (9-point), 135 (13-point)
    #[arg(long)]
    code: Option<u32>,
    #[arg(long)]
    dx: Option<f64>,
    #[arg(long)]
    dy: Option<f64>,
    /// Diffusivity D
    #[arg(long = "diffusivity", short = 'D')]
    diffusivity: Option<f64>,
    /// Fraction of the explicit stability limit, in (0, 1)
    #[arg(long)]
    lin_stab: Option<f64>,
    #[arg(long)]
    steps: Option<usize>,
    /// Image checkpoint interval
    #[arg(long)]
    checks: Option<usize>,
    /// Residual/runlog interval
    #[arg(long)]
    log_every: Option<usize>,

    #[arg(long, value_enum, default_value_t = Backend::Rayon)]
    backend: Backend,
    /// Tile edge in cells
    #[arg(long, default_value_t = DEFAULT_TILE)]
    tile: usize,
    /// Worker threads for the rayon backend (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Output root directory
    #[arg(long, default_value = "runs")]
    out: PathBuf,
    /// Run id (default: timestamp + backend + tile)
    #[arg(long)]
    run: Option<String>,
    /// Skip PNG frames (CSV output only)
    #[arg(long)]
    no_png: bool,
}

impl Cli {
    fn apply(&self, p: &mut SimParams) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field {
                    p.$field = v;
                })*
            };
        }
        set!(nx, ny, code, dx, dy, diffusivity, lin_stab, steps, checks, log_every);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diffusion_bench=info,diffusion=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Colour range spanning the background and both sources.
fn colour_range(bc: &BoundaryValues) -> (f64, f64) {
    let lo = bc.background.min(bc.left).min(bc.right);
    let hi = bc.background.max(bc.left).max(bc.right);
    (lo, hi)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut params = match &cli.params {
        Some(path) => SimParams::from_json_file(path)
            .with_context(|| format!("reading parameters from {}", path.display()))?,
        None => SimParams::default(),
    };
    cli.apply(&mut params);

    let exec = ExecConfig::new(cli.backend, cli.tile)?;
    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("configuring the rayon thread pool")?;
    }

    let mut sim = Simulation::new(params.clone(), exec).context("invalid simulation parameters")?;

    // -------- output directory setup --------
    create_dir_all(&cli.out)?;
    let tag = format!("{}{}", exec.backend.as_str(), exec.tile);
    let run_id = sanitize_run_id(&cli.run.clone().unwrap_or_else(|| default_run_id(&tag)));
    let run_dir = unique_run_dir(&cli.out, &run_id);
    let frames_dir = run_dir.join("frames");
    create_dir_all(&frames_dir)?;

    RunConfig::new(
        &params,
        exec,
        RunInfo {
            binary: "diffusion".to_string(),
            run_id: run_id.clone(),
            threads: rayon::current_num_threads(),
            timestamp_unix: Some(unix_now().as_secs()),
        },
    )
    .write_to_dir(&run_dir)?;

    info!(
        run_dir = %run_dir.display(),
        nx = params.nx,
        ny = params.ny,
        stencil = params.stencil().as_str(),
        dt = sim.dt,
        steps = params.steps,
        backend = exec.backend.as_str(),
        tile = exec.tile,
        threads = rayon::current_num_threads(),
        "starting diffusion benchmark"
    );

    let run_start = Instant::now();
    let range = colour_range(sim.boundaries());
    let save_frame = |sim: &mut Simulation, step: usize| -> Result<()> {
        if cli.no_png {
            return Ok(());
        }
        let path = frames_dir.join(step_file_name("diffusion", step, "png"));
        let file = path.to_string_lossy().to_string();
        sim.timed_output(|field| save_field_png(field, range, &file))?;
        Ok(())
    };

    // initial condition
    save_frame(&mut sim, 0)?;
    let mut runlog = RunLog::create(&run_dir.join("runlog.csv"))?;
    runlog.record(0, sim.elapsed, 0.0, &sim.stopwatch, run_start.elapsed().as_secs_f64())?;

    let mut times = Vec::new();
    let mut residuals = Vec::new();
    let mut progress = Progress::new(params.steps);

    for step in 1..=params.steps {
        progress.print(step - 1)?;

        sim.step().with_context(|| format!("step {}", step))?;

        if step % params.checks == 0 {
            save_frame(&mut sim, step)?;
        }

        if step % params.log_every == 0 {
            let rss = sim.check()?;
            times.push(sim.elapsed);
            residuals.push(rss);
            runlog.record(step, sim.elapsed, rss, &sim.stopwatch, run_start.elapsed().as_secs_f64())?;
        }
    }
    progress.print(params.steps)?;

    let csv_path = sim.timed_output(|field| write_csv(field, &run_dir, params.steps))?;
    if !cli.no_png {
        save_residual_plot(&times, &residuals, &run_dir.join("residual.png").to_string_lossy())?;
    }
    runlog.flush()?;

    let sw = sim.stopwatch;
    info!(
        conv = sw.conv,
        step = sw.step,
        file = sw.file,
        soln = sw.soln,
        total = run_start.elapsed().as_secs_f64(),
        field = %csv_path.display(),
        "timings (s)"
    );

    match residuals.last() {
        Some(&rss) if rss < RESIDUAL_ACCEPTANCE => {
            info!(rss, threshold = RESIDUAL_ACCEPTANCE, "final residual within acceptance")
        }
        Some(&rss) => warn!(rss, threshold = RESIDUAL_ACCEPTANCE, "final residual exceeds acceptance"),
        None => warn!("no residual checks were logged"),
    }

    Ok(())
}
