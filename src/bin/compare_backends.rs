// src/bin/compare_backends.rs
//
// Backend comparison: run the same short workload for every
// (backend, tile) pair, time each phase, and check that all of them land on
// the same residual.
//
// Run:
//   cargo run --release --bin compare_backends -- --size 256 --steps 2000 --tiles 1,8,16,64
//
// Output:
//   out/compare_backends/
//     ├── config.json      (parameters shared by every row)
//     └── backends.csv     backend,tile,threads,conv_time,step_time,soln_time,total_time,wrss

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use diffusion_bench::config::{RunConfig, RunInfo};
use diffusion_bench::output::unix_now;
use diffusion_bench::params::SimParams;
use diffusion_bench::solver::Simulation;
use diffusion_bench::tiling::{Backend, ExecConfig};

#[derive(Debug, Parser)]
#[command(name = "compare_backends", about = "Time each phase per backend and tile size")]
struct Cli {
    /// Stored cells per side (square grid)
    #[arg(long, default_value_t = 256)]
    size: usize,
    /// Steps per workload; the residual needs elapsed time > 0
    #[arg(long, default_value_t = 2000, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    steps: usize,
    /// Stencil code: 53, 93 or 135
    #[arg(long, default_value_t = 53)]
    code: u32,
    /// Tile edges to try
    #[arg(long, value_delimiter = ',', default_value = "1,8,16,64")]
    tiles: Vec<usize>,
    /// Largest allowed relative spread between residuals
    #[arg(long, default_value_t = 1e-10)]
    tolerance: f64,
    #[arg(long, default_value = "out/compare_backends")]
    out: PathBuf,
}

struct Row {
    exec: ExecConfig,
    conv: f64,
    step: f64,
    soln: f64,
    total: f64,
    rss: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let params = SimParams {
        nx: cli.size,
        ny: cli.size,
        code: cli.code,
        steps: cli.steps,
        log_every: cli.steps,
        checks: cli.steps,
        ..SimParams::default()
    };
    params.validate()?;

    create_dir_all(&cli.out)?;
    RunConfig::new(
        &params,
        ExecConfig::default(),
        RunInfo {
            binary: "compare_backends".to_string(),
            run_id: "compare_backends".to_string(),
            threads: rayon::current_num_threads(),
            timestamp_unix: Some(unix_now().as_secs()),
        },
    )
    .write_to_dir(&cli.out)?;

    let mut rows = Vec::new();
    for backend in Backend::ALL {
        for &tile in &cli.tiles {
            let exec = ExecConfig::new(backend, tile)?;
            let mut sim = Simulation::new(params.clone(), exec)?;

            let start = Instant::now();
            sim.run(params.steps)?;
            let rss = sim.check()?;
            let total = start.elapsed().as_secs_f64();

            let sw = sim.stopwatch;
            info!(
                backend = backend.as_str(),
                tile,
                conv = sw.conv,
                step = sw.step,
                soln = sw.soln,
                total,
                rss,
                "workload finished"
            );
            rows.push(Row {
                exec,
                conv: sw.conv,
                step: sw.step,
                soln: sw.soln,
                total,
                rss,
            });
        }
    }

    let path = cli.out.join("backends.csv");
    let mut out = BufWriter::new(File::create(&path)?);
    writeln!(out, "backend,tile,threads,conv_time,step_time,soln_time,total_time,wrss")?;
    for r in &rows {
        let threads = match r.exec.backend {
            Backend::Serial => 1,
            Backend::Rayon => rayon::current_num_threads(),
        };
        writeln!(
            out,
            "{},{},{},{:.6},{:.6},{:.6},{:.6},{:.9e}",
            r.exec.backend.as_str(),
            r.exec.tile,
            threads,
            r.conv,
            r.step,
            r.soln,
            r.total,
            r.rss
        )?;
    }
    out.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote backend timings");

    // Convolution and stepping are bitwise tile-independent; only the
    // residual reduction order varies.
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let reference = first.rss;
    for r in &rows {
        let spread = (r.rss - reference).abs() / reference.abs().max(f64::MIN_POSITIVE);
        if spread > cli.tolerance {
            bail!(
                "{} with tile {} gave residual {:e}, reference {:e} (relative spread {:e})",
                r.exec.backend.as_str(),
                r.exec.tile,
                r.rss,
                reference,
                spread
            );
        }
    }
    info!(reference, "all backends agree");
    Ok(())
}
