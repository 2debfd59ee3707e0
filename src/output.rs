// src/output.rs
//
// CSV telemetry and console progress.
//
//   runlog.csv             iter,sim_time,wrss,conv_time,step_time,IO_time,soln_time,run_time
//   diffusion.NNNNNNN.csv  x,y,c over the interior

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::field::ScalarField2D;
use crate::solver::Stopwatch;

pub const RUNLOG_HEADER: &str = "iter,sim_time,wrss,conv_time,step_time,IO_time,soln_time,run_time";

/// Zero-padded file name for step `step`, e.g. `diffusion.0010000.png`.
pub fn step_file_name(prefix: &str, step: usize, ext: &str) -> String {
    format!("{}.{:07}.{}", prefix, step, ext)
}

/// Replace anything outside [A-Za-z0-9_.-] so the id is safe as a directory name.
pub fn sanitize_run_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Time since the Unix epoch (zero if the clock is before it).
pub fn unix_now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
}

/// `<millis>_<tag>`, e.g. `1760601234567_rayon16`.
pub fn default_run_id(tag: &str) -> String {
    let now = unix_now();
    format!("{}{:03}_{}", now.as_secs(), now.subsec_millis(), tag)
}

/// `out_root/run_id`, or `out_root/run_id_k` for the first free k.
pub fn unique_run_dir(out_root: &Path, run_id: &str) -> PathBuf {
    let mut dir = out_root.join(run_id);
    if !dir.exists() {
        return dir;
    }
    for k in 1..1000 {
        let cand = out_root.join(format!("{}_{}", run_id, k));
        if !cand.exists() {
            dir = cand;
            break;
        }
    }
    dir
}

/// Per-check timing log.
pub struct RunLog<W: Write> {
    out: W,
}

impl RunLog<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> RunLog<W> {
    /// Wrap a writer and emit the header line.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{}", RUNLOG_HEADER)?;
        Ok(Self { out })
    }

    pub fn record(&mut self, step: usize, elapsed: f64, rss: f64, sw: &Stopwatch, run_time: f64) -> io::Result<()> {
        writeln!(
            self.out,
            "{},{:.6},{:.6e},{:.6},{:.6},{:.6},{:.6},{:.6}",
            step, elapsed, rss, sw.conv, sw.step, sw.file, sw.soln, run_time
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Write interior values as `x,y,c` rows, positions in physical units
/// measured from the first interior cell.
pub fn write_field_csv<W: Write>(field: &ScalarField2D, mut out: W) -> io::Result<()> {
    let g = field.grid;
    writeln!(out, "x,y,c")?;
    for j in g.rows() {
        let y = g.dy * (j - g.halo) as f64;
        let row = field.row(j);
        for i in g.cols() {
            let x = g.dx * (i - g.halo) as f64;
            writeln!(out, "{:.6},{:.6},{:.9}", x, y, row[i])?;
        }
    }
    out.flush()
}

/// Write `diffusion.NNNNNNN.csv` into `dir` and return its path.
pub fn write_csv(field: &ScalarField2D, dir: &Path, step: usize) -> io::Result<PathBuf> {
    let path = dir.join(step_file_name("diffusion", step, "csv"));
    write_field_csv(field, BufWriter::new(File::create(&path)?))?;
    Ok(path)
}

/// 20-segment progress bar with wall-clock stamps.
pub struct Progress {
    start: Instant,
    total: usize,
    last_segment: Option<usize>,
}

impl Progress {
    const SEGMENTS: usize = 20;

    pub fn new(total: usize) -> Self {
        Self {
            start: Instant::now(),
            total: total.max(1),
            last_segment: None,
        }
    }

    /// Segment index reached after `step` of `total` steps.
    fn segment(&self, step: usize) -> usize {
        (step.min(self.total) * Self::SEGMENTS) / self.total
    }

    /// Render the bar if `step` crossed into a new segment.
    pub fn line(&mut self, step: usize) -> Option<String> {
        let seg = self.segment(step);
        if self.last_segment == Some(seg) {
            return None;
        }
        self.last_segment = Some(seg);
        let bar: String = (0..Self::SEGMENTS).map(|k| if k < seg { '=' } else { ' ' }).collect();
        Some(format!(
            "[{}] {:3}% ({:.1} s)",
            bar,
            seg * 100 / Self::SEGMENTS,
            self.start.elapsed().as_secs_f64()
        ))
    }

    /// Redraw the bar on `out` if `step` crossed into a new segment.
    pub fn write_to<W: Write>(&mut self, step: usize, mut out: W) -> io::Result<()> {
        let Some(line) = self.line(step) else {
            return Ok(());
        };
        write!(out, "\r{}", line)?;
        if step >= self.total {
            writeln!(out)?;
        }
        out.flush()
    }

    /// Print to stdout; call once per step near the top of the loop.
    pub fn print(&mut self, step: usize) -> io::Result<()> {
        self.write_to(step, io::stdout().lock())
    }
}
