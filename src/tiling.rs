// src/tiling.rs
//
// Rectangular tiling of the interior and the two execution backends that
// walk it.
//
// Writable tiles are built by splitting the output buffer row by row into
// disjoint column segments, so every tile owns its cells outright and the
// parallel loops need neither locks nor unsafe code.

use std::ops::Range;

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{DiffusionError, Result};
use crate::grid::Grid2D;

/// Default tile edge in cells.
pub const DEFAULT_TILE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Visit tiles in order on the calling thread.
    Serial,
    /// Fork-join over tiles on the global rayon pool.
    Rayon,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Serial, Backend::Rayon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Rayon => "rayon",
        }
    }
}

/// How the tiled loops are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    pub backend: Backend,
    /// Tile edge in cells. Any value >= 1 gives the same numbers.
    pub tile: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Rayon,
            tile: DEFAULT_TILE,
        }
    }
}

impl ExecConfig {
    pub fn new(backend: Backend, tile: usize) -> Result<Self> {
        if tile == 0 {
            return Err(DiffusionError::invalid("tile", "tile edge must be at least 1"));
        }
        Ok(Self { backend, tile })
    }

    pub fn serial(tile: usize) -> Result<Self> {
        Self::new(Backend::Serial, tile)
    }

    pub fn rayon(tile: usize) -> Result<Self> {
        Self::new(Backend::Rayon, tile)
    }
}

/// Read-only tile descriptor: half-open row and column ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Tile {
    pub fn n_cells(&self) -> usize {
        self.rows.len() * self.cols.len()
    }
}

/// Writable view of one tile: one column segment per row.
pub struct TileMut<'a> {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
    segments: Vec<&'a mut [f64]>,
}

impl<'a> TileMut<'a> {
    /// Iterate (row index, segment) pairs; `segment[k]` is column `cols.start + k`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut [f64])> + '_ {
        self.rows.clone().zip(self.segments.iter_mut().map(|s| &mut **s))
    }
}

fn spans(range: Range<usize>, edge: usize) -> impl Iterator<Item = Range<usize>> {
    let end = range.end;
    range
        .step_by(edge)
        .map(move |start| start..(start + edge).min(end))
}

/// Partition the interior of `grid` into tiles of at most `edge` × `edge` cells,
/// row bands first, columns within a band.
pub fn tiles(grid: &Grid2D, edge: usize) -> Vec<Tile> {
    let edge = edge.max(1);
    spans(grid.rows(), edge)
        .flat_map(|rows| {
            spans(grid.cols(), edge).map(move |cols| Tile {
                rows: rows.clone(),
                cols,
            })
        })
        .collect()
}

/// Split `data` (laid out on `grid`) into disjoint writable tiles covering the interior,
/// in the same order as [`tiles`].
pub fn tiles_mut<'a>(grid: &Grid2D, data: &'a mut [f64], edge: usize) -> Vec<TileMut<'a>> {
    debug_assert_eq!(data.len(), grid.n_cells());
    let edge = edge.max(1);
    let cols = grid.cols();
    let rows = grid.rows();

    let mut out: Vec<TileMut<'a>> = Vec::new();
    let mut band_first = 0;

    for (j, row) in data.chunks_mut(grid.nx).enumerate() {
        if !rows.contains(&j) {
            continue;
        }
        // First row of a new band opens a fresh set of tiles.
        if (j - rows.start) % edge == 0 {
            band_first = out.len();
            let band = j..(j + edge).min(rows.end);
            for c in spans(cols.clone(), edge) {
                out.push(TileMut {
                    rows: band.clone(),
                    cols: c,
                    segments: Vec::with_capacity(band.len()),
                });
            }
        }
        let interior = &mut row[cols.clone()];
        for (k, segment) in interior.chunks_mut(edge).enumerate() {
            out[band_first + k].segments.push(segment);
        }
    }
    out
}

/// Run `f` once per writable tile of `data`.
pub fn for_each_tile_mut<F>(exec: &ExecConfig, grid: &Grid2D, data: &mut [f64], f: F)
where
    F: Fn(&mut TileMut<'_>) + Sync + Send,
{
    let work = tiles_mut(grid, data, exec.tile);
    match exec.backend {
        Backend::Serial => work.into_iter().for_each(|mut t| f(&mut t)),
        Backend::Rayon => work.into_par_iter().for_each(|mut t| f(&mut t)),
    }
}

/// Map every tile to a partial result, returned in tile order regardless of backend.
pub fn map_tiles<T, F>(exec: &ExecConfig, grid: &Grid2D, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Tile) -> T + Sync + Send,
{
    let work = tiles(grid, exec.tile);
    match exec.backend {
        Backend::Serial => work.iter().map(f).collect(),
        Backend::Rayon => work.par_iter().map(f).collect(),
    }
}

/// Pairwise (tree) summation. Associative merge of per-tile partials with
/// O(log n) error growth.
pub fn pairwise_sum(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => {
            let (lo, hi) = values.split_at(n / 2);
            pairwise_sum(lo) + pairwise_sum(hi)
        }
    }
}
