// src/config.rs
//
// Provenance record written next to each run's outputs as config.json.

use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;
use crate::params::SimParams;
use crate::tiling::ExecConfig;

#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub params: SimParams,
    pub numerics: NumericsConfig,
    pub execution: ExecConfig,
    pub run: RunInfo,
}

#[derive(Debug, Serialize)]
pub struct NumericsConfig {
    pub stencil: String,
    pub stencil_radius: usize,
    /// Time step actually used (linStab * h^2 / 4D).
    pub dt: f64,
    pub stability_limit: f64,
}

#[derive(Debug, Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,
    pub threads: usize,

    // Optional provenance (can be filled later)
    pub timestamp_unix: Option<u64>,
}

impl RunConfig {
    pub fn new(params: &SimParams, exec: ExecConfig, run: RunInfo) -> Self {
        let stencil = params.stencil();
        Self {
            numerics: NumericsConfig {
                stencil: stencil.as_str().to_string(),
                stencil_radius: stencil.radius(),
                dt: params.time_step(),
                stability_limit: params.stability_limit(),
            },
            params: params.clone(),
            execution: exec,
            run,
        }
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> Result<()> {
        let path = out_dir.join("config.json");
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
