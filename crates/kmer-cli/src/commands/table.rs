//! `table`: dump the sinusoidal positional matrix.

use std::io::{self, Write};

use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Args, ValueEnum};
use kmer_common::FrequencyScaling;
use kmer_embedding::PositionalEncoding;
use serde::Serialize;

use crate::config::CliConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    Json,
    Tsv,
}

/// Print the `[max_len, d_model]` positional table
#[derive(Debug, Args)]
pub struct TableCommand {
    /// Number of rows (defaults to the configured max_len)
    #[arg(long, value_name = "N")]
    pub max_len: Option<usize>,

    /// Number of columns (defaults to the configured d_model)
    #[arg(long, value_name = "D")]
    pub d_model: Option<usize>,

    /// Wavelength base
    #[arg(long, value_name = "BASE")]
    pub base: Option<f32>,

    /// Exponent evaluation: canonical or floor-divided
    #[arg(long, value_name = "SCALING")]
    pub scaling: Option<FrequencyScaling>,

    #[arg(long, value_enum, default_value_t = TableFormat::Json)]
    pub format: TableFormat,
}

#[derive(Serialize)]
struct TableReport {
    max_len: usize,
    d_model: usize,
    base: f32,
    scaling: String,
    rows: Vec<Vec<f32>>,
}

impl TableCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        self.run(config, &mut io::stdout().lock())
    }

    fn run<W: Write>(&self, config: &CliConfig, out: &mut W) -> Result<()> {
        let embedding = &config.embedding;
        let max_len = self.max_len.unwrap_or(embedding.max_len);
        let d_model = self.d_model.unwrap_or(embedding.d_model);
        let base = self.base.unwrap_or(embedding.base);
        let scaling = self.scaling.unwrap_or(embedding.frequency_scaling);

        // The table is device-independent; build it host-side.
        let encoding = PositionalEncoding::with_options(max_len, d_model, base, scaling, &Device::Cpu)
            .context("Failed to build positional table")?;
        let rows = encoding.table().to_vec2::<f32>()?;

        match self.format {
            TableFormat::Json => {
                let report = TableReport { max_len, d_model, base, scaling: scaling.to_string(), rows };
                serde_json::to_writer_pretty(&mut *out, &report)?;
                writeln!(out)?;
            }
            TableFormat::Tsv => write_tsv(out, &rows)?,
        }
        Ok(())
    }
}

fn write_tsv<W: Write>(out: &mut W, rows: &[Vec<f32>]) -> io::Result<()> {
    for (pos, row) in rows.iter().enumerate() {
        write!(out, "{pos}")?;
        for v in row {
            write!(out, "\t{v}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
