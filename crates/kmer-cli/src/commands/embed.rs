//! `embed`: run one forward pass on literal token ids.

use std::io::{self, Write};

use anyhow::{Context, Result, bail, ensure};
use candle_core::{DType, Tensor};
use candle_nn::{VarBuilder, VarMap};
use clap::Args;
use kmer_common::Mode;
use kmer_embedding::{EmbeddingComposer, dropout_rng};
use serde::Serialize;
use tracing::info;

use crate::config::CliConfig;

/// Compose token ids into embeddings with a freshly initialized table
#[derive(Debug, Args)]
pub struct EmbedCommand {
    /// Token ids: comma-separated within a sequence, `;` between sequences
    #[arg(long, value_name = "IDS")]
    pub ids: String,

    /// Apply dropout (training mode)
    #[arg(long)]
    pub train: bool,

    /// Dropout RNG seed (overrides the configured seed)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Serialize)]
struct EmbedReport {
    mode: String,
    shape: Vec<usize>,
    values: Vec<Vec<Vec<f32>>>,
}

impl EmbedCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        self.run(config, &mut io::stdout().lock())
    }

    fn run<W: Write>(&self, config: &CliConfig, out: &mut W) -> Result<()> {
        let embedding = &config.embedding;
        let rows = parse_ids(&self.ids)?;
        let (batch, seq_len) = (rows.len(), rows[0].len());

        let device = embedding.device.to_device().context("Failed to open device")?;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let composer =
            EmbeddingComposer::new(embedding, vb).context("Failed to build embedding composer")?;

        let ids = Tensor::from_vec(rows.concat(), (batch, seq_len), &device)?;
        let mode = Mode::from_train_flag(self.train);
        let mut rng = dropout_rng(self.seed.or(embedding.seed));

        info!(batch, seq_len, %mode, "running forward pass");
        let output = composer.forward(&ids, mode, &mut rng)?;

        let report = EmbedReport {
            mode: mode.to_string(),
            shape: output.dims().to_vec(),
            values: output.to_vec3::<f32>()?,
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        Ok(())
    }
}

/// Parse `"1,2,3;4,5,6"` into equal-length id rows.
pub fn parse_ids(text: &str) -> Result<Vec<Vec<i64>>> {
    let mut rows = Vec::new();
    for (n, seq) in text.split(';').map(str::trim).filter(|s| !s.is_empty()).enumerate() {
        let row = seq
            .split(',')
            .map(|id| {
                id.trim().parse::<i64>().with_context(|| format!("sequence {n}: bad token id {id:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    let Some(first) = rows.first() else {
        bail!("no token ids given");
    };
    let width = first.len();
    ensure!(
        rows.iter().all(|r| r.len() == width),
        "all sequences must have the same length ({width})"
    );
    Ok(rows)
}
