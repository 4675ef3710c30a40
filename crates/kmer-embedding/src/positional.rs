//! Fixed sinusoidal absolute-position encoding.

use candle_core::{Device, Tensor};
use kmer_common::{EmbedError, Result};
use kmer_sinusoid::{DEFAULT_BASE, FrequencyScaling, build_table};

use crate::batch::batch_dims;

/// Precomputed `[max_len, d_model]` sinusoidal table.
///
/// Built once at construction and held as a plain tensor, so it never takes
/// part in gradient tracking. Clones share the underlying storage.
#[derive(Debug, Clone)]
pub struct PositionalEncoding {
    table: Tensor,
    max_len: usize,
    d_model: usize,
    scaling: FrequencyScaling,
}

impl PositionalEncoding {
    /// Canonical encoding with the default base.
    pub fn new(max_len: usize, d_model: usize, device: &Device) -> Result<Self> {
        Self::with_options(max_len, d_model, DEFAULT_BASE, FrequencyScaling::Canonical, device)
    }

    pub fn with_options(
        max_len: usize,
        d_model: usize,
        base: f32,
        scaling: FrequencyScaling,
        device: &Device,
    ) -> Result<Self> {
        if max_len == 0 {
            return Err(EmbedError::config("max_len must be >= 1"));
        }
        if d_model == 0 {
            return Err(EmbedError::config("d_model must be >= 1"));
        }
        if scaling == FrequencyScaling::FloorDivided {
            tracing::warn!(
                d_model,
                "floor-divided frequency scaling selected: every column pair uses frequency 1"
            );
        }

        let table = build_table(max_len, d_model, base, scaling)?;
        let table = Tensor::from_vec(table.values, (max_len, d_model), device)?;
        tracing::info!(max_len, d_model, base, %scaling, "built sinusoidal positional table");

        Ok(Self { table, max_len, d_model, scaling })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }

    pub fn scaling(&self) -> FrequencyScaling {
        self.scaling
    }

    /// The whole `[max_len, d_model]` table.
    pub fn table(&self) -> &Tensor {
        &self.table
    }

    /// First `seq_len` rows as `[seq_len, d_model]`.
    pub fn rows(&self, seq_len: usize) -> Result<Tensor> {
        if seq_len > self.max_len {
            return Err(EmbedError::SequenceTooLong { seq_len, max_len: self.max_len });
        }
        if seq_len == 0 {
            return Err(EmbedError::input("sequence length must be >= 1"));
        }
        Ok(self.table.narrow(0, 0, seq_len)?)
    }

    /// Encoding for a `[batch, seq_len]` id batch as `[1, seq_len, d_model]`,
    /// ready to broadcast over the batch axis.
    pub fn forward(&self, ids: &Tensor) -> Result<Tensor> {
        let (_, seq_len) = batch_dims(ids)?;
        Ok(self.rows(seq_len)?.unsqueeze(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn table_has_requested_shape() {
        let pe = PositionalEncoding::new(5, 4, &Device::Cpu).unwrap();
        assert_eq!(pe.table().dims(), &[5, 4]);
        assert_eq!(pe.table().dtype(), DType::F32);
    }

    #[test]
    fn rows_checks_the_bound() {
        let pe = PositionalEncoding::new(5, 4, &Device::Cpu).unwrap();
        assert_eq!(pe.rows(5).unwrap().dims(), &[5, 4]);
        assert!(matches!(pe.rows(6), Err(EmbedError::SequenceTooLong { seq_len: 6, max_len: 5 })));
        assert!(matches!(pe.rows(0), Err(EmbedError::InvalidInput(_))));
    }

    #[test]
    fn zero_sizes_are_configuration_errors() {
        assert!(matches!(
            PositionalEncoding::new(0, 4, &Device::Cpu),
            Err(EmbedError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            PositionalEncoding::new(4, 0, &Device::Cpu),
            Err(EmbedError::InvalidConfiguration(_))
        ));
    }
}
