//! Learnable token id → vector lookup.

use candle_core::{DType, Module, Tensor};
use candle_nn::{Embedding, VarBuilder};
use kmer_common::{EmbedError, Result};

use crate::batch::batch_dims;

/// Token embedding table of shape `[vocab_size, d_model]`.
///
/// The table values belong to the training framework: `new` registers them
/// in the caller's `VarMap` and the optimizer updates them there. Forward
/// calls only read the table. The caller must not run a parameter update
/// concurrently with a forward call on the same table.
#[derive(Debug, Clone)]
pub struct TokenEmbedding {
    inner: Embedding,
    vocab_size: usize,
    d_model: usize,
}

impl TokenEmbedding {
    /// Allocate a `N(0, 1)`-initialized table under `vb` (as `weight`).
    pub fn new(vocab_size: usize, d_model: usize, vb: VarBuilder) -> Result<Self> {
        if vocab_size == 0 {
            return Err(EmbedError::config("vocab_size must be >= 1"));
        }
        if d_model == 0 {
            return Err(EmbedError::config("d_model must be >= 1"));
        }
        let inner = candle_nn::embedding(vocab_size, d_model, vb)?;
        tracing::debug!(vocab_size, d_model, "allocated token embedding table");
        Ok(Self { inner, vocab_size, d_model })
    }

    /// Wrap an existing `[vocab_size, d_model]` table.
    pub fn from_table(table: Tensor) -> Result<Self> {
        let (vocab_size, d_model) = table.dims2().map_err(|_| {
            EmbedError::config(format!(
                "embedding table must be [vocab_size, d_model], got {:?}",
                table.dims()
            ))
        })?;
        if vocab_size == 0 || d_model == 0 {
            return Err(EmbedError::config(format!(
                "embedding table must be non-empty, got {:?}",
                table.dims()
            )));
        }
        Ok(Self { inner: Embedding::new(table, d_model), vocab_size, d_model })
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }

    /// Current table values.
    pub fn table(&self) -> &Tensor {
        self.inner.embeddings()
    }

    /// Look up `[batch, seq_len]` ids, returning `[batch, seq_len, d_model]`.
    pub fn forward(&self, ids: &Tensor) -> Result<Tensor> {
        batch_dims(ids)?;
        check_token_range(ids, self.vocab_size)?;
        Ok(self.inner.forward(ids)?)
    }
}

/// Fail with [`EmbedError::OutOfRangeToken`] unless every id is in
/// `[0, vocab_size)`.
///
/// Uses whole-tensor min/max reductions; the reported token is the smallest
/// negative id, or otherwise the largest id.
pub fn check_token_range(ids: &Tensor, vocab_size: usize) -> Result<()> {
    let wide = match ids.dtype() {
        DType::U8 | DType::U32 | DType::I64 => ids.to_dtype(DType::I64)?,
        other => {
            return Err(EmbedError::input(format!(
                "token ids must be an integer tensor (u8, u32 or i64), got {other:?}"
            )));
        }
    };

    let min = wide.min_all()?.to_scalar::<i64>()?;
    if min < 0 {
        return Err(EmbedError::OutOfRangeToken { token: min, vocab_size });
    }
    let max = wide.max_all()?.to_scalar::<i64>()?;
    if max >= vocab_size as i64 {
        return Err(EmbedError::OutOfRangeToken { token: max, vocab_size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn arange_table(vocab: usize, d_model: usize) -> Tensor {
        let values: Vec<f32> = (0..vocab * d_model).map(|v| v as f32).collect();
        Tensor::from_vec(values, (vocab, d_model), &Device::Cpu).unwrap()
    }

    #[test]
    fn lookup_returns_table_rows() {
        let emb = TokenEmbedding::from_table(arange_table(5, 3)).unwrap();
        let ids = Tensor::new(&[[4u32, 0]], &Device::Cpu).unwrap();
        let out = emb.forward(&ids).unwrap().to_vec3::<f32>().unwrap();
        assert_eq!(out, vec![vec![vec![12.0, 13.0, 14.0], vec![0.0, 1.0, 2.0]]]);
    }

    #[test]
    fn range_check_reports_offender() {
        let ids = Tensor::new(&[[1i64, -3, 2]], &Device::Cpu).unwrap();
        assert!(matches!(
            check_token_range(&ids, 10),
            Err(EmbedError::OutOfRangeToken { token: -3, vocab_size: 10 })
        ));

        let ids = Tensor::new(&[[1u32, 12, 11]], &Device::Cpu).unwrap();
        assert!(matches!(
            check_token_range(&ids, 10),
            Err(EmbedError::OutOfRangeToken { token: 12, .. })
        ));
    }

    #[test]
    fn float_ids_are_rejected() {
        let ids = Tensor::new(&[[1.0f32, 2.0]], &Device::Cpu).unwrap();
        assert!(matches!(check_token_range(&ids, 10), Err(EmbedError::InvalidInput(_))));
    }

    #[test]
    fn from_table_rejects_bad_shapes() {
        let flat = Tensor::zeros(6, DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            TokenEmbedding::from_table(flat),
            Err(EmbedError::InvalidConfiguration(_))
        ));
        let empty = Tensor::zeros((0, 4), DType::F32, &Device::Cpu).unwrap();
        assert!(TokenEmbedding::from_table(empty).is_err());
    }
}
