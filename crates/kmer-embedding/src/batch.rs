use candle_core::Tensor;
use kmer_common::{EmbedError, Result};

/// `(batch_size, seq_len)` of a token batch, rejecting anything that is not a
/// non-empty rank-2 tensor.
pub fn batch_dims(ids: &Tensor) -> Result<(usize, usize)> {
    let (batch_size, seq_len) = ids.dims2().map_err(|_| {
        EmbedError::input(format!("token batch must be [batch, seq_len], got {:?}", ids.dims()))
    })?;
    if batch_size == 0 {
        return Err(EmbedError::input("token batch is empty"));
    }
    if seq_len == 0 {
        return Err(EmbedError::input("sequence length must be >= 1"));
    }
    Ok((batch_size, seq_len))
}
