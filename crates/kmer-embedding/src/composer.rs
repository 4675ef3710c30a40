//! Token + position composition with dropout.

use candle_core::Tensor;
use candle_nn::VarBuilder;
use kmer_common::{EmbedError, EmbeddingConfig, Mode, Result};
use rand::Rng;

use crate::dropout::Dropout;
use crate::positional::PositionalEncoding;
use crate::token::TokenEmbedding;

/// Full input embedding: `dropout(token(ids) + position(ids))`.
#[derive(Debug, Clone)]
pub struct EmbeddingComposer {
    token: TokenEmbedding,
    position: PositionalEncoding,
    dropout: Dropout,
}

impl EmbeddingComposer {
    /// Validate `config` and build all parts on `vb.device()`.
    ///
    /// The token table is registered under `vb.pp("token_embedding")`.
    pub fn new(config: &EmbeddingConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;

        let position = PositionalEncoding::with_options(
            config.max_len,
            config.d_model,
            config.base,
            config.frequency_scaling,
            vb.device(),
        )?;
        let token = TokenEmbedding::new(config.vocab_size, config.d_model, vb.pp("token_embedding"))?;
        let dropout = Dropout::new(config.drop_prob)?;

        tracing::info!(
            vocab_size = config.vocab_size,
            d_model = config.d_model,
            max_len = config.max_len,
            drop_prob = config.drop_prob,
            "built embedding composer"
        );
        Ok(Self { token, position, dropout })
    }

    /// Assemble from already-built parts; the widths must agree.
    pub fn from_parts(
        token: TokenEmbedding,
        position: PositionalEncoding,
        dropout: Dropout,
    ) -> Result<Self> {
        if token.d_model() != position.d_model() {
            return Err(EmbedError::config(format!(
                "token width {} does not match positional width {}",
                token.d_model(),
                position.d_model()
            )));
        }
        Ok(Self { token, position, dropout })
    }

    pub fn token(&self) -> &TokenEmbedding {
        &self.token
    }

    pub fn position(&self) -> &PositionalEncoding {
        &self.position
    }

    pub fn dropout(&self) -> &Dropout {
        &self.dropout
    }

    pub fn d_model(&self) -> usize {
        self.token.d_model()
    }

    /// Compose a `[batch, seq_len]` id batch into `[batch, seq_len, d_model]`.
    ///
    /// `rng` is only consumed in [`Mode::Training`] with a non-zero drop
    /// probability. Errors from either lookup are returned unchanged.
    pub fn forward<R: Rng + ?Sized>(&self, ids: &Tensor, mode: Mode, rng: &mut R) -> Result<Tensor> {
        let summed = self.sum(ids)?;
        self.dropout.forward(&summed, mode, rng)
    }

    /// [`Mode::Evaluation`] forward; no randomness involved.
    pub fn forward_eval(&self, ids: &Tensor) -> Result<Tensor> {
        self.sum(ids)
    }

    fn sum(&self, ids: &Tensor) -> Result<Tensor> {
        let tokens = self.token.forward(ids)?;
        let positions = self.position.forward(ids)?.to_dtype(tokens.dtype())?;
        tracing::debug!(dims = ?tokens.dims(), "composing token and position embeddings");
        Ok(tokens.broadcast_add(&positions)?)
    }
}
