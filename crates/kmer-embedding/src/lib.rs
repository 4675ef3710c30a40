//! Embedding composition for k-mer sequence models
//!
//! Converts a `[batch, seq_len]` tensor of token ids into the
//! `[batch, seq_len, d_model]` representation consumed by the model body:
//!
//! ```text
//! ids ─┬─> TokenEmbedding ─────┐
//!      │                       + ──> Dropout(mode) ──> output
//!      └─> PositionalEncoding ─┘
//! ```
//!
//! The token table is a learnable parameter owned by the caller's
//! `candle_nn::VarMap`; the positional table is computed once and never
//! tracked for gradients.

mod batch;
pub mod composer;
pub mod dropout;
pub mod positional;
pub mod token;

pub use batch::batch_dims;
pub use composer::EmbeddingComposer;
pub use dropout::{Dropout, dropout_rng};
pub use kmer_common::{EmbedError, EmbeddingConfig, FrequencyScaling, Mode, Result};
pub use positional::PositionalEncoding;
pub use token::TokenEmbedding;
