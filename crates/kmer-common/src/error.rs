//! Error types for the embedding layer

use kmer_sinusoid::TableError;

/// Errors surfaced by configuration, construction and forward calls.
///
/// All variants are precondition violations; nothing is retried or clamped.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("token id {token} is outside the vocabulary [0, {vocab_size})")]
    OutOfRangeToken { token: i64, vocab_size: usize },

    #[error("sequence length {seq_len} exceeds the maximum of {max_len}")]
    SequenceTooLong { seq_len: usize, max_len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid environment variable value for {key}: {value}")]
    InvalidEnvVar { key: String, value: String },

    #[error("unknown device: {0} (expected cpu, cuda[:N] or metal[:N])")]
    UnknownDevice(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, EmbedError>;

impl EmbedError {
    /// Shorthand for [`EmbedError::InvalidConfiguration`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Shorthand for [`EmbedError::InvalidInput`].
    pub fn input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

// Table generation only fails on construction parameters.
impl From<TableError> for EmbedError {
    fn from(err: TableError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_bounds() {
        let err = EmbedError::OutOfRangeToken { token: 10, vocab_size: 10 };
        assert_eq!(err.to_string(), "token id 10 is outside the vocabulary [0, 10)");

        let err = EmbedError::SequenceTooLong { seq_len: 6, max_len: 5 };
        assert_eq!(err.to_string(), "sequence length 6 exceeds the maximum of 5");
    }

    #[test]
    fn table_errors_are_configuration_errors() {
        let err: EmbedError = TableError::NonPositiveBase { base: -1.0 }.into();
        match err {
            EmbedError::InvalidConfiguration(msg) => assert!(msg.contains("-1"), "{msg}"),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }
}
