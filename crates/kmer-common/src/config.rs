//! Embedding layer configuration with TOML, environment variable, and
//! default config sources.

use std::env;
use std::path::Path;
use std::str::FromStr;

use kmer_sinusoid::{DEFAULT_BASE, FrequencyScaling};
use serde::{Deserialize, Serialize};

use crate::{DeviceSpec, EmbedError, Result};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "KMER_EMBED_";

/// Wrapper used for the `[embedding]` table in TOML files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TomlWrapper {
    #[serde(default)]
    embedding: EmbeddingConfig,
}

/// Construction parameters for the embedding composer.
///
/// Fixed at model-build time; nothing here changes between forward calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Number of distinct token ids.
    pub vocab_size: usize,
    /// Width of every token and position vector.
    pub d_model: usize,
    /// Longest sequence the positional table covers.
    pub max_len: usize,
    /// Dropout probability in `[0, 1)`.
    pub drop_prob: f32,
    /// Wavelength base of the sinusoidal table.
    pub base: f32,
    pub frequency_scaling: FrequencyScaling,
    pub device: DeviceSpec,
    /// Seed for the dropout RNG when the caller does not supply one.
    pub seed: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            // 4^6 hexamers
            vocab_size: 4096,
            d_model: 512,
            max_len: 512,
            drop_prob: 0.1,
            base: DEFAULT_BASE,
            frequency_scaling: FrequencyScaling::Canonical,
            device: DeviceSpec::Cpu,
            seed: None,
        }
    }
}

impl EmbeddingConfig {
    /// Config with the four core sizes set and defaults elsewhere.
    pub fn new(vocab_size: usize, d_model: usize, max_len: usize, drop_prob: f32) -> Self {
        Self { vocab_size, d_model, max_len, drop_prob, ..Self::default() }
    }

    #[must_use]
    pub fn with_frequency_scaling(mut self, scaling: FrequencyScaling) -> Self {
        self.frequency_scaling = scaling;
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: f32) -> Self {
        self.base = base;
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: DeviceSpec) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ── Sources ─────────────────────────────────────────────────

    /// Load configuration from a TOML file at `path`.
    ///
    /// The file is expected to contain an `[embedding]` table. If the file
    /// does not exist, returns `Ok(Self::default())`.
    pub fn from_toml(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found: {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse an `[embedding]` TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let wrapper: TomlWrapper = toml::from_str(text)?;
        Ok(wrapper.embedding)
    }

    /// Serialize to a TOML string (wrapped in `[embedding]`).
    pub fn to_toml(&self) -> Result<String> {
        let wrapper = TomlWrapper { embedding: self.clone() };
        Ok(toml::to_string_pretty(&wrapper)?)
    }

    /// Overlay `KMER_EMBED_*` environment variables on `self`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_value("VOCAB_SIZE")? {
            self.vocab_size = v;
        }
        if let Some(v) = env_value("D_MODEL")? {
            self.d_model = v;
        }
        if let Some(v) = env_value("MAX_LEN")? {
            self.max_len = v;
        }
        if let Some(v) = env_value("DROP_PROB")? {
            self.drop_prob = v;
        }
        if let Some(v) = env_value("BASE")? {
            self.base = v;
        }
        if let Some(v) = env_value("FREQUENCY_SCALING")? {
            self.frequency_scaling = v;
        }
        if let Some(v) = env_value("DEVICE")? {
            self.device = v;
        }
        if let Some(v) = env_value("SEED")? {
            self.seed = Some(v);
        }
        Ok(self)
    }

    // ── Validation ──────────────────────────────────────────────

    /// Reject sizes and probabilities the layer cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(EmbedError::config("vocab_size must be >= 1"));
        }
        if self.d_model == 0 {
            return Err(EmbedError::config("d_model must be >= 1"));
        }
        if self.max_len == 0 {
            return Err(EmbedError::config("max_len must be >= 1"));
        }
        if self.max_len.checked_mul(self.d_model).is_none() {
            return Err(EmbedError::config(format!(
                "positional table of {} x {} values overflows",
                self.max_len, self.d_model
            )));
        }
        if !(0.0..1.0).contains(&self.drop_prob) {
            return Err(EmbedError::config(format!(
                "drop_prob must be in [0, 1), got {}",
                self.drop_prob
            )));
        }
        if !self.base.is_finite() || self.base <= 0.0 {
            return Err(EmbedError::config(format!(
                "base must be finite and > 0, got {}",
                self.base
            )));
        }
        Ok(())
    }
}

fn env_value<T: FromStr>(suffix: &str) -> Result<Option<T>> {
    let key = format!("{ENV_PREFIX}{suffix}");
    match env::var(&key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EmbedError::InvalidEnvVar { key, value }),
        Err(_) => Ok(None),
    }
}
