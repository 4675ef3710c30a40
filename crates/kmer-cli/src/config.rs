//! CLI configuration: the `[embedding]` table shared with the library plus
//! a `[logging]` table only the binary reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kmer_common::{DeviceSpec, EmbeddingConfig};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "kmer-embed.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub embedding: EmbeddingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty`, `compact` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl CliConfig {
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Read `path` if it exists, otherwise start from defaults.
    ///
    /// The `[embedding]` table goes through [`EmbeddingConfig::from_toml`],
    /// which also warns about a missing file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let embedding = EmbeddingConfig::from_toml(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        if !path.exists() {
            return Ok(Self { embedding, ..Self::default() });
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let LoggingTable { logging } =
            toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self { embedding, logging })
    }
}

#[derive(Deserialize)]
struct LoggingTable {
    #[serde(default)]
    logging: LoggingConfig,
}

/// Layered construction: file, then `KMER_EMBED_*` env, then CLI flags.
#[derive(Default)]
pub struct ConfigBuilder {
    config: CliConfig,
}

impl ConfigBuilder {
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self { config: CliConfig::from_file(path)? })
    }

    pub fn env_overrides(mut self) -> Result<Self> {
        self.config.embedding =
            self.config.embedding.with_env_overrides().context("Invalid environment override")?;
        Ok(self)
    }

    pub fn device(mut self, device: Option<DeviceSpec>) -> Self {
        if let Some(device) = device {
            self.config.embedding.device = device;
        }
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        if let Some(level) = level {
            self.config.logging.level = level;
        }
        self
    }

    pub fn log_format(mut self, format: Option<String>) -> Self {
        if let Some(format) = format {
            self.config.logging.format = format;
        }
        self
    }

    pub fn build(self) -> CliConfig {
        self.config
    }
}
