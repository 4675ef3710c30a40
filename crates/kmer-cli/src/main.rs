//! kmer-embed CLI
//!
//! Command-line front end for the k-mer embedding layer: inspect the
//! sinusoidal positional table, run a forward pass on literal token ids and
//! manage configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use console::style;
use kmer_common::DeviceSpec;
use tracing::error;

mod commands;
mod config;

use commands::{EmbedCommand, TableCommand};
use config::{CliConfig, ConfigBuilder};

/// kmer-embed - token + positional embeddings for k-mer sequence models
#[derive(Parser)]
#[command(name = "kmer-embed")]
#[command(about = "Token and sinusoidal positional embeddings for k-mer sequence models")]
#[command(long_about = r#"
kmer-embed builds the input representation of a k-mer sequence model:
token ids are looked up in an embedding table, a fixed sinusoidal position
encoding is added, and dropout is applied in training mode.

Examples:
  # Print the positional table for 8 positions and 16 dimensions
  kmer-embed table --max-len 8 --d-model 16

  # Same table as tab-separated values
  kmer-embed table --max-len 8 --d-model 16 --format tsv

  # Embed a batch of two sequences with dropout, seeded
  kmer-embed embed --ids "1,2,3;4,5,6" --train --seed 42

  # Show the effective configuration
  kmer-embed --config kmer-embed.toml config show
"#)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Device to use (cpu, cuda[:N], metal[:N])
    #[arg(short, long, value_name = "DEVICE", global = true)]
    device: Option<DeviceSpec>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sinusoidal positional table
    #[command(alias = "pe")]
    Table(TableCommand),

    /// Run a forward pass on token ids
    Embed(EmbedCommand),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
    /// Show the configuration file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = config_path(&cli);
    let config = load_configuration(&cli, &path)?;
    setup_logging(&config);

    let result = match cli.command {
        Some(Commands::Table(cmd)) => cmd.execute(&config),
        Some(Commands::Embed(cmd)) => cmd.execute(&config),
        Some(Commands::Config { action }) => handle_config_command(action, &path, &config),
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);

        for cause in e.chain().skip(1) {
            error!("  Caused by: {}", cause);
        }

        std::process::exit(1);
    }

    Ok(())
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(CliConfig::default_config_path)
}

/// Load configuration from file, then environment, then CLI flags
fn load_configuration(cli: &Cli, path: &Path) -> Result<CliConfig> {
    let config = ConfigBuilder::from_file(path)?
        .env_overrides()?
        .device(cli.device)
        .log_level(cli.log_level.clone())
        .log_format(cli.log_format.clone())
        .build();
    Ok(config)
}

/// Setup logging based on configuration
fn setup_logging(config: &CliConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format.as_str() {
        "json" => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init();
        }
        "compact" => {
            subscriber.compact().init();
        }
        _ => {
            subscriber.pretty().init();
        }
    }
}

fn handle_config_command(action: ConfigAction, path: &Path, config: &CliConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let text =
                toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            println!("{text}");
        }
        ConfigAction::Validate => {
            config.embedding.validate().context("Configuration is invalid")?;
            println!("{}", style("Configuration is valid").green());
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
