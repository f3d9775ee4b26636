//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fleet Epoch - Multi-agent epoch aggregation pipeline
#[derive(Parser, Debug)]
#[command(
    name = "fleet-epoch",
    author,
    version,
    about = "Multi-agent epoch aggregation pipeline",
    long_about = "Aggregates ranging, pose, and control observations from a fleet of \n\
                  agents into complete per-epoch bundles.\n\n\
                  Builds the connectivity graph from configuration, buffers partial \n\
                  observations, and dispatches each completed epoch to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLEET_EPOCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FLEET_EPOCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the aggregation pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "FLEET_EPOCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Override ego agent id from configuration
    #[arg(long, env = "FLEET_EPOCH_AGENT_ID")]
    pub agent_id: Option<u32>,

    /// Override epoch frequency (Hz) from configuration
    #[arg(long, env = "FLEET_EPOCH_FREQUENCY")]
    pub frequency: Option<f64>,

    /// Maximum number of epoch bundles to produce (0 = unlimited)
    #[arg(long, default_value = "0", env = "FLEET_EPOCH_MAX_EPOCHS")]
    pub max_epochs: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FLEET_EPOCH_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for internal queues
    #[arg(long, default_value = "100", env = "FLEET_EPOCH_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "FLEET_EPOCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the external-to-internal identity table
    #[arg(long)]
    pub identity: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
