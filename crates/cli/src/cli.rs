//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// event-batcher - batch structured events into a remote collector
#[derive(Parser, Debug)]
#[command(
    name = "event-batcher",
    author,
    version,
    about = "Batching event dispatcher for analytics collectors",
    long_about = "Reads structured events, folds bursts into per-category batches \n\
                  and posts each batch to the collector as a single JSON write.\n\n\
                  Delivery is best effort: failed batches are logged and dropped."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVENT_BATCHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVENT_BATCHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send JSON-lines events to the collector
    Send(SendArgs),

    /// Validate configuration file without sending anything
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Path to configuration file (TOML or JSON); optional when
    /// --project-id and --write-key are given
    #[arg(
        short,
        long,
        default_value = "batcher.toml",
        env = "EVENT_BATCHER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the destination project id
    #[arg(long, env = "EVENT_BATCHER_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Override the write key
    #[arg(long, env = "EVENT_BATCHER_WRITE_KEY", hide_env_values = true)]
    pub write_key: Option<String>,

    /// Override the collector base URL
    #[arg(long, env = "EVENT_BATCHER_BASE_URL")]
    pub base_url: Option<String>,

    /// Override the queue capacity
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Override the flush threshold
    #[arg(long)]
    pub flush_threshold: Option<usize>,

    /// Read events from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Treat every input line as a bare payload for this category
    #[arg(long)]
    pub category: Option<String>,

    /// Log batches instead of posting them
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "EVENT_BATCHER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "batcher.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "batcher.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
