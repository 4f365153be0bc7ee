//! CLI argument parsing for the fsd scheduler daemon

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fsd")]
#[command(author, version, about = "Weighted-fair fixed-slot job scheduler daemon", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Shared table name (overrides config)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduler loop in the foreground
    Run,

    /// Start the scheduler as a background daemon
    Start,

    /// Stop the running daemon (drains before exiting)
    Stop,

    /// Show daemon status
    Status {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Log file location, alongside the other fairsched state
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fairsched")
        .join("logs")
        .join("fsd.log")
}
