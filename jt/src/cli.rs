//! CLI argument parsing for the jt submitter tool

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jt")]
#[command(author, version, about = "Submitter-side job table tool for fairsched", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Shared table name (overrides config)
    #[arg(short, long)]
    pub table: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the shared job table the scheduler will attach to
    Create {
        /// Number of concurrent CPU slots
        #[arg(long)]
        ncpu: Option<u32>,

        /// Scheduling quantum in milliseconds
        #[arg(long)]
        tslice: Option<u32>,
    },

    /// Submit a command as a job
    Submit {
        /// Cost weight: higher values get less CPU share (min 1)
        #[arg(short, long, default_value = "1")]
        priority: u32,

        /// Return immediately instead of watching for the job's exit
        #[arg(long)]
        no_wait: bool,

        /// The command to run
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// List jobs and their current state
    Jobs,

    /// Print the per-job accounting report
    Report,

    /// Destroy the table and release its resources
    Destroy,
}
