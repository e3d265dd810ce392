//! CLI parse: clap types for snaptree. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// snaptree - batched edits on content-addressed snapshots
#[derive(Debug, Parser)]
#[command(name = "snaptree")]
#[command(about = "Stage path edits and publish them as immutable snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create .snaptree/ with an empty store and default config
    Init,
    /// Stage every operation of a JSON batch file and publish them as one commit
    Apply {
        /// JSON array of {"op": "write"|"remove"|"move", ...} objects
        batch: PathBuf,
        /// Commit subject line
        #[arg(long, short)]
        message: Option<String>,
    },
    /// Print a file from the head snapshot
    Show { path: String },
    /// List a directory of the head snapshot
    Ls { path: Option<String> },
    /// Show published commits, newest first
    Log {
        /// Maximum number of commits
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },
    /// Compare the working directory with the head snapshot
    Status,
}
