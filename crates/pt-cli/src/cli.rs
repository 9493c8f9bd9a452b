//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pt_core::Range;

/// Pulse time tracker.
///
/// Stores activity pulses from editors and agents and turns them into
/// working time by tool, project, language and day.
#[derive(Debug, Parser)]
#[command(name = "pt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store pulses read as JSON lines from stdin.
    Ingest {
        /// User to store pulses for (defaults to the configured user).
        #[arg(long)]
        user: Option<String>,
    },

    /// Show total time with tool, project, language and daily breakdowns.
    Stats(QueryArgs),

    /// List work sessions inferred from pulses.
    Sessions(QueryArgs),

    /// Show the most recent pulse per tool.
    Status,

    /// Delete stored pulses older than the retention window.
    Prune {
        /// Days to keep (defaults to the configured retention).
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Window, filter and output options shared by query commands.
#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// Named range, ignored when --start or --end is given.
    #[arg(long, default_value_t = Range::Week)]
    pub range: Range,

    /// Window start: ISO 8601, YYYY-MM-DD, or relative ("2 days ago").
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (defaults to now).
    #[arg(long)]
    pub end: Option<String>,

    /// Only include pulses for this project.
    #[arg(long)]
    pub project: Option<String>,

    /// Only include pulses from this tool.
    #[arg(long)]
    pub tool: Option<String>,

    /// User to query (defaults to the configured user).
    #[arg(long)]
    pub user: Option<String>,

    /// Read pulses from a JSON lines file instead of the database.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
