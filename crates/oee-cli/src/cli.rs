//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// OEE signal engine.
///
/// Ingests timestamped equipment signals and derives state timelines and
/// Overall Equipment Effectiveness metrics from them.
#[derive(Debug, Parser)]
#[command(name = "oee", version, about, long_about = None)]
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
    /// Show database location and per-entity signal activity.
    Status,

    /// Ingest a JSON batch of signals from a file or stdin.
    Ingest {
        /// File containing a JSON array of signals (defaults to stdin).
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Compute OEE metrics for one entity over a time window.
    Report {
        /// The equipment entity to report on.
        #[arg(long)]
        entity: String,

        /// Window start (RFC 3339; defaults to the entity's first signal).
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Window end (RFC 3339; defaults to the entity's last signal).
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// Reconstruct the operating-state timeline for one entity.
    Transitions {
        /// The equipment entity to reconstruct.
        #[arg(long)]
        entity: String,

        /// Range start (RFC 3339; defaults to the entity's first signal).
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Range end (RFC 3339; defaults to the entity's last signal).
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}
