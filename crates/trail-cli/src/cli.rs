//! Command-line argument definitions.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Browsing history analytics.
///
/// Reads a browsing-history CSV export and reports domain, time-of-day,
/// category and session statistics.
#[derive(Debug, Parser)]
#[command(name = "trail", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the session idle threshold (minutes).
    #[arg(long, global = true)]
    pub idle_minutes: Option<u32>,

    /// Override the reference timezone (IANA name, e.g. Europe/Berlin).
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the analysis report for an export file.
    Report {
        /// CSV export to analyze.
        file: PathBuf,

        /// Number of top domains to show.
        #[arg(long)]
        top: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a cleaned table as CSV to stdout.
    Export {
        #[command(subcommand)]
        table: ExportTable,
    },
}

/// Tables that can be exported.
#[derive(Debug, Clone, Subcommand)]
pub enum ExportTable {
    /// One row per retained event, with derived fields and session index.
    Events {
        /// CSV export to read.
        file: PathBuf,
    },
    /// One row per session.
    Sessions {
        /// CSV export to read.
        file: PathBuf,
    },
    /// One row per domain with visit count and first/last visit.
    Domains {
        /// CSV export to read.
        file: PathBuf,
    },
    /// Visits per date and hour, for heatmaps.
    Hours {
        /// CSV export to read.
        file: PathBuf,
    },
    /// Visits per category and domain.
    Categories {
        /// CSV export to read.
        file: PathBuf,
    },
}

impl ExportTable {
    /// The export file the table is built from.
    pub fn file(&self) -> &Path {
        match self {
            Self::Events { file }
            | Self::Sessions { file }
            | Self::Domains { file }
            | Self::Hours { file }
            | Self::Categories { file } => file,
        }
    }
}
