//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::parse::ParseArgs;

/// Timetable extractor.
///
/// Reads OCR token and table bundles and writes normalised weekly
/// timetables as JSON.
#[derive(Debug, Parser)]
#[command(name = "ttx", version, about, long_about = None)]
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
    /// Parse input bundles into timetable documents.
    Parse(ParseArgs),

    /// Summarise and check a parsed document.
    Report {
        /// Document JSON written by `ttx parse`.
        document: PathBuf,
    },
}
