//! CLI argument definitions using clap
//!
//! Commands:
//! - aero-update apply --record <path> --update <path> [--rules <path>] [--types <path>] [--config <path>]
//! - aero-update validate --field <name> --value <json> --rules <path> [--config <path>]
//! - aero-update operators
//!
//! Any input path may be `-` to read that document from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aero-update - Apply update documents to JSON records
#[derive(Parser, Debug)]
#[command(name = "aero-update")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply an update document to a record and print the result
    Apply {
        /// Record to update (JSON object)
        #[arg(long)]
        record: PathBuf,

        /// Update document (JSON object keyed by operator)
        #[arg(long)]
        update: PathBuf,

        /// Field rules (JSON object keyed by field path)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Declared field types (JSON object keyed by field)
        #[arg(long)]
        types: Option<PathBuf>,

        /// Engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run a single value through a field's rules
    Validate {
        /// Field path the rules are declared for
        #[arg(long)]
        field: String,

        /// Candidate value as JSON text
        #[arg(long)]
        value: String,

        /// Field rules (JSON object keyed by field path)
        #[arg(long)]
        rules: PathBuf,

        /// Engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the supported operators by family
    Operators,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
