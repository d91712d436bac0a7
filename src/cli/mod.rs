//! CLI module for aero-update
//!
//! Provides command-line interface for:
//! - apply: Apply an update document to a record
//! - validate: Check a value against field rules
//! - operators: List the operator set

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply, operators, run, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json, read_object, write_error, write_response, STDIN_PATH};
