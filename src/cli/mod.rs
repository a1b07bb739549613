//! CLI module
//!
//! - serve: load configuration, build services, run the HTTP API
//! - check-config: validate configuration and print a summary

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
