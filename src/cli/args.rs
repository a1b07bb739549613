//! CLI argument definitions using clap
//!
//! Commands:
//! - intake-vault serve --config <path> [--port <port>]
//! - intake-vault check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// intake-vault - encrypted questionnaire record store
#[derive(Parser, Debug)]
#[command(name = "intake-vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./intake-vault.json")]
        config: PathBuf,

        /// Port override (takes precedence over config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load and validate configuration, then exit
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./intake-vault.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["intake-vault", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./intake-vault.json"));
                assert_eq!(port, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_config_path() {
        let cli =
            Cli::try_parse_from(["intake-vault", "check-config", "--config", "/etc/iv.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::CheckConfig { config } if config == PathBuf::from("/etc/iv.json")
        ));
    }
}
