//! CLI command implementations

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::config::{ServiceConfig, StoreBackend};
use crate::http_server::{AppState, HttpServer};
use crate::observability::{init_logging, Event};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::CheckConfig { config } => {
            let stdout = std::io::stdout();
            check_config(&config, &mut stdout.lock())
        }
    }
}

/// Boot every service and serve HTTP until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = ServiceConfig::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    init_logging(&config.log_level, config.log_format);
    tracing::info!(
        event = Event::ConfigLoaded.as_str(),
        path = %config_path.display(),
        backend = ?config.store.backend,
        enrollment = config.enrollment.is_some(),
        geolocation = config.geolocation.enabled,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let state = AppState::from_config(&config)?;
        let server = HttpServer::new(config.http.clone(), Arc::new(state));
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate configuration and print a JSON summary to `out`
pub fn check_config(config_path: &Path, out: &mut impl Write) -> CliResult<()> {
    let config = ServiceConfig::load(config_path)?;
    let state = AppState::from_config(&config)?;

    let credentials = match state.authenticator.config_error() {
        None => json!({ "configured": true }),
        Some(err) => json!({ "configured": false, "error": err.to_string() }),
    };

    let summary = json!({
        "status": "ok",
        "store": match config.store.backend {
            StoreBackend::Github => "github",
            StoreBackend::Memory => "memory",
        },
        "namespaces": {
            "survey": config.namespaces.survey,
            "waitlist": config.namespaces.waitlist,
        },
        "credentials": credentials,
        "enrollment": config.enrollment.is_some(),
        "geolocation": config.geolocation.enabled,
    });

    serde_json::to_writer(&mut *out, &summary)?;
    writeln!(out)?;
    Ok(())
}
