//! Admission gate binary.
//!
//! Loads and validates configuration, then serves the gate: network block
//! list → identity → build token → rate limit, in front of the build
//! endpoints, with an exempt version endpoint beside them.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use admission_gate::config::load_config;
use admission_gate::lifecycle::{watch_signals, Shutdown};
use admission_gate::observability::{logging, metrics};
use admission_gate::GateServer;

#[derive(Parser)]
#[command(name = "admission-gate", version, about = "Request-admission gate")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Malformed configuration is fatal here, never per-request.
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("admission-gate: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        ban_networks = config.ban_networks.len(),
        rate_limit = config.rate_limit.limit,
        rate_period_secs = config.rate_limit.period_secs,
        auth_enabled = config.auth.enabled,
        check_origin = config.build_token.check_origin,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                // Unreachable after validation, but never worth a panic.
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(bind_address = %config.listener.bind_address, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let server = match GateServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build admission pipeline");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        watch_signals(&shutdown).await;
    });

    if let Err(e) = server.run(listener, server_shutdown).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
