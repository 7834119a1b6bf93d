use std::env;
use std::sync::Arc;

use clap::{Arg, Command};
use sims_core::{housekeeper, Registry, RegistryConfig};
use sims_server::state::AppState;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn validate_duration_secs(value: &str) -> Result<u64, String> {
    value.parse::<u64>().map_err(|_| "invalid number of seconds".to_owned())
}

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let matches = Command::new("sims-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("JSON-over-HTTP and WebSocket transport for the instant messaging hub")
        .arg(
            Arg::new("server_address")
                .long("server-address")
                .env("SIMS_SERVER_ADDRESS")
                .default_value("0.0.0.0:8080"),
        )
        .arg(
            Arg::new("pprof_address")
                .long("pprof-address")
                .env("PPROF_ADDRESS"),
        )
        .arg(
            Arg::new("housekeep_interval_secs")
                .long("housekeep-interval-secs")
                .env("SIMS_HOUSEKEEP_INTERVAL_SECS")
                .value_parser(validate_duration_secs)
                .default_value("5"),
        )
        .arg(
            Arg::new("channel_inactivity_secs")
                .long("channel-inactivity-secs")
                .env("SIMS_CHANNEL_INACTIVITY_SECS")
                .value_parser(validate_duration_secs)
                .default_value("10"),
        )
        .get_matches();

    let server_address = matches.get_one::<String>("server_address").unwrap().clone();
    let housekeep_interval_secs = *matches.get_one::<u64>("housekeep_interval_secs").unwrap();
    let channel_inactivity_secs = *matches.get_one::<u64>("channel_inactivity_secs").unwrap();

    if let Some(pprof_address) = matches.get_one::<String>("pprof_address") {
        spawn_diagnostics_stub(pprof_address.clone());
    }

    let registry = Arc::new(Registry::new(RegistryConfig {
        housekeep_interval: std::time::Duration::from_secs(housekeep_interval_secs),
        channel_inactivity: std::time::Duration::from_secs(channel_inactivity_secs),
    }));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let housekeeper_task = housekeeper::spawn(Arc::clone(&registry), shutdown_rx.clone());

    let state = AppState::new(Arc::clone(&registry));
    let router = sims_server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&server_address)
        .await
        .expect("failed to bind");
    info!(addr = %server_address, "sims-server listening");

    // `registry.close()` must run *before* the graceful-shutdown future
    // resolves, not after: axum only returns once every open connection has
    // finished on its own, and a live `/sims/streamer/events` socket is
    // parked in `stream.recv()` until the registry wakes it. Closing after
    // `axum::serve(...).await` would deadlock against that same socket.
    let close_registry = Arc::clone(&registry);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            close_registry.close();
        })
        .await
        .expect("server error");

    let _ = shutdown_tx.send(true);
    let _ = housekeeper_task.await;
    info!("server shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}

/// Binds the configured diagnostics address so deployments that expect a
/// `pprof_address` listener to exist get one, even with no Go-pprof
/// equivalent to serve over it.
fn spawn_diagnostics_stub(addr: String) {
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!(%addr, "diagnostics stub listening");
                loop {
                    if listener.accept().await.is_err() {
                        break;
                    }
                }
            }
            Err(err) => tracing::warn!(%addr, error = %err, "failed to bind diagnostics stub"),
        }
    });
}
