use std::sync::Arc;

use clap::{Arg, Command};
use sims_core::RegistryConfig;
use sims_rpc::{SimsRpcConfig, SimsRpcServer};
use tokio::sync::watch;
use tracing::info;

fn validate_duration_secs(value: &str) -> Result<u64, String> {
    value.parse::<u64>().map_err(|_| "invalid number of seconds".to_owned())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "sims-rpc starting");

    let matches = Command::new("sims-rpc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Binary-framed RPC transport for the instant messaging hub")
        .arg(
            Arg::new("bind_addr")
                .help("Address to bind the RPC listener to")
                .long("bind-addr")
                .env("SIMS_RPC_BIND_ADDR")
                .default_value("0.0.0.0:7000"),
        )
        .arg(
            Arg::new("pprof_address")
                .help("Address for the diagnostics stub listener")
                .long("pprof-address")
                .env("PPROF_ADDRESS"),
        )
        .arg(
            Arg::new("housekeep_interval_secs")
                .help("Interval between inactive-channel sweeps")
                .long("housekeep-interval-secs")
                .env("SIMS_HOUSEKEEP_INTERVAL_SECS")
                .value_parser(validate_duration_secs)
                .default_value("5"),
        )
        .arg(
            Arg::new("channel_inactivity_secs")
                .help("How long a channel may go without a heartbeat before eviction")
                .long("channel-inactivity-secs")
                .env("SIMS_CHANNEL_INACTIVITY_SECS")
                .value_parser(validate_duration_secs)
                .default_value("10"),
        )
        .get_matches();

    let bind_addr = matches.get_one::<String>("bind_addr").unwrap().clone();
    let housekeep_interval_secs = *matches.get_one::<u64>("housekeep_interval_secs").unwrap();
    let channel_inactivity_secs = *matches.get_one::<u64>("channel_inactivity_secs").unwrap();

    if let Some(pprof_address) = matches.get_one::<String>("pprof_address") {
        sims_rpc_diagnostics::spawn_stub_listener(pprof_address.clone());
    }

    let registry_config = RegistryConfig {
        housekeep_interval: std::time::Duration::from_secs(housekeep_interval_secs),
        channel_inactivity: std::time::Duration::from_secs(channel_inactivity_secs),
    };

    let server = SimsRpcServer::bind(SimsRpcConfig {
        bind_addr,
        registry: registry_config,
    })
    .await
    .expect("failed to bind sims-rpc listener");

    let registry = server.registry();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let housekeeper = sims_core::housekeeper::spawn(Arc::clone(&registry), shutdown_rx.clone());

    let serve_task = tokio::spawn(server.serve(shutdown_rx));

    shutdown_signal().await;
    info!("shutting down");
    registry.close();
    let _ = shutdown_tx.send(true);
    let _ = serve_task.await;
    let _ = housekeeper.await;
}

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

/// Minimal diagnostics stub: binds the configured address so deployments
/// that expect a `pprof_address` to be listening get one, even though this
/// binary has no Go-pprof equivalent to serve over it.
mod sims_rpc_diagnostics {
    use tokio::net::TcpListener;
    use tracing::{info, warn};

    pub fn spawn_stub_listener(addr: String) {
        tokio::spawn(async move {
            match TcpListener::bind(&addr).await {
                Ok(listener) => {
                    info!(%addr, "diagnostics stub listening");
                    loop {
                        if listener.accept().await.is_err() {
                            break;
                        }
                    }
                }
                Err(err) => warn!(%addr, error = %err, "failed to bind diagnostics stub"),
            }
        });
    }
}
