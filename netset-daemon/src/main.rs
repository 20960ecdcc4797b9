/*!
 * NETSET Host Network Settings Daemon
 * Host-local network control over a Unix socket
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

use netset_daemon::config::{BackendKind, DaemonConfig};
use netset_daemon::exec::CommandExecutor;
use netset_daemon::ipc::IpcServer;
use netset_daemon::network::backend::{NativeWifiBackend, NetworkBackend, NetworkManagerBackend};
use netset_daemon::network::NetworkService;

#[derive(Parser)]
#[command(name = "netsetd")]
#[command(about = "NETSET Host Network Settings Daemon")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/netset/netsetd.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("netset_daemon={}", log_level))
        .init();

    info!("NETSET daemon starting...");

    let config = DaemonConfig::load(&cli.config)?;
    run_daemon(config).await
}

async fn run_daemon(config: DaemonConfig) -> Result<()> {
    let executor = Arc::new(CommandExecutor::shell());

    let backend: Box<dyn NetworkBackend> = match config.backend {
        BackendKind::NetworkManager => Box::new(NetworkManagerBackend::new()),
        BackendKind::NativeWifi => Box::new(NativeWifiBackend::new(&config.wifi_interface)),
    };
    let service = Arc::new(NetworkService::new(Arc::clone(&executor), backend));

    // A stale socket from an unclean shutdown blocks the bind.
    let _ = std::fs::remove_file(&config.socket_path);
    let listener = UnixListener::bind(&config.socket_path)?;
    let server = IpcServer::new(listener, service);

    info!("NETSET daemon ready on socket: {}", config.socket_path);

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("IPC server failed: {e}");
            }
        }
        _ = sigint.recv() => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }

    shutdown(&executor, &config).await;
    let _ = std::fs::remove_file(&config.socket_path);
    info!("NETSET daemon stopped");
    Ok(())
}

/// Stop accepting commands, then give an in-flight one a bounded window to
/// finish before the process exits underneath it.
async fn shutdown(executor: &CommandExecutor, config: &DaemonConfig) {
    executor.begin_shutdown();
    let timed_out = executor
        .wait_for_drain(Duration::from_millis(config.drain_timeout_ms))
        .await;
    if timed_out {
        match executor.current_command().await {
            Some(command) => warn!("Shutdown drain timed out, abandoning \"{command}\""),
            None => warn!("Shutdown drain timed out"),
        }
    }
}
