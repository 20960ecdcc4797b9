/*!
 * NETSET Command Line Client
 * One-shot JSON IPC requests against netsetd
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use netset_daemon::ipc::Request;
use netset_daemon::network::InterfaceChange;

#[derive(Parser)]
#[command(name = "netset")]
#[command(about = "NETSET Host Network Settings Client")]
struct Cli {
    /// Daemon socket path
    #[arg(short, long, default_value = "/run/netset/netsetd.sock")]
    socket: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List interfaces with their addresses and connection state
    Interfaces,
    /// Scan for wireless networks
    Wifi,
    /// Show the configured DNS servers
    Dns,
    /// Show the connection a wireless interface is using
    Connection {
        iface: String,
    },
    /// Connect a wireless interface to a network
    Connect {
        ssid: String,
        password: String,
        #[arg(default_value = "wlan0")]
        iface: String,
    },
    /// Disconnect a wireless connection by name
    Disconnect {
        ssid: String,
    },
    /// Reconfigure an interface's addressing
    Configure {
        iface: String,
        /// Hand the interface to DHCP instead of static addressing
        #[arg(long)]
        dhcp: bool,
        #[arg(long, default_value = "")]
        ip4: String,
        #[arg(long, default_value = "")]
        ip4subnet: String,
        #[arg(long, default_value = "")]
        gateway: String,
        #[arg(long)]
        dns: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let request = match cli.command {
        Commands::Interfaces => Request::Interfaces,
        Commands::Wifi => Request::Wifi,
        Commands::Dns => Request::Dns,
        Commands::Connection { iface } => Request::WifiConnection { iface },
        Commands::Connect {
            ssid,
            password,
            iface,
        } => Request::WifiConnect {
            ssid,
            password,
            iface,
        },
        Commands::Disconnect { ssid } => Request::WifiDisconnect { ssid },
        Commands::Configure {
            iface,
            dhcp,
            ip4,
            ip4subnet,
            gateway,
            dns,
        } => Request::ChangeInterface(InterfaceChange {
            iface,
            dhcp,
            ip4,
            ip4subnet,
            ip4gateway: gateway,
            dns,
        }),
    };

    let response = send_request(&cli.socket, &request).await?;
    println!("{response}");
    Ok(())
}

async fn send_request(socket_path: &str, request: &Request) -> Result<String> {
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("cannot connect to daemon at {socket_path}"))?;
    let (reader, mut writer) = stream.into_split();

    let mut payload = serde_json::to_vec(request)?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;

    let mut line = String::new();
    BufReader::new(reader)
        .read_line(&mut line)
        .await
        .context("daemon closed the connection")?;
    Ok(line.trim_end().to_string())
}
