//! Line-delimited JSON IPC over a Unix domain socket.
//!
//! Each client connection carries one JSON request per line and receives
//! one JSON response per line. The envelope is `{"command": ..., "message":
//! ...}`; responses are tagged with a `type` field. A malformed line gets an
//! error response instead of dropping the connection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info};

use crate::network::{InterfaceChange, NetworkInterface, NetworkService};
use crate::network::wifi::WirelessNetwork;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "message", rename_all = "camelCase")]
pub enum Request {
    Interfaces,
    Wifi,
    Dns,
    WifiConnection { iface: String },
    WifiConnect { ssid: String, password: String, iface: String },
    WifiDisconnect { ssid: String },
    ChangeInterface(InterfaceChange),
}

impl Request {
    /// Wire name of the command, for log lines. Payloads can carry
    /// credentials and are never logged.
    pub fn command_name(&self) -> &'static str {
        match self {
            Request::Interfaces => "interfaces",
            Request::Wifi => "wifi",
            Request::Dns => "dns",
            Request::WifiConnection { .. } => "wifiConnection",
            Request::WifiConnect { .. } => "wifiConnect",
            Request::WifiDisconnect { .. } => "wifiDisconnect",
            Request::ChangeInterface(_) => "changeInterface",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Interfaces { interfaces: Vec<NetworkInterface> },
    Wifi { networks: Vec<WirelessNetwork> },
    Dns { servers: Vec<String> },
    WifiConnection { connection: String },
    Result { success: bool },
    Error { error: String },
}

pub struct IpcServer {
    listener: UnixListener,
    service: Arc<NetworkService>,
}

impl IpcServer {
    pub fn new(listener: UnixListener, service: Arc<NetworkService>) -> Self {
        Self { listener, service }
    }

    /// Accept clients until the surrounding select! cancels us.
    pub async fn run(&self) -> std::io::Result<()> {
        loop {
            let (stream, _) = self.listener.accept().await?;
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Err(e) = handle_client(stream, service).await {
                    debug!("Client connection closed: {e}");
                }
            });
        }
    }
}

async fn handle_client(
    stream: UnixStream,
    service: Arc<NetworkService>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                info!("Handling {} request", request.command_name());
                dispatch(request, &service).await
            }
            Err(e) => {
                error!("Cannot parse request: {e}");
                Response::Error {
                    error: format!("invalid request: {e}"),
                }
            }
        };

        let mut payload = serde_json::to_vec(&response).unwrap_or_default();
        payload.push(b'\n');
        writer.write_all(&payload).await?;
    }
    Ok(())
}

async fn dispatch(request: Request, service: &NetworkService) -> Response {
    match request {
        Request::Interfaces => Response::Interfaces {
            interfaces: service.list_interfaces().await,
        },
        Request::Wifi => Response::Wifi {
            networks: service.list_wifi_networks().await,
        },
        Request::Dns => Response::Dns {
            servers: service.current_dns(),
        },
        Request::WifiConnection { iface } => Response::WifiConnection {
            connection: service.current_wifi_connection(&iface).await,
        },
        Request::WifiConnect {
            ssid,
            password,
            iface,
        } => Response::Result {
            success: service.connect_wifi(&ssid, &password, &iface).await,
        },
        Request::WifiDisconnect { ssid } => Response::Result {
            success: service.disconnect_wifi(&ssid).await,
        },
        Request::ChangeInterface(change) => Response::Result {
            success: service.change_interface(&change).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_commands_need_no_message() {
        let request: Request = serde_json::from_str(r#"{"command":"interfaces"}"#).unwrap();
        assert!(matches!(request, Request::Interfaces));

        let request: Request = serde_json::from_str(r#"{"command":"wifi"}"#).unwrap();
        assert!(matches!(request, Request::Wifi));
    }

    #[test]
    fn payload_commands_carry_a_message() {
        let request: Request = serde_json::from_str(
            r#"{"command":"wifiConnect","message":{"ssid":"Home","password":"secret","iface":"wlan0"}}"#,
        )
        .unwrap();
        match request {
            Request::WifiConnect {
                ssid,
                password,
                iface,
            } => {
                assert_eq!(ssid, "Home");
                assert_eq!(password, "secret");
                assert_eq!(iface, "wlan0");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn change_interface_fills_omitted_fields() {
        let request: Request = serde_json::from_str(
            r#"{"command":"changeInterface","message":{"iface":"eth0","dhcp":true}}"#,
        )
        .unwrap();
        match request {
            Request::ChangeInterface(change) => {
                assert_eq!(change.iface, "eth0");
                assert!(change.dhcp);
                assert_eq!(change.ip4, "");
                assert!(change.dns.is_empty());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn log_name_carries_no_payload() {
        let request = Request::WifiConnect {
            ssid: "Home".to_string(),
            password: "secret".to_string(),
            iface: "wlan0".to_string(),
        };
        assert_eq!(request.command_name(), "wifiConnect");
        assert_eq!(Request::Interfaces.command_name(), "interfaces");
    }

    #[test]
    fn unknown_command_is_a_parse_error() {
        assert!(serde_json::from_str::<Request>(r#"{"command":"reboot"}"#).is_err());
    }

    #[test]
    fn responses_are_type_tagged() {
        let json = serde_json::to_string(&Response::Result { success: true }).unwrap();
        assert_eq!(json, r#"{"type":"result","success":true}"#);

        let json = serde_json::to_string(&Response::WifiConnection {
            connection: "Home".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"wifiConnection","connection":"Home"}"#);

        let json = serde_json::to_string(&Response::Dns {
            servers: vec!["1.1.1.1".to_string()],
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"dns","servers":["1.1.1.1"]}"#);
    }
}
