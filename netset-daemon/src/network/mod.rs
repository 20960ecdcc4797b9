/*!
 * Network Query Service and Connection Mutator
 * Merges the OS's own view of the interfaces with tool-derived state and
 * drives connect/disconnect/reconfigure operations.
 */

pub mod backend;
pub mod platform;
pub mod wifi;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::exec::CommandExecutor;
use backend::{DeviceState, NetworkBackend};
use platform::OsInterface;
use wifi::{dedupe_strongest, WirelessNetwork};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    Wired,
    Wireless,
}

impl InterfaceKind {
    /// The managed platforms name WI-FI interfaces with a `w` prefix
    /// (wlan0, wlp3s0); everything else is treated as wired. A heuristic
    /// carried over intentionally.
    fn from_name(name: &str) -> Self {
        if name.starts_with('w') {
            InterfaceKind::Wireless
        } else {
            InterfaceKind::Wired
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Connecting,
}

impl ConnectionState {
    /// First whitespace-delimited word of the tool's STATE cell, so
    /// "connected (externally)" counts as connected. Unknown tokens
    /// (unavailable, unmanaged, ...) read as disconnected.
    fn from_state_cell(cell: &str) -> Self {
        match cell.split_whitespace().next() {
            Some("connected") => ConnectionState::Connected,
            Some("connecting") => ConnectionState::Connecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// One entry of the user-facing interface list. Rebuilt on every query by
/// merging OS enumeration with command-derived status; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub iface: String,
    pub ip4: String,
    pub ip4subnet: String,
    pub ip6: String,
    pub ip6subnet: String,
    pub mac: String,
    pub gateway: String,
    pub dns: Vec<String>,
    pub dhcp: bool,
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    pub status: ConnectionState,
    pub editable: bool,
}

impl NetworkInterface {
    fn from_os(os: OsInterface, gateway: String, dns: Vec<String>) -> Self {
        let kind = InterfaceKind::from_name(&os.name);
        Self {
            iface: os.name,
            ip4: os.ip4,
            ip4subnet: os.ip4subnet,
            ip6: os.ip6,
            ip6subnet: os.ip6subnet,
            mac: os.mac,
            gateway,
            dns,
            dhcp: false,
            kind,
            status: ConnectionState::Disconnected,
            editable: false,
        }
    }

    /// Skeleton entry for a device the tool reports but the OS does not
    /// enumerate.
    fn minimal(device: &str, status: ConnectionState) -> Self {
        Self {
            iface: device.to_string(),
            ip4: String::new(),
            ip4subnet: String::new(),
            ip6: String::new(),
            ip6subnet: String::new(),
            mac: String::new(),
            gateway: String::new(),
            dns: Vec::new(),
            dhcp: false,
            kind: InterfaceKind::from_name(device),
            status,
            editable: false,
        }
    }
}

/// Requested interface reconfiguration, in the shape the admin frontend
/// persists per interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceChange {
    pub iface: String,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub ip4: String,
    #[serde(default)]
    pub ip4subnet: String,
    #[serde(default)]
    pub ip4gateway: String,
    #[serde(default)]
    pub dns: Vec<String>,
}

/// Overlay tool-reported device states onto the OS-enumerated list.
///
/// Known devices get their status replaced; loopback and P2P pseudo-devices
/// the OS did not list are dropped; any other tool-only device is appended
/// as a minimal entry.
fn merge_device_states(
    mut interfaces: Vec<NetworkInterface>,
    states: Vec<DeviceState>,
) -> Vec<NetworkInterface> {
    for state in states {
        let status = ConnectionState::from_state_cell(&state.state);
        if let Some(known) = interfaces.iter_mut().find(|i| i.iface == state.device) {
            known.status = status;
        } else if state.kind == "loopback"
            || state.kind == "wifi-p2p"
            || state.device.starts_with("p2p-")
        {
            continue;
        } else {
            interfaces.push(NetworkInterface::minimal(&state.device, status));
        }
    }
    interfaces
}

/// The daemon-side implementation behind the `interfaces`/`wifi`/`dns`/
/// `wifiConnection`/`wifiConnect`/`wifiDisconnect`/`changeInterface`
/// commands. Failures never escape as errors: every operation degrades to
/// an empty or false result, which is what the frontend expects.
pub struct NetworkService {
    executor: Arc<CommandExecutor>,
    backend: Box<dyn NetworkBackend>,
}

impl NetworkService {
    pub fn new(executor: Arc<CommandExecutor>, backend: Box<dyn NetworkBackend>) -> Self {
        Self { executor, backend }
    }

    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    /// The merged interface list. A failing status command degrades to the
    /// plain OS view instead of failing the query.
    pub async fn list_interfaces(&self) -> Vec<NetworkInterface> {
        if self.executor.is_stopping() {
            return Vec::new();
        }

        let dns = platform::dns_servers();
        let interfaces: Vec<NetworkInterface> = platform::enumerate()
            .into_iter()
            .map(|os| {
                let gateway = platform::default_gateway_v4(&os.name);
                NetworkInterface::from_os(os, gateway, dns.clone())
            })
            .collect();

        match self.backend.device_states(&self.executor).await {
            Ok(states) => merge_device_states(interfaces, states),
            Err(e) => {
                error!("Cannot query device states: {e}");
                interfaces
            }
        }
    }

    /// Rescan and reduce the WI-FI neighborhood: hidden networks are
    /// dropped, duplicate SSIDs collapse to the strongest signal.
    pub async fn list_wifi_networks(&self) -> Vec<WirelessNetwork> {
        if self.executor.is_stopping() {
            return Vec::new();
        }

        let mut networks = match self.backend.scan_wifi(&self.executor).await {
            Ok(networks) => networks,
            Err(e) => {
                error!("Cannot scan wifi networks: {e}");
                return Vec::new();
            }
        };
        networks.retain(|n| !n.ssid.is_empty() && n.ssid != "--");
        dedupe_strongest(networks)
    }

    pub fn current_dns(&self) -> Vec<String> {
        platform::dns_servers()
    }

    /// Connection name the device is currently using; empty when absent.
    pub async fn current_wifi_connection(&self, iface: &str) -> String {
        if self.executor.is_stopping() {
            return String::new();
        }
        match self
            .backend
            .current_connection(&self.executor, iface)
            .await
        {
            Ok(connection) => connection,
            Err(e) => {
                error!("Cannot query wifi connection for {iface}: {e}");
                String::new()
            }
        }
    }

    pub async fn connect_wifi(&self, ssid: &str, password: &str, iface: &str) -> bool {
        if self.executor.is_stopping() {
            return false;
        }
        match self
            .backend
            .connect(&self.executor, ssid, password, iface)
            .await
        {
            Ok(ok) => ok,
            Err(e) => {
                error!("Cannot set wifi: {e}");
                false
            }
        }
    }

    pub async fn disconnect_wifi(&self, ssid: &str) -> bool {
        if self.executor.is_stopping() {
            return false;
        }
        match self.backend.disconnect(&self.executor, ssid).await {
            Ok(ok) => ok,
            Err(e) => {
                error!("Cannot disable wifi: {e}");
                false
            }
        }
    }

    /// Re-address an interface. Static configuration keeps the historical
    /// ifconfig invocation; DHCP hands the interface back to dhcpcd.
    pub async fn change_interface(&self, change: &InterfaceChange) -> bool {
        if self.executor.is_stopping() {
            return false;
        }

        let result = if change.dhcp {
            self.executor
                .sudo(&format!("dhcpcd -n {}", change.iface))
                .await
        } else {
            let static_result = self
                .executor
                .sudo(&format!(
                    "ifconfig {} {} netmask {}",
                    change.iface, change.ip4, change.ip4subnet
                ))
                .await;
            match static_result {
                Ok(output) if !change.ip4gateway.is_empty() => {
                    debug!("Set address on {} => {output}", change.iface);
                    self.executor
                        .sudo(&format!(
                            "ip route replace default via {} dev {}",
                            change.ip4gateway, change.iface
                        ))
                        .await
                }
                other => other,
            }
        };

        match result {
            Ok(_) => true,
            Err(e) => {
                error!("Cannot change interface {}: {e}", change.iface);
                false
            }
        }
    }
}
