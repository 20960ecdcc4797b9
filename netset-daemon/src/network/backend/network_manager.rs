//! NetworkManager backend: drives `nmcli` and parses its aligned tables.
//!
//! The command lines are load-bearing: the admin frontend and deployed
//! hosts expect exactly these invocations.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::network::wifi::{Security, WirelessNetwork};
use crate::table::parse_table;

use super::{is_success_marker, DeviceState, NetworkBackend};

pub struct NetworkManagerBackend;

impl NetworkManagerBackend {
    pub fn new() -> Self {
        Self
    }

    /// Make sure the WI-FI radio is on before a connect attempt. Failures
    /// here are logged and swallowed: a broken radio query must not abort
    /// the connect itself.
    async fn ensure_radio_enabled(&self, exec: &CommandExecutor) {
        match exec.execute("nmcli radio wifi").await {
            Ok(state) if state == "enabled" => {
                debug!("Enable radio => {state}");
            }
            Ok(_) => match exec.sudo("nmcli radio wifi on").await {
                Ok(result) => debug!("Enable radio => {result}"),
                Err(e) => warn!("Cannot enable radio: {e}"),
            },
            Err(e) => warn!("Cannot enable radio: {e}"),
        }
    }
}

impl Default for NetworkManagerBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkBackend for NetworkManagerBackend {
    async fn device_states(&self, exec: &CommandExecutor) -> Result<Vec<DeviceState>> {
        let output = exec.execute("nmcli device status").await?;
        // DEVICE         TYPE      STATE                   CONNECTION
        // eth0           ethernet  connected               Wired connection 1
        // lo             loopback  connected (externally)  lo
        // wlan0          wifi      connected               Android12345
        // p2p-dev-wlan0  wifi-p2p  disconnected            --
        Ok(parse_table(&output)
            .iter()
            .filter_map(|record| {
                let device = record.get("DEVICE")?;
                if device.is_empty() {
                    return None;
                }
                Some(DeviceState {
                    device: device.to_string(),
                    kind: record.get("TYPE").unwrap_or_default().to_string(),
                    state: record.get("STATE").unwrap_or_default().to_string(),
                    connection: record.get("CONNECTION").unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    async fn scan_wifi(&self, exec: &CommandExecutor) -> Result<Vec<WirelessNetwork>> {
        let output = exec.sudo("nmcli dev wifi list --rescan yes").await?;
        // IN-USE  BSSID              SSID          MODE   CHAN  RATE        SIGNAL  BARS  SECURITY
        // *       BA:FF:16:XX:F7:94  Android12356  Infra  6     130 Mbit/s  100     ▂▄▆█  WPA2
        Ok(parse_table(&output)
            .iter()
            .map(|record| WirelessNetwork {
                ssid: record.get("SSID").unwrap_or_default().to_string(),
                security: Security::from_scan(record.get("SECURITY").unwrap_or_default()),
                quality: record
                    .get("SIGNAL")
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(0.0),
                channel: record
                    .get("CHAN")
                    .and_then(|s| s.parse::<i64>().ok())
                    .unwrap_or(0),
                speed: record.get("RATE").unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn current_connection(&self, exec: &CommandExecutor, iface: &str) -> Result<String> {
        let output = exec.execute("nmcli device status").await?;
        Ok(parse_table(&output)
            .iter()
            .find(|record| record.get("DEVICE") == Some(iface))
            .and_then(|record| record.get("CONNECTION"))
            .unwrap_or_default()
            .to_string())
    }

    async fn connect(
        &self,
        exec: &CommandExecutor,
        ssid: &str,
        password: &str,
        iface: &str,
    ) -> Result<bool> {
        self.ensure_radio_enabled(exec).await;

        let result = exec
            .sudo(&format!(
                "nmcli device wifi connect \"{ssid}\" password \"{password}\" ifname \"{iface}\""
            ))
            .await?;
        debug!("Set wifi \"{ssid}\" on \"{iface}\" => {result}");
        Ok(is_success_marker(&result))
    }

    async fn disconnect(&self, exec: &CommandExecutor, ssid: &str) -> Result<bool> {
        let result = exec
            .sudo(&format!("nmcli connection down id \"{ssid}\""))
            .await?;
        debug!("Disable wifi \"{ssid}\" => {result}");
        Ok(is_success_marker(&result))
    }
}
