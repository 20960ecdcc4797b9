//! Native backend for hosts without NetworkManager: device state from
//! `ip -br link`, scanning via `iwlist`, association through `wpa_cli`
//! against a running wpa_supplicant.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::network::wifi::{Security, WirelessNetwork};

use super::{DeviceState, NetworkBackend};

/// wpa_cli acknowledges each control-interface command with OK/FAIL.
fn is_wpa_cli_ok(output: &str) -> bool {
    output.lines().last().is_some_and(|line| line.trim() == "OK")
}

pub struct NativeWifiBackend {
    iface: String,
}

impl NativeWifiBackend {
    pub fn new(iface: impl Into<String>) -> Self {
        Self {
            iface: iface.into(),
        }
    }
}

#[async_trait]
impl NetworkBackend for NativeWifiBackend {
    async fn device_states(&self, exec: &CommandExecutor) -> Result<Vec<DeviceState>> {
        let output = exec.execute("ip -br link").await?;
        // lo     UNKNOWN  00:00:00:00:00:00 <LOOPBACK,UP,LOWER_UP>
        // eth0   UP       52:54:00:11:22:33 <BROADCAST,MULTICAST,UP,LOWER_UP>
        // wlan0  DOWN     d8:3a:dd:44:55:66 <BROADCAST,MULTICAST>
        Ok(output
            .lines()
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                let device = tokens.next()?.trim_end_matches('@').to_string();
                let oper = tokens.next().unwrap_or_default();
                let state = match oper {
                    "UP" => "connected",
                    "DOWN" => "disconnected",
                    _ => "disconnected",
                };
                let kind = if device == "lo" {
                    "loopback"
                } else if device.starts_with('w') {
                    "wifi"
                } else {
                    "ethernet"
                };
                Some(DeviceState {
                    device,
                    kind: kind.to_string(),
                    state: state.to_string(),
                    connection: String::new(),
                })
            })
            .collect())
    }

    async fn scan_wifi(&self, exec: &CommandExecutor) -> Result<Vec<WirelessNetwork>> {
        let output = exec.sudo(&format!("iwlist {} scan", self.iface)).await?;
        Ok(parse_iwlist_scan(&output))
    }

    async fn current_connection(&self, exec: &CommandExecutor, iface: &str) -> Result<String> {
        // iwgetid exits non-zero when unassociated; that is not an error
        // from the caller's point of view.
        match exec.execute(&format!("iwgetid -r {iface}")).await {
            Ok(ssid) => Ok(ssid),
            Err(e) => {
                debug!("No current connection on {iface}: {e}");
                Ok(String::new())
            }
        }
    }

    async fn connect(
        &self,
        exec: &CommandExecutor,
        ssid: &str,
        password: &str,
        iface: &str,
    ) -> Result<bool> {
        if let Err(e) = exec.sudo("rfkill unblock wifi").await {
            warn!("Cannot enable radio: {e}");
        }

        // The wpa_cli sequence used by raspi-config: register a network
        // block, point it at the SSID/PSK, enable it, persist.
        let id = exec.sudo(&format!("wpa_cli -i {iface} add_network")).await?;
        let id = id.trim();

        let steps = [
            format!("wpa_cli -i {iface} set_network {id} ssid '\"{ssid}\"'"),
            format!("wpa_cli -i {iface} set_network {id} psk '\"{password}\"'"),
            format!("wpa_cli -i {iface} enable_network {id}"),
            format!("wpa_cli -i {iface} save_config"),
        ];
        for step in &steps {
            let result = exec.sudo(step).await?;
            if !is_wpa_cli_ok(&result) {
                debug!("Set wifi \"{ssid}\" on \"{iface}\" => {result}");
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn disconnect(&self, exec: &CommandExecutor, ssid: &str) -> Result<bool> {
        let result = exec
            .sudo(&format!("wpa_cli -i {} disconnect", self.iface))
            .await?;
        debug!("Disable wifi \"{ssid}\" => {result}");
        Ok(is_wpa_cli_ok(&result))
    }
}

/// Parse `iwlist <iface> scan` output: one "Cell NN" block per access
/// point, attributes as indented `Key:Value`/`Key=Value` lines. Quality is
/// the dBm signal level (higher, i.e. closer to zero, is stronger), so the
/// reducer's comparison works unchanged.
fn parse_iwlist_scan(output: &str) -> Vec<WirelessNetwork> {
    let mut networks = Vec::new();
    let mut current: Option<IwlistCell> = None;

    for raw in output.lines() {
        let line = raw.trim();
        if line.starts_with("Cell ") {
            if let Some(cell) = current.take() {
                networks.push(cell.into_network());
            }
            current = Some(IwlistCell::default());
            continue;
        }
        let Some(cell) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.strip_prefix("ESSID:") {
            let ssid = rest.trim_matches('"');
            // Hidden networks broadcast \x00 padding instead of a name.
            if !ssid.contains("\\x00") {
                cell.ssid = ssid.to_string();
            }
        } else if let Some(rest) = line.strip_prefix("Channel:") {
            cell.channel = rest.trim().parse().unwrap_or(0);
        } else if line.starts_with("Quality=") {
            if let Some(level) = line.split("Signal level=").nth(1) {
                let number: String = level
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
                    .collect();
                cell.signal = number.parse().unwrap_or(0.0);
            }
        } else if let Some(rest) = line.strip_prefix("Encryption key:") {
            cell.encrypted = rest.trim() == "on";
        } else if let Some(rest) = line.strip_prefix("Bit Rates:") {
            if cell.rates.is_empty() {
                cell.rates = rest
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
            }
        } else if line.contains("IEEE 802.11i/WPA2") {
            cell.wpa2 = true;
        } else if line.contains("WPA Version 1") {
            cell.wpa1 = true;
        }
    }
    if let Some(cell) = current.take() {
        networks.push(cell.into_network());
    }
    networks
}

#[derive(Default)]
struct IwlistCell {
    ssid: String,
    channel: i64,
    signal: f64,
    encrypted: bool,
    wpa1: bool,
    wpa2: bool,
    rates: String,
}

impl IwlistCell {
    fn into_network(self) -> WirelessNetwork {
        let security = if !self.encrypted {
            Security::Open
        } else if self.wpa2 {
            Security::Wpa2
        } else {
            Security::Wpa
        };
        WirelessNetwork {
            ssid: self.ssid,
            security,
            quality: self.signal,
            channel: self.channel,
            speed: self.rates,
        }
    }
}
