//! Platform network backends.
//!
//! All live WI-FI and device-state operations go through one of two
//! tool families, chosen once at startup: NetworkManager (`nmcli`) on
//! desktop-style hosts, or the wpa_supplicant/iwlist toolchain on minimal
//! installations that do not run NetworkManager.

pub mod native_wifi;
pub mod network_manager;

use async_trait::async_trait;

use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::network::wifi::WirelessNetwork;

pub use native_wifi::NativeWifiBackend;
pub use network_manager::NetworkManagerBackend;

/// Connection state of one device as reported by the backend's tool, still
/// in the tool's vocabulary (`state` may carry qualifiers like
/// "connected (externally)").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub device: String,
    pub kind: String,
    pub state: String,
    pub connection: String,
}

/// The operations the query service and the connection mutator need from
/// the OS tooling. Implementations issue every command through the shared
/// [`CommandExecutor`] so the one-at-a-time guarantee holds across backends.
#[async_trait]
pub trait NetworkBackend: Send + Sync {
    /// Per-device connection state, one entry per tool-reported device.
    async fn device_states(&self, exec: &CommandExecutor) -> Result<Vec<DeviceState>>;

    /// Trigger a rescan and return the raw network list, duplicates and
    /// hidden SSIDs included.
    async fn scan_wifi(&self, exec: &CommandExecutor) -> Result<Vec<WirelessNetwork>>;

    /// Name of the connection the device is currently using, empty when the
    /// device is absent or unassociated.
    async fn current_connection(&self, exec: &CommandExecutor, iface: &str) -> Result<String>;

    /// Associate with `ssid`. Returns the tool's own verdict; transport
    /// failures surface as errors for the caller to downgrade.
    async fn connect(
        &self,
        exec: &CommandExecutor,
        ssid: &str,
        password: &str,
        iface: &str,
    ) -> Result<bool>;

    /// Tear down the connection named `ssid`.
    async fn disconnect(&self, exec: &CommandExecutor, ssid: &str) -> Result<bool>;
}

/// The success convention shared by the nmcli verbs: outcome is judged by a
/// marker substring in stdout, not by exit code (the executor already
/// rejects on non-zero exit, so checking the code here would double-report).
/// Single point of change if the tool's output format ever shifts.
pub fn is_success_marker(output: &str) -> bool {
    output.contains("successfully")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_marker_matches_nmcli_verdicts() {
        assert!(is_success_marker(
            "Device 'wlan0' successfully activated with 'e123…'."
        ));
        assert!(is_success_marker(
            "Connection 'Home' successfully deactivated"
        ));
        assert!(!is_success_marker(
            "Error: no network with SSID 'MySSID' found."
        ));
        assert!(!is_success_marker(""));
    }
}
