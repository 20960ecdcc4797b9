use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    NetworkManager,
    NativeWifi,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DaemonConfig {
    pub socket_path: String,
    pub backend: BackendKind,
    /// Interface the native backend scans and associates on.
    pub wifi_interface: String,
    /// How long shutdown waits for an in-flight command to finish.
    pub drain_timeout_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: "/run/netset/netsetd.sock".to_string(),
            backend: BackendKind::NetworkManager,
            wifi_interface: "wlan0".to_string(),
            drain_timeout_ms: 4000,
        }
    }
}

impl DaemonConfig {
    pub fn load(path: &str) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| Error::Config(format!("{path}: {e}")))
            }
            Err(_) => {
                // Create default config if not found
                let config = Self::default();
                if let Ok(rendered) = toml::to_string_pretty(&config) {
                    let _ = fs::write(path, rendered);
                }
                Ok(config)
            }
        }
    }
}
