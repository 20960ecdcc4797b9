//! Wireless network model and scan de-duplication.

use serde::{Deserialize, Serialize};

/// Security advertised by an access point, with the wire names the scan
/// tools and the admin frontend exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Security {
    #[serde(rename = "--")]
    Open,
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WPA2")]
    Wpa2,
}

impl Security {
    /// Map a scan tool's SECURITY cell. `nmcli` prints a space-separated
    /// list ("WPA1 WPA2"); the strongest listed variant wins.
    pub fn from_scan(cell: &str) -> Self {
        if cell.contains("WPA2") {
            Security::Wpa2
        } else if cell.contains("WPA") {
            Security::Wpa
        } else {
            Security::Open
        }
    }
}

/// One scanned access point. `quality` is higher-is-stronger but the unit is
/// tool-dependent (signal percentage from nmcli, dBm from iwlist); it is
/// compared, never normalized. `speed` is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessNetwork {
    pub ssid: String,
    pub security: Security,
    pub quality: f64,
    pub channel: i64,
    pub speed: String,
}

/// Collapse raw scan output (one entry per reachable access point) down to
/// one entry per network name, keeping the strongest signal.
///
/// Reproduces the original drop-all-then-reinsert loop: while some SSID has
/// more than one entry, its maximum-quality entry (strict `>`, so ties keep
/// whichever was scanned first) survives and moves to the back of the list.
/// Pure and deterministic; blank/hidden SSIDs are filtered by the caller.
pub fn dedupe_strongest(mut networks: Vec<WirelessNetwork>) -> Vec<WirelessNetwork> {
    loop {
        let Some(duplicated) = networks
            .iter()
            .rev()
            .find(|candidate| {
                networks
                    .iter()
                    .filter(|other| other.ssid == candidate.ssid)
                    .count()
                    > 1
            })
            .map(|candidate| candidate.ssid.clone())
        else {
            return networks;
        };

        let mut strongest: Option<&WirelessNetwork> = None;
        for network in networks.iter().filter(|n| n.ssid == duplicated) {
            match strongest {
                Some(best) if network.quality > best.quality => strongest = Some(network),
                Some(_) => {}
                None => strongest = Some(network),
            }
        }
        // The duplicated SSID has at least two entries, so a survivor exists.
        let Some(survivor) = strongest.cloned() else {
            return networks;
        };

        networks.retain(|n| n.ssid != duplicated);
        networks.push(survivor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(ssid: &str, quality: f64) -> WirelessNetwork {
        WirelessNetwork {
            ssid: ssid.to_string(),
            security: Security::Wpa2,
            quality,
            channel: 6,
            speed: "130 Mbit/s".to_string(),
        }
    }

    fn ssids(networks: &[WirelessNetwork]) -> Vec<&str> {
        networks.iter().map(|n| n.ssid.as_str()).collect()
    }

    #[test]
    fn keeps_the_strongest_entry_per_ssid() {
        let reduced = dedupe_strongest(vec![
            net("Home", 60.0),
            net("Home", 85.0),
            net("Guest", 40.0),
        ]);

        assert_eq!(reduced.len(), 2);
        let home = reduced.iter().find(|n| n.ssid == "Home").unwrap();
        assert_eq!(home.quality, 85.0);
        let guest = reduced.iter().find(|n| n.ssid == "Guest").unwrap();
        assert_eq!(guest.quality, 40.0);
        // Drop/reinsert moves the survivor of the duplicated name back.
        assert_eq!(ssids(&reduced), vec!["Guest", "Home"]);
    }

    #[test]
    fn distinct_ssids_pass_through() {
        let input = vec![net("A", 10.0), net("B", 20.0), net("C", 30.0)];
        assert_eq!(dedupe_strongest(input.clone()), input);
    }

    #[test]
    fn output_ssids_are_pairwise_distinct_with_maximal_quality() {
        let input = vec![
            net("A", 10.0),
            net("B", 50.0),
            net("A", 90.0),
            net("B", 40.0),
            net("A", 30.0),
            net("C", 5.0),
        ];
        let reduced = dedupe_strongest(input.clone());

        for ssid in ["A", "B", "C"] {
            let matches: Vec<_> = reduced.iter().filter(|n| n.ssid == ssid).collect();
            assert_eq!(matches.len(), 1, "{ssid} must survive exactly once");
            let max = input
                .iter()
                .filter(|n| n.ssid == ssid)
                .map(|n| n.quality)
                .fold(f64::MIN, f64::max);
            assert_eq!(matches[0].quality, max);
        }
    }

    #[test]
    fn reduction_is_idempotent() {
        let once = dedupe_strongest(vec![
            net("Home", 60.0),
            net("Home", 85.0),
            net("Guest", 40.0),
            net("Guest", 41.0),
        ]);
        let twice = dedupe_strongest(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn quality_ties_keep_the_first_scanned_entry() {
        let mut first = net("Home", 70.0);
        first.channel = 1;
        let mut second = net("Home", 70.0);
        second.channel = 11;

        let reduced = dedupe_strongest(vec![first, second]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].channel, 1);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(dedupe_strongest(Vec::new()).is_empty());
    }

    #[test]
    fn security_cell_mapping() {
        assert_eq!(Security::from_scan("--"), Security::Open);
        assert_eq!(Security::from_scan(""), Security::Open);
        assert_eq!(Security::from_scan("WPA"), Security::Wpa);
        assert_eq!(Security::from_scan("WPA1 WPA2"), Security::Wpa2);
        assert_eq!(Security::from_scan("WPA2"), Security::Wpa2);
    }
}
