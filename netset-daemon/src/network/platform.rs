//! Native OS view of the network: interface addresses via `if-addrs`,
//! MAC and loopback detection via sysfs, resolver and default-gateway
//! state from the classic procfs/etc files.

use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// What the OS itself reports about one interface, before any tool-derived
/// status is overlaid.
#[derive(Debug, Clone, Default)]
pub struct OsInterface {
    pub name: String,
    pub ip4: String,
    pub ip4subnet: String,
    pub ip6: String,
    pub ip6subnet: String,
    pub mac: String,
}

/// Enumerate interfaces, keyed and sorted by name. The first IPv4 and the
/// first IPv6 address win when an interface carries several.
pub fn enumerate() -> Vec<OsInterface> {
    let addrs = if_addrs::get_if_addrs().unwrap_or_default();
    let mut by_name: BTreeMap<String, OsInterface> = BTreeMap::new();

    for addr in addrs {
        let entry = by_name.entry(addr.name.clone()).or_insert_with(|| OsInterface {
            name: addr.name.clone(),
            mac: read_mac(&addr.name).unwrap_or_default(),
            ..Default::default()
        });

        match &addr.addr {
            if_addrs::IfAddr::V4(v4) => {
                if entry.ip4.is_empty() {
                    entry.ip4 = v4.ip.to_string();
                    entry.ip4subnet = v4.netmask.to_string();
                }
            }
            if_addrs::IfAddr::V6(v6) => {
                if entry.ip6.is_empty() {
                    entry.ip6 = v6.ip.to_string();
                    entry.ip6subnet = v6.netmask.to_string();
                }
            }
        }
    }

    by_name.into_values().collect()
}

fn read_mac(iface: &str) -> Option<String> {
    let path = Path::new("/sys/class/net").join(iface).join("address");
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// Resolver servers currently configured at the OS level. Direct
/// passthrough, no transformation.
pub fn dns_servers() -> Vec<String> {
    let resolv = fs::read_to_string("/etc/resolv.conf").unwrap_or_default();
    parse_resolv_conf(&resolv)
}

pub(crate) fn parse_resolv_conf(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("nameserver ")
                .and_then(|rest| rest.split_whitespace().next())
                .map(|s| s.to_string())
        })
        .collect()
}

/// IPv4 default gateway for `iface`, empty string when none is routed.
pub fn default_gateway_v4(iface: &str) -> String {
    let routes = fs::read_to_string("/proc/net/route").unwrap_or_default();
    parse_route_table(&routes, iface)
        .map(|gw| gw.to_string())
        .unwrap_or_default()
}

pub(crate) fn parse_route_table(content: &str, iface: &str) -> Option<Ipv4Addr> {
    for line in content.lines().skip(1) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 {
            continue;
        }
        // Iface Destination Gateway ...; destination 00000000 is default.
        if cols[0] != iface || cols[1] != "00000000" {
            continue;
        }
        let raw = u32::from_str_radix(cols[2], 16).ok()?;
        let bytes = raw.to_le_bytes();
        return Some(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]));
    }
    None
}
