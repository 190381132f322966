//! Guest IP discovery for VMware through host DHCP lease tables.
//!
//! VMware Workstation and Fusion run their own DHCP server for NAT and
//! host-only virtual networks (`vmnet1`, `vmnet8`, ...). Bridged networks get
//! their addresses from the physical LAN and are invisible here. Lookup works
//! without guest cooperation:
//!
//! 1. read `ethernetN.generatedAddress` entries from the `.vmx` file,
//! 2. read `answer VNET_<id>_DHCP yes` entries from the networking config,
//! 3. scan each network's `dhcpd.leases` for a lease held by one of the
//!    guest's MAC addresses that is valid right now.
//!
//! A lease table looks like this (tab indented):
//!
//! ```text
//! lease 172.16.23.128 {
//!     starts 2 2019/04/02 01:05:48;
//!     ends 2 2019/04/02 01:35:48;
//!     hardware ethernet 00:0c:29:56:7f:63;
//!     uid ff:bc:9a:4a:2d:00:02:00:00:ab:11:15:39:5e:d3:35:a2:c9:00;
//!     client-hostname "ubuntu";
//! }
//! ```
//!
//! VMware has been seen holding two valid leases with different addresses
//! for one MAC. The first match wins; resolving that properly is not
//! attempted.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::settings::EngineSettings;
use crate::types::{Lease, MacAddress, NetworkInterface};

/// Timestamp layout used in `dhcpd.leases` (always UTC).
pub const DHCP_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

static RE_GENERATED_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(ethernet\d+)\.generatedAddress ?= ?"([0-9a-fA-F:]+)""#).unwrap()
});

static RE_DHCP_NETWORK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"answer VNET_(\d+)_DHCP yes").unwrap()
});

static RE_LEASE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)lease\s+([0-9.]+)\s*\{(.*?)\}").unwrap()
});

static RE_LEASE_STARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"starts\s+\d+\s+([0-9/: ]+);").unwrap()
});

static RE_LEASE_ENDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ends\s+\d+\s+([0-9/: ]+);").unwrap()
});

static RE_LEASE_HARDWARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"hardware\s+ethernet\s+([0-9a-fA-F:]+);").unwrap()
});

// =============================================================================
// Descriptor
// =============================================================================

/// Interfaces and MAC addresses declared in a `.vmx` file, in file order.
pub fn read_mac_addresses(path: &Path) -> Result<Vec<NetworkInterface>> {
    let content = read(path)?;
    Ok(parse_mac_addresses(&content))
}

/// Parse `ethernetN.generatedAddress = "..."` entries. Malformed addresses
/// are logged and skipped; a repeated interface keeps its first address.
pub fn parse_mac_addresses(vmx: &str) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = Vec::new();

    for caps in RE_GENERATED_ADDRESS.captures_iter(vmx) {
        let name = &caps[1];
        let mac = match caps[2].parse::<MacAddress>() {
            Ok(mac) => mac,
            Err(e) => {
                warn!(interface = %name, error = %e, "Skipping malformed MAC address");
                continue;
            }
        };

        if interfaces.iter().any(|iface| iface.name == name) {
            continue;
        }

        interfaces.push(NetworkInterface {
            name: name.to_string(),
            mac,
        });
    }

    interfaces
}

// =============================================================================
// Networking config
// =============================================================================

/// Virtual networks with DHCP enabled, ascending.
pub fn list_dhcp_networks(path: &Path) -> Result<Vec<u32>> {
    let content = read(path)?;
    Ok(parse_dhcp_networks(&content))
}

/// Parse `answer VNET_<id>_DHCP yes` lines. Bridged networks never carry
/// this answer, so they are excluded naturally.
pub fn parse_dhcp_networks(config: &str) -> Vec<u32> {
    let mut networks: Vec<u32> = RE_DHCP_NETWORK
        .captures_iter(config)
        .filter_map(|caps| match caps[1].parse::<u32>() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(network = &caps[1], error = %e, "Unexpected network number");
                None
            }
        })
        .collect();

    networks.sort_unstable();
    networks.dedup();
    networks
}

// =============================================================================
// Lease tables
// =============================================================================

/// Leases from one table. A missing table (network configured but its DHCP
/// server never ran) yields no leases.
pub fn read_leases(path: &Path) -> Result<Vec<Lease>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_leases(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Lease table not present");
            Ok(Vec::new())
        }
        Err(e) => Err(EngineError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Parse every complete `lease <ip> { ... }` block. Blocks missing a start,
/// end or hardware address, or holding unparsable values, are skipped.
pub fn parse_leases(table: &str) -> Vec<Lease> {
    RE_LEASE_BLOCK
        .captures_iter(table)
        .filter_map(|block| {
            let body = &block[2];

            let ip = block[1].parse::<Ipv4Addr>().ok()?;
            let starts = parse_lease_time(&RE_LEASE_STARTS.captures(body)?[1])?;
            let ends = parse_lease_time(&RE_LEASE_ENDS.captures(body)?[1])?;
            let mac = RE_LEASE_HARDWARE.captures(body)?[1].parse::<MacAddress>().ok()?;

            Some(Lease { ip, starts, ends, mac })
        })
        .collect()
}

fn parse_lease_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), DHCP_DATE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// First lease held by `mac` that is valid at `now`.
pub fn find_current_lease<'a>(
    leases: &'a [Lease],
    mac: &MacAddress,
    now: DateTime<Utc>,
) -> Option<&'a Lease> {
    leases
        .iter()
        .find(|lease| lease.mac == *mac && lease.is_active_at(now))
}

// =============================================================================
// Resolution
// =============================================================================

/// Find an address for any of `interfaces`, trying interfaces in order and
/// networks in ascending order.
pub fn detect_ip(
    settings: &EngineSettings,
    interfaces: &[NetworkInterface],
    now: DateTime<Utc>,
) -> Result<Ipv4Addr> {
    if interfaces.is_empty() {
        return Err(EngineError::NoInterface);
    }

    let networks = list_dhcp_networks(&settings.vmware_networking_path)?;
    debug!(networks = ?networks, "DHCP-enabled virtual networks");

    let mut tables = Vec::with_capacity(networks.len());
    for network in networks {
        tables.push((network, read_leases(&settings.lease_path(network))?));
    }

    for iface in interfaces {
        for (network, leases) in &tables {
            if let Some(lease) = find_current_lease(leases, &iface.mac, now) {
                debug!(
                    interface = %iface.name,
                    mac = %iface.mac,
                    network = network,
                    ip = %lease.ip,
                    "Found active lease"
                );
                return Ok(lease.ip);
            }
        }
        debug!(interface = %iface.name, mac = %iface.mac, "No active lease");
    }

    Err(EngineError::AddressNotFound)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
