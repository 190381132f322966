//! Type definitions for machine records, engine kinds and discovery data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

// =============================================================================
// MACHINE RECORD
// =============================================================================

/// A cloned VM and the information needed to find it, or to re-clone it from
/// scratch after the clone has been deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineRecord {
    /// Path to the cloned guest's descriptor (`.vmx`, `.vbox`). Empty until
    /// the machine has been cloned.
    pub path: String,

    /// Host path -> guest path folder mappings
    pub mounts: BTreeMap<String, String>,

    /// Parent template the guest was cloned from. A colon separates an
    /// optional snapshot name: `/vms/base.vmx:clean-install`.
    pub source: String,

    /// Cached engine kind tag (see [`EngineKind::as_str`])
    pub engine: String,

    /// Remote shell hints
    #[serde(skip_serializing_if = "SshConfig::is_empty")]
    pub ssh: SshConfig,
}

impl MachineRecord {
    /// Create an empty record for a machine that has never been cloned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record that knows where to clone from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the descriptor path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add (or replace) a host -> guest folder mapping.
    pub fn add_mount(&mut self, host: impl Into<String>, guest: impl Into<String>) {
        self.mounts.insert(host.into(), guest.into());
    }
}

/// Optional hints for `lovm ssh`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Login name passed as `-l`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Private key passed as `-i`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,

    /// Guest interface to resolve the address from (e.g. `ethernet1`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

impl SshConfig {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.identity_file.is_none() && self.interface.is_none()
    }
}

// =============================================================================
// ENGINE KIND
// =============================================================================

/// The closed set of supported virtualization products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// VMware Workstation / Fusion, driven by `vmrun`
    Vmware,
    /// Oracle VirtualBox, driven by `VBoxManage`
    #[serde(rename = "virtualbox")]
    VirtualBox,
    /// Source not recognized; every operation is rejected
    Unknown,
}

impl EngineKind {
    /// Stable tag stored in [`MachineRecord::engine`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vmware => "vmware",
            Self::VirtualBox => "virtualbox",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = std::convert::Infallible;

    /// Unrecognized tags map to [`EngineKind::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "vmware" => Self::Vmware,
            "virtualbox" => Self::VirtualBox,
            _ => Self::Unknown,
        })
    }
}

// =============================================================================
// NETWORK DISCOVERY
// =============================================================================

/// A 48-bit hardware address.
///
/// Parsing accepts `:` or `-` separators in either case; display is always
/// lowercase and colon separated, so two addresses compare equal regardless
/// of how the host tools formatted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

/// Returned when a string is not a 6-octet MAC address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMacError(pub String);

impl fmt::Display for ParseMacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid MAC address: {:?}", self.0)
    }
}

impl std::error::Error for ParseMacError {}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMacError(s.to_string());
        let separator = if s.contains('-') { '-' } else { ':' };

        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.split(separator) {
            if count == 6 || part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(err());
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| err())?;
            count += 1;
        }
        if count != 6 {
            return Err(err());
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// A virtual NIC declared in a guest descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Interface name as written in the descriptor (e.g. `ethernet0`)
    pub name: String,
    /// Address assigned to the interface
    pub mac: MacAddress,
}

/// One entry of a host DHCP lease table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub ip: Ipv4Addr,
    pub starts: DateTime<Utc>,
    pub ends: DateTime<Utc>,
    pub mac: MacAddress,
}

impl Lease {
    /// Whether `now` falls strictly inside the lease window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts < now && now < self.ends
    }
}
