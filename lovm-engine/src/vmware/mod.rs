//! VMware Workstation / Fusion backend.
//!
//! Lifecycle operations shell out to `vmrun`; IP lookup reads the host's
//! virtual networking config and DHCP lease tables directly.

mod backend;
pub mod discovery;

pub use backend::VmwareBackend;
