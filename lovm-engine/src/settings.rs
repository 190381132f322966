//! Host-side settings shared by every backend.

use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

/// Name of the private subdirectory clones are written into.
pub const STATE_DIR: &str = ".lovm";

/// Default `vmrun` binary.
pub const DEFAULT_VMRUN: &str = "vmrun";

/// Default `VBoxManage` binary.
pub const DEFAULT_VBOXMANAGE: &str = "VBoxManage";

/// VMware virtual networking configuration.
#[cfg(target_os = "macos")]
pub const DEFAULT_VMWARE_NETWORKING: &str = "/Library/Preferences/VMware Fusion/networking";

#[cfg(not(target_os = "macos"))]
pub const DEFAULT_VMWARE_NETWORKING: &str = "/etc/vmware/networking";

/// VMware DHCP lease table per virtual network; `{id}` is the network number.
#[cfg(target_os = "macos")]
pub const DEFAULT_VMWARE_LEASES: &str = "/var/db/vmware/vmnet-dhcpd-vmnet{id}.leases";

#[cfg(not(target_os = "macos"))]
pub const DEFAULT_VMWARE_LEASES: &str = "/etc/vmware/vmnet{id}/dhcpd/dhcpd.leases";

/// Where native tools live and where host state is read from.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Project directory holding `machine.lovm`; clones go under `.lovm/`
    pub workdir: PathBuf,
    /// `vmrun` binary path
    pub vmrun_path: String,
    /// `VBoxManage` binary path
    pub vboxmanage_path: String,
    /// VMware networking config listing DHCP-enabled networks
    pub vmware_networking_path: PathBuf,
    /// Lease table path template containing `{id}`
    pub vmware_leases_path: String,
}

impl EngineSettings {
    /// Settings with the platform defaults for the given project directory.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            vmrun_path: DEFAULT_VMRUN.to_string(),
            vboxmanage_path: DEFAULT_VBOXMANAGE.to_string(),
            vmware_networking_path: PathBuf::from(DEFAULT_VMWARE_NETWORKING),
            vmware_leases_path: DEFAULT_VMWARE_LEASES.to_string(),
        }
    }

    /// Set the `vmrun` binary path.
    pub fn with_vmrun(mut self, path: impl Into<String>) -> Self {
        self.vmrun_path = path.into();
        self
    }

    /// Set the `VBoxManage` binary path.
    pub fn with_vboxmanage(mut self, path: impl Into<String>) -> Self {
        self.vboxmanage_path = path.into();
        self
    }

    /// Set the VMware networking config path.
    pub fn with_vmware_networking(mut self, path: impl Into<PathBuf>) -> Self {
        self.vmware_networking_path = path.into();
        self
    }

    /// Set the lease table template (must contain `{id}`).
    pub fn with_vmware_leases(mut self, template: impl Into<String>) -> Self {
        self.vmware_leases_path = template.into();
        self
    }

    /// Lease table for one virtual network.
    pub fn lease_path(&self, network: u32) -> PathBuf {
        PathBuf::from(self.vmware_leases_path.replace("{id}", &network.to_string()))
    }

    /// `<workdir>/.lovm`
    pub fn state_dir(&self) -> PathBuf {
        self.workdir.join(STATE_DIR)
    }

    /// Clone name, taken from the project directory's name.
    pub fn machine_name(&self) -> Result<String> {
        self.workdir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| EngineError::Internal(format!(
                "cannot derive a machine name from {}",
                self.workdir.display()
            )))
    }

    /// Create `<workdir>/.lovm` if needed.
    pub(crate) fn ensure_state_dir(&self) -> Result<PathBuf> {
        let dir = self.state_dir();
        ensure_dir(&dir)?;
        Ok(dir)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| EngineError::Internal(
            format!("Failed to create directory {}: {}", path.display(), e)
        ))?;
    }
    Ok(())
}
