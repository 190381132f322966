//! VMware backend implementation.

use async_trait::async_trait;
use chrono::Utc;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::command;
use crate::error::{EngineError, Result};
use crate::reconcile::{descriptor_exists, plan_clone, ClonePlan};
use crate::settings::EngineSettings;
use crate::traits::VirtualizationEngine;
use crate::types::{EngineKind, MachineRecord};

use super::discovery;

/// `vmrun clone` output when the source VM is running.
const MSG_SOURCE_RUNNING: &str =
    "The virtual machine should not be powered on. It is already running.";

/// `vmrun start` output when the guest is already up.
const MSG_ALREADY_RUNNING: &str = "is already running";

/// `vmrun stop` output when the guest is already off.
const MSG_NOT_POWERED_ON: &str = "The virtual machine is not powered on";

/// VMware Workstation / Fusion backend driven by `vmrun`.
pub struct VmwareBackend<'a> {
    record: &'a mut MachineRecord,
    settings: &'a EngineSettings,
}

impl<'a> VmwareBackend<'a> {
    /// Create a backend operating on `record`.
    pub fn new(record: &'a mut MachineRecord, settings: &'a EngineSettings) -> Self {
        Self { record, settings }
    }

    async fn vmrun(&self, args: Vec<String>) -> Result<command::ToolOutput> {
        command::run(&self.settings.vmrun_path, &args).await
    }

    /// `<workdir>/.lovm/<name>/<name>.vmx`
    fn clone_target(&self) -> Result<String> {
        let name = self.settings.machine_name()?;
        let target = self
            .settings
            .state_dir()
            .join(&name)
            .join(format!("{name}.vmx"));
        Ok(target.to_string_lossy().to_string())
    }
}

#[async_trait]
impl<'a> VirtualizationEngine for VmwareBackend<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::Vmware
    }

    fn record(&self) -> &MachineRecord {
        &*self.record
    }

    #[instrument(skip(self), fields(engine = "vmware"))]
    async fn clone_vm(&mut self, source: &str) -> Result<()> {
        let plan = plan_clone(&*self.record, self.found(), source)?;

        let (parent, snapshot) = match &plan {
            ClonePlan::AlreadyCloned => {
                debug!(path = %self.record.path, "Already cloned");
                return Ok(());
            }
            ClonePlan::Clone { source, snapshot } => (source.clone(), snapshot.clone()),
        };

        self.settings.ensure_state_dir()?;
        let target = self.clone_target()?;

        info!(source = %parent, snapshot = ?snapshot, target = %target, "Cloning VM");

        let mut args = vec![
            "clone".to_string(),
            parent,
            target.clone(),
            "linked".to_string(),
        ];
        if let Some(snapshot) = &snapshot {
            args.push(format!("-snapshot={snapshot}"));
        }

        let output = self.vmrun(args).await?;
        if !output.success() && output.contains(MSG_SOURCE_RUNNING) {
            return Err(EngineError::SourcePoweredOn);
        }
        output.into_result()?;

        self.record.path = target;
        if let Some(source) = plan.recorded_source() {
            self.record.source = source;
        }

        info!(path = %self.record.path, "VM cloned");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "vmware"))]
    async fn start(&mut self) -> Result<()> {
        self.clone_vm("").await?;

        info!(path = %self.record.path, "Starting VM");

        let output = self
            .vmrun(vec!["start".to_string(), self.record.path.clone(), "nogui".to_string()])
            .await?;

        if !output.success() && output.contains(MSG_ALREADY_RUNNING) {
            info!("VM already running");
            return Ok(());
        }
        output.into_result()?;

        info!("VM started");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "vmware"))]
    async fn stop(&mut self) -> Result<()> {
        if !self.found() {
            debug!("No VM to stop");
            return Ok(());
        }

        info!(path = %self.record.path, "Force stopping VM");

        let output = self
            .vmrun(vec!["stop".to_string(), self.record.path.clone(), "hard".to_string()])
            .await?;

        if !output.success() && output.contains(MSG_NOT_POWERED_ON) {
            info!("VM already stopped");
            return Ok(());
        }
        output.into_result()?;

        info!("VM force stopped");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "vmware"))]
    async fn delete(&mut self) -> Result<()> {
        if !self.found() {
            debug!("No VM to delete");
            return Ok(());
        }

        self.stop().await?;

        info!(path = %self.record.path, "Deleting VM");

        // TODO: "Insufficient permissions" here usually means another VM was
        // linked-cloned from this one; report that instead of the raw output.
        self.vmrun(vec!["deleteVM".to_string(), self.record.path.clone()])
            .await?
            .into_result()?;

        self.record.path.clear();

        info!("VM deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "vmware"))]
    async fn ip(&self) -> Result<Ipv4Addr> {
        if !self.found() {
            return Err(EngineError::NoConfiguration);
        }

        let mut interfaces = discovery::read_mac_addresses(Path::new(&self.record.path))?;
        if let Some(wanted) = &self.record.ssh.interface {
            interfaces.retain(|iface| &iface.name == wanted);
        }

        discovery::detect_ip(self.settings, &interfaces, Utc::now())
    }

    async fn mount(&mut self) -> Result<()> {
        // Shared folders also depend on VMware Tools running in the guest
        Err(EngineError::NotImplemented("mount"))
    }

    fn found(&self) -> bool {
        descriptor_exists(&self.record.path)
    }
}
