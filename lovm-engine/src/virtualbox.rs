//! VirtualBox backend implementation.
//!
//! VirtualBox can only make a linked clone from a snapshot. When the user does
//! not name one, a snapshot called [`SNAPSHOT_NAME`] is created on the source
//! the first time it is cloned and reused afterwards. That snapshot is an
//! implementation detail and is not written to the record's `source`.

use async_trait::async_trait;
use std::net::Ipv4Addr;
use tracing::{debug, info, instrument, warn};

use crate::command;
use crate::error::{EngineError, Result};
use crate::reconcile::{descriptor_exists, plan_clone, ClonePlan};
use crate::settings::EngineSettings;
use crate::traits::VirtualizationEngine;
use crate::types::{EngineKind, MachineRecord};

/// Snapshot lovm takes on a source that has none named.
pub const SNAPSHOT_NAME: &str = "lovm-clone";

/// `VBoxManage startvm` output when the guest already has a session.
const MSG_ALREADY_RUNNING: &str = "is already locked by a session";

/// `VBoxManage controlvm ... poweroff` output when the guest is off.
const MSG_NOT_RUNNING: &str = "is not currently running";

/// Oracle VirtualBox backend driven by `VBoxManage`.
pub struct VirtualBoxBackend<'a> {
    record: &'a mut MachineRecord,
    settings: &'a EngineSettings,
}

impl<'a> VirtualBoxBackend<'a> {
    /// Create a backend operating on `record`.
    pub fn new(record: &'a mut MachineRecord, settings: &'a EngineSettings) -> Self {
        Self { record, settings }
    }

    async fn vboxmanage(&self, args: Vec<String>) -> Result<command::ToolOutput> {
        command::run(&self.settings.vboxmanage_path, &args).await
    }

    /// Whether `source` already carries the lovm snapshot.
    async fn has_snapshot(&self, source: &str) -> Result<bool> {
        let output = self
            .vboxmanage(args(["snapshot", source, "showvminfo", SNAPSHOT_NAME]))
            .await?;
        Ok(output.success())
    }

    /// Take the lovm snapshot on `source` unless it exists.
    #[instrument(skip(self))]
    async fn ensure_snapshot(&self, source: &str) -> Result<()> {
        if self.has_snapshot(source).await? {
            debug!("Snapshot already present");
            return Ok(());
        }

        self.vboxmanage(args(["snapshot", source, "take", SNAPSHOT_NAME]))
            .await?
            .into_result()?;

        // Only happens on the first clone of a given source
        warn!(snapshot = SNAPSHOT_NAME, source = %source, "Created snapshot on clone source");
        Ok(())
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl<'a> VirtualizationEngine for VirtualBoxBackend<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::VirtualBox
    }

    fn record(&self) -> &MachineRecord {
        &*self.record
    }

    #[instrument(skip(self), fields(engine = "virtualbox"))]
    async fn clone_vm(&mut self, source: &str) -> Result<()> {
        let plan = plan_clone(&*self.record, self.found(), source)?;

        let (parent, snapshot) = match &plan {
            ClonePlan::AlreadyCloned => {
                debug!(path = %self.record.path, "Already cloned");
                return Ok(());
            }
            ClonePlan::Clone { source, snapshot } => (source.clone(), snapshot.clone()),
        };

        // VirtualBox derives the clone's folder from its name, so pass the
        // base folder and name rather than a target path:
        //   basefolder  <workdir>/.lovm
        //   name        <project>
        //   result      <workdir>/.lovm/<project>/<project>.vbox
        let base_folder = self.settings.ensure_state_dir()?;
        let name = self.settings.machine_name()?;
        let target = base_folder.join(&name).join(format!("{name}.vbox"));

        let snapshot_arg = match &snapshot {
            Some(snapshot) => snapshot.clone(),
            None => {
                self.ensure_snapshot(&parent).await?;
                SNAPSHOT_NAME.to_string()
            }
        };

        info!(source = %parent, snapshot = %snapshot_arg, target = %target.display(), "Cloning VM");

        let mut clone_args = args(["clonevm", &parent, "--options", "link", "--basefolder"]);
        clone_args.push(base_folder.to_string_lossy().to_string());
        clone_args.extend(args(["--name", &name, "--register", "--snapshot", &snapshot_arg]));

        self.vboxmanage(clone_args).await?.into_result()?;

        self.record.path = target.to_string_lossy().to_string();
        if let Some(source) = plan.recorded_source() {
            self.record.source = source;
        }

        info!(path = %self.record.path, "VM cloned");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "virtualbox"))]
    async fn start(&mut self) -> Result<()> {
        self.clone_vm("").await?;

        info!(path = %self.record.path, "Starting VM");

        let output = self
            .vboxmanage(args(["startvm", &self.record.path, "--type", "headless"]))
            .await?;

        if !output.success() && output.contains(MSG_ALREADY_RUNNING) {
            info!("VM already running");
            return Ok(());
        }
        output.into_result()?;

        info!("VM started");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "virtualbox"))]
    async fn stop(&mut self) -> Result<()> {
        if !self.found() {
            debug!("No VM to stop");
            return Ok(());
        }

        info!(path = %self.record.path, "Powering off VM");

        let output = self
            .vboxmanage(args(["controlvm", &self.record.path, "poweroff"]))
            .await?;

        if !output.success() && output.contains(MSG_NOT_RUNNING) {
            info!("VM already stopped");
            return Ok(());
        }
        output.into_result()?;

        info!("VM powered off");
        Ok(())
    }

    #[instrument(skip(self), fields(engine = "virtualbox"))]
    async fn delete(&mut self) -> Result<()> {
        if !self.found() {
            debug!("No VM to delete");
            return Ok(());
        }

        self.stop().await?;

        info!(path = %self.record.path, "Unregistering and deleting VM");

        self.vboxmanage(args(["unregistervm", &self.record.path, "--delete"]))
            .await?
            .into_result()?;

        self.record.path.clear();

        info!("VM deleted");
        Ok(())
    }

    async fn ip(&self) -> Result<Ipv4Addr> {
        Err(EngineError::NotImplemented("ip"))
    }

    async fn mount(&mut self) -> Result<()> {
        Err(EngineError::NotImplemented("mount"))
    }

    fn found(&self) -> bool {
        descriptor_exists(&self.record.path)
    }
}
