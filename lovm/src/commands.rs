//! Command dispatch.
//!
//! Every lifecycle command loads `machine.lovm`, selects a backend for the
//! recorded source, runs one operation and saves the record. A failed
//! command leaves the file untouched.

use anyhow::{anyhow, bail, Result};
use lovm_engine::{engine, identify, EngineError, EngineKind, MachineRecord};
use std::path::Path;
use tracing::{debug, info};

use crate::cli::Command;
use crate::config::Config;
use crate::{machine_file, ssh, status};

/// Run `command` for the project in `workdir`.
pub async fn execute(command: Command, workdir: &Path, config: &Config) -> Result<()> {
    if command == Command::Status {
        for check in status::run(config).await {
            println!("{}", check);
        }
        return Ok(());
    }

    let mut record = machine_file::load_or_default(workdir)?;
    run(command, &mut record, workdir, config).await?;

    machine_file::save(workdir, &record)
}

async fn run(
    command: Command,
    record: &mut MachineRecord,
    workdir: &Path,
    config: &Config,
) -> Result<()> {
    let settings = config.engine_settings(workdir);

    // The backend follows the clone source the user just typed, which may
    // be a different product than the clone that was deleted.
    let (selector, requested) = match &command {
        Command::Clone { source: Some(source) } => {
            record.engine = identify(source).to_string();
            (source.clone(), source.clone())
        }
        Command::Clone { source: None } if record.source.is_empty() => {
            bail!("clone source must be specified, e.g. lovm clone /path/to/some.vmx");
        }
        _ => (record.source.clone(), String::new()),
    };

    if let Command::Mount { host, guest } = &command {
        record.add_mount(host.clone(), guest.clone());
    }

    let mut vm = engine(&selector, record, &settings);
    let kind = vm.kind();
    debug!(engine = %kind, command = ?command, "Dispatching");

    match command {
        Command::Clone { .. } => vm.clone_vm(&requested).await.map_err(|e| explain(e, kind))?,
        Command::Start => {
            vm.start().await.map_err(|e| explain(e, kind))?;
            println!("machine {:?} running ({})", vm.record().path, kind);
        }
        Command::Stop => vm.stop().await.map_err(|e| explain(e, kind))?,
        Command::Restart => vm.restart().await.map_err(|e| explain(e, kind))?,
        Command::Delete => vm.delete().await.map_err(|e| explain(e, kind))?,
        Command::Mount { .. } => vm.mount().await.map_err(|e| explain(e, kind))?,
        Command::Ip => {
            let ip = vm.ip().await.map_err(|e| explain(e, kind))?;
            println!("{}", ip);
        }
        Command::Ssh { args } => {
            let ip = vm.ip().await.map_err(|e| explain(e, kind))?;
            let ssh_args = ssh::build_args(&args, ip, &vm.record().ssh);
            ssh::passthrough(&config.ssh_path, &ssh_args).await?;
        }
        Command::Status => bail!("status does not operate on a machine"),
    }

    info!(engine = %kind, "Command completed");
    Ok(())
}

/// Turn engine errors the user can act on into plain instructions.
fn explain(err: EngineError, kind: EngineKind) -> anyhow::Error {
    match err {
        EngineError::NotImplemented(capability) => {
            anyhow!("the {} backend does not support {}", kind, capability)
        }
        EngineError::AddressNotFound => anyhow!(
            "no IP address found for the virtual machine; make sure it is running \
             and attached to a NAT or host-only network with DHCP"
        ),
        EngineError::NoInterface => anyhow!(
            "the virtual machine has no usable network interface; check the \
             interface hint in machine.lovm and the VM's network settings"
        ),
        other => other.into(),
    }
}
