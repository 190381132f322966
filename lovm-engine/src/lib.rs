//! # lovm Engine
//!
//! Virtualization engine abstraction for managing one local virtual machine.
//!
//! This crate provides a unified interface over desktop virtualization
//! products:
//! - **VMware** Workstation / Fusion via `vmrun`, with DHCP lease IP discovery
//! - **VirtualBox** via `VBoxManage`
//! - **Unknown** placeholder that rejects every operation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        VirtualizationEngine Trait       │
//! │  (clone_vm, start, stop, delete, ip..)  │
//! └─────────────────────┬───────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         ▼             ▼             ▼
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ VmwareBackend│ │ VirtualBox   │ │ Unknown      │
//! │   (vmrun)    │ │ (VBoxManage) │ │ (rejects)    │
//! └──────────────┘ └──────────────┘ └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lovm_engine::{engine, EngineSettings, MachineRecord};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = EngineSettings::new(std::env::current_dir().unwrap());
//!     let mut record = MachineRecord::new();
//!
//!     let source = "/vms/base.vmx:clean";
//!     let mut vm = engine(source, &mut record, &settings);
//!     vm.clone_vm(source).await.unwrap();
//!     vm.start().await.unwrap();
//!     println!("{}", vm.ip().await.unwrap());
//! }
//! ```

pub mod error;
pub mod factory;
pub mod reconcile;
pub mod settings;
pub mod traits;
pub mod types;
pub mod unknown;
pub mod virtualbox;
pub mod vmware;
mod command;

pub use error::{EngineError, Result};
pub use factory::{engine, identify};
pub use settings::EngineSettings;
pub use traits::VirtualizationEngine;
pub use types::*;
pub use unknown::UnknownBackend;
pub use virtualbox::VirtualBoxBackend;
pub use vmware::VmwareBackend;
