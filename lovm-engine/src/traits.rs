//! Core virtualization engine abstraction trait.

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::error::Result;
use crate::types::{EngineKind, MachineRecord};

/// Capability contract every backend implements.
///
/// A backend borrows the [`MachineRecord`] for the duration of one command,
/// reads it, and updates `path`/`source` as the guest is cloned or deleted.
/// The caller persists the record only when the operation succeeded.
///
/// When implementing a backend, remember the user told the *machine* to do
/// something now: don't wait for the guest OS to cooperate.
#[async_trait]
pub trait VirtualizationEngine: Send + Sync {
    /// Which product this backend drives.
    fn kind(&self) -> EngineKind;

    /// The record this backend operates on.
    fn record(&self) -> &MachineRecord;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Clone the VM from `source` (may be empty to reuse the recorded source).
    ///
    /// Already cloned from the same source is a no-op; already cloned from a
    /// different source is an error.
    async fn clone_vm(&mut self, source: &str) -> Result<()>;

    /// Start the VM headless, cloning it first if only a source is known.
    /// A guest that is already running counts as started.
    async fn start(&mut self) -> Result<()>;

    /// Hard power-off. Succeeds when the VM is missing or already off.
    async fn stop(&mut self) -> Result<()>;

    /// Stop, then start. A failed stop skips the start.
    async fn restart(&mut self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    /// Stop and remove the clone, keeping the source so it can be cloned
    /// again. Succeeds when there is nothing to delete.
    async fn delete(&mut self) -> Result<()>;

    // =========================================================================
    // Guest access
    // =========================================================================

    /// First address leased to one of the guest's interfaces.
    async fn ip(&self) -> Result<Ipv4Addr>;

    /// Apply the record's host -> guest folder mappings.
    async fn mount(&mut self) -> Result<()>;

    /// Whether the record points at an existing descriptor file.
    fn found(&self) -> bool;
}
