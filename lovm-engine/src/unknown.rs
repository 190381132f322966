//! Placeholder backend for sources no engine recognizes.

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::error::{EngineError, Result};
use crate::traits::VirtualizationEngine;
use crate::types::{EngineKind, MachineRecord};

/// Rejects every operation, so callers never special-case a missing engine.
pub struct UnknownBackend<'a> {
    record: &'a MachineRecord,
}

impl<'a> UnknownBackend<'a> {
    pub fn new(record: &'a MachineRecord) -> Self {
        Self { record }
    }
}

#[async_trait]
impl<'a> VirtualizationEngine for UnknownBackend<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::Unknown
    }

    fn record(&self) -> &MachineRecord {
        self.record
    }

    async fn clone_vm(&mut self, source: &str) -> Result<()> {
        if !source.is_empty() {
            return Err(EngineError::UnrecognizedFormat(source.to_string()));
        }
        Err(EngineError::NoConfiguration)
    }

    async fn start(&mut self) -> Result<()> {
        Err(EngineError::NoConfiguration)
    }

    async fn stop(&mut self) -> Result<()> {
        Err(EngineError::NoConfiguration)
    }

    async fn restart(&mut self) -> Result<()> {
        Err(EngineError::NoConfiguration)
    }

    async fn delete(&mut self) -> Result<()> {
        Err(EngineError::NoConfiguration)
    }

    async fn ip(&self) -> Result<Ipv4Addr> {
        Err(EngineError::NoConfiguration)
    }

    async fn mount(&mut self) -> Result<()> {
        Err(EngineError::NoConfiguration)
    }

    fn found(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_operation_is_rejected() {
        let record = MachineRecord::new();
        let mut backend = UnknownBackend::new(&record);

        assert!(!backend.found());
        assert!(matches!(backend.clone_vm("").await, Err(EngineError::NoConfiguration)));
        assert!(matches!(
            backend.clone_vm("/vms/disk.qcow2").await,
            Err(EngineError::UnrecognizedFormat(_))
        ));
        assert!(matches!(backend.start().await, Err(EngineError::NoConfiguration)));
        assert!(matches!(backend.stop().await, Err(EngineError::NoConfiguration)));
        assert!(matches!(backend.restart().await, Err(EngineError::NoConfiguration)));
        assert!(matches!(backend.delete().await, Err(EngineError::NoConfiguration)));
        assert!(matches!(backend.ip().await, Err(EngineError::NoConfiguration)));
        assert!(matches!(backend.mount().await, Err(EngineError::NoConfiguration)));
    }
}
