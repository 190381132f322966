//! Error types for the virtualization engine layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    // =========================================================================
    // Configuration
    // =========================================================================

    /// Neither the caller nor the machine record named a clone source.
    #[error("no clone source; clone a virtual machine first, e.g. lovm clone /path/to/some.vmx")]
    NoCloneSource,

    /// A clone already exists and the caller asked for a different source.
    #[error(
        "asked to clone from {requested:?} but the virtual machine is already cloned \
         from {existing:?}; you must delete the existing clone before cloning a different source"
    )]
    CloneSourceConflict {
        requested: String,
        existing: String,
    },

    /// No backend could be selected for the machine.
    #[error("no configuration found; you need to clone first")]
    NoConfiguration,

    /// The clone source does not look like any supported descriptor.
    #[error("unrecognized virtualization format {0:?}; specify a path to .vmx or .vbox")]
    UnrecognizedFormat(String),

    /// The clone source (or snapshot) is running and cannot be cloned.
    #[error("the specified snapshot is powered on and cannot be cloned; please create another snapshot")]
    SourcePoweredOn,

    // =========================================================================
    // Native tools
    // =========================================================================

    /// A native tool could not be launched at all.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A native tool exited unsuccessfully.
    #[error("{command} failed ({status}): {output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    // =========================================================================
    // Discovery
    // =========================================================================

    /// No active DHCP lease matched any of the guest's MAC addresses.
    ///
    /// Never show this to a user as-is; callers translate it into guidance.
    #[error("not found")]
    AddressNotFound,

    /// The guest descriptor declares no (matching) network interfaces.
    #[error("no network interface")]
    NoInterface,

    /// Failed to read a descriptor, networking config or lease table.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Working directory setup failed.
    #[error("Internal error: {0}")]
    Internal(String),

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// The backend does not support the requested capability.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl EngineError {
    /// True for the discovery conditions that need translating at the edge.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AddressNotFound | Self::NoInterface)
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
