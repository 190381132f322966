//! Engine identification and construction.

use crate::settings::EngineSettings;
use crate::traits::VirtualizationEngine;
use crate::types::{EngineKind, MachineRecord};
use crate::unknown::UnknownBackend;
use crate::virtualbox::VirtualBoxBackend;
use crate::vmware::VmwareBackend;

/// Guess the engine for a clone source from its file extension.
///
/// A `:snapshot` suffix is ignored. Anything unrecognized, including an
/// empty string, is [`EngineKind::Unknown`].
pub fn identify(source: &str) -> EngineKind {
    let path = source.split_once(':').map_or(source, |(path, _)| path);

    if path.ends_with(".vmx") {
        EngineKind::Vmware
    } else if path.ends_with(".vbox") {
        EngineKind::VirtualBox
    } else {
        EngineKind::Unknown
    }
}

/// Build the backend for `source`, operating on `record`.
pub fn engine<'a>(
    source: &str,
    record: &'a mut MachineRecord,
    settings: &'a EngineSettings,
) -> Box<dyn VirtualizationEngine + 'a> {
    match identify(source) {
        EngineKind::Vmware => Box::new(VmwareBackend::new(record, settings)),
        EngineKind::VirtualBox => Box::new(VirtualBoxBackend::new(record, settings)),
        EngineKind::Unknown => Box::new(UnknownBackend::new(record)),
    }
}
