//! Clone reconciliation shared by the cloning backends.
//!
//! Given what the user asked for and what the record already holds:
//!
//! | cloned? | recorded source | requested | action                     |
//! |---------|-----------------|-----------|----------------------------|
//! | no      | none            | none      | error: no clone source     |
//! | no      | any             | some      | clone requested            |
//! | no      | some            | none      | clone recorded             |
//! | yes     | some            | none      | nothing to do              |
//! | yes     | some            | same      | nothing to do              |
//! | yes     | some            | different | error: delete first        |

use std::path::Path;

use crate::error::{EngineError, Result};
use crate::types::MachineRecord;

/// What a clone request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClonePlan {
    /// The clone exists and matches; do nothing.
    AlreadyCloned,
    /// Clone `source`, optionally from the named `snapshot`.
    Clone {
        source: String,
        snapshot: Option<String>,
    },
}

impl ClonePlan {
    /// Value to store in [`MachineRecord::source`] after a successful clone.
    pub fn recorded_source(&self) -> Option<String> {
        match self {
            Self::AlreadyCloned => None,
            Self::Clone { source, snapshot: Some(snapshot) } => Some(format!("{source}:{snapshot}")),
            Self::Clone { source, snapshot: None } => Some(source.clone()),
        }
    }
}

/// Resolve a clone request against the record. `found` is whether the
/// recorded descriptor currently exists.
pub fn plan_clone(record: &MachineRecord, found: bool, requested: &str) -> Result<ClonePlan> {
    if requested.is_empty() && record.source.is_empty() {
        return Err(EngineError::NoCloneSource);
    }

    if found {
        if !requested.is_empty() && normalize(requested) != normalize(&record.source) {
            return Err(EngineError::CloneSourceConflict {
                requested: requested.to_string(),
                existing: record.source.clone(),
            });
        }
        return Ok(ClonePlan::AlreadyCloned);
    }

    let source = if requested.is_empty() { record.source.as_str() } else { requested };
    let (source, snapshot) = split_snapshot(source);

    Ok(ClonePlan::Clone {
        source: source.to_string(),
        snapshot: snapshot.map(str::to_string),
    })
}

/// Split `path:snapshot` at the first colon. An empty snapshot name counts
/// as none.
pub fn split_snapshot(source: &str) -> (&str, Option<&str>) {
    match source.split_once(':') {
        Some((path, snapshot)) if !snapshot.is_empty() => (path, Some(snapshot)),
        Some((path, _)) => (path, None),
        None => (source, None),
    }
}

/// The form stored in the record: `path` or `path:snapshot`, never a
/// trailing empty snapshot.
fn normalize(source: &str) -> String {
    match split_snapshot(source) {
        (path, Some(snapshot)) => format!("{path}:{snapshot}"),
        (path, None) => path.to_string(),
    }
}

/// `path` is non-empty and names an existing regular file.
pub(crate) fn descriptor_exists(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    std::fs::metadata(Path::new(path))
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str) -> MachineRecord {
        MachineRecord::new()
            .with_source(source)
            .with_path("/work/.lovm/work/work.vmx")
    }

    #[test]
    fn test_nothing_to_clone_from() {
        let err = plan_clone(&MachineRecord::new(), false, "").unwrap_err();
        assert!(matches!(err, EngineError::NoCloneSource));
    }

    #[test]
    fn test_not_cloned_uses_requested_source() {
        let plan = plan_clone(&MachineRecord::new(), false, "/vms/base.vmx").unwrap();
        assert_eq!(plan, ClonePlan::Clone { source: "/vms/base.vmx".into(), snapshot: None });

        // A recorded source loses to an explicit request
        let plan = plan_clone(&record("/vms/old.vmx"), false, "/vms/new.vmx:snap").unwrap();
        assert_eq!(
            plan,
            ClonePlan::Clone { source: "/vms/new.vmx".into(), snapshot: Some("snap".into()) }
        );
        assert_eq!(plan.recorded_source().as_deref(), Some("/vms/new.vmx:snap"));
    }

    #[test]
    fn test_not_cloned_falls_back_to_recorded_source() {
        let plan = plan_clone(&record("/vms/base.vmx:clean"), false, "").unwrap();
        assert_eq!(
            plan,
            ClonePlan::Clone { source: "/vms/base.vmx".into(), snapshot: Some("clean".into()) }
        );
    }

    #[test]
    fn test_cloned_without_request_is_noop() {
        let plan = plan_clone(&record("/vms/base.vmx"), true, "").unwrap();
        assert_eq!(plan, ClonePlan::AlreadyCloned);
        assert_eq!(plan.recorded_source(), None);
    }

    #[test]
    fn test_cloned_with_same_request_is_noop() {
        let plan = plan_clone(&record("/vms/base.vmx:clean"), true, "/vms/base.vmx:clean").unwrap();
        assert_eq!(plan, ClonePlan::AlreadyCloned);
    }

    #[test]
    fn test_cloned_with_empty_snapshot_suffix_is_noop() {
        let plan = plan_clone(&record("/vms/base.vmx"), true, "/vms/base.vmx:").unwrap();
        assert_eq!(plan, ClonePlan::AlreadyCloned);

        // The recorded form drops the empty suffix, so a re-run matches
        let plan = plan_clone(&MachineRecord::new(), false, "/vms/base.vmx:").unwrap();
        assert_eq!(plan.recorded_source().as_deref(), Some("/vms/base.vmx"));
    }

    #[test]
    fn test_cloned_with_different_request_conflicts() {
        let err = plan_clone(&record("/vms/base.vmx"), true, "/vms/other.vmx").unwrap_err();
        match err {
            EngineError::CloneSourceConflict { requested, existing } => {
                assert_eq!(requested, "/vms/other.vmx");
                assert_eq!(existing, "/vms/base.vmx");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_split_snapshot() {
        assert_eq!(split_snapshot("/a/b.vmx"), ("/a/b.vmx", None));
        assert_eq!(split_snapshot("/a/b.vmx:snap"), ("/a/b.vmx", Some("snap")));
        assert_eq!(split_snapshot("/a/b.vmx:"), ("/a/b.vmx", None));
    }

    #[test]
    fn test_descriptor_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("guest.vmx");
        std::fs::write(&file, "").unwrap();

        assert!(!descriptor_exists(""));
        assert!(!descriptor_exists(dir.path().join("missing.vmx").to_str().unwrap()));
        assert!(!descriptor_exists(dir.path().to_str().unwrap()));
        assert!(descriptor_exists(file.to_str().unwrap()));
    }
}
