//! The `machine.lovm` sidecar file.
//!
//! Pretty-printed JSON so the file can be edited by hand and checked into
//! version control alongside the project it belongs to.

use anyhow::{Context, Result};
use lovm_engine::MachineRecord;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sidecar file name inside the project directory.
pub const MACHINE_FILE: &str = "machine.lovm";

pub fn path_in(dir: &Path) -> PathBuf {
    dir.join(MACHINE_FILE)
}

/// Read the record in `dir`. A missing file is an empty record; anything
/// else that goes wrong is reported.
pub fn load_or_default(dir: &Path) -> Result<MachineRecord> {
    let path = path_in(dir);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No machine file, starting empty");
            return Ok(MachineRecord::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Write the record to `dir`, replacing any previous file.
pub fn save(dir: &Path, record: &MachineRecord) -> Result<()> {
    let path = path_in(dir);

    let mut json = serde_json::to_string_pretty(record)
        .context("failed to serialize machine record")?;
    json.push('\n');

    std::fs::write(&path, json)
        .with_context(|| format!("error writing changes to {}", path.display()))?;

    debug!(path = %path.display(), "Machine file saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_record() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_or_default(dir.path()).unwrap(), MachineRecord::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut record = MachineRecord::new()
            .with_source("/vms/base.vmx:clean")
            .with_path("/work/demo/.lovm/demo/demo.vmx");
        record.engine = "vmware".to_string();
        record.add_mount("/work/demo", "/home/dev/demo");
        record.ssh.user = Some("dev".to_string());

        save(dir.path(), &record).unwrap();
        assert_eq!(load_or_default(dir.path()).unwrap(), record);
    }

    #[test]
    fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let mut record = MachineRecord::new().with_source("/vms/base.vmx");
        record.engine = "vmware".to_string();
        record.add_mount("/b", "/guest/b");
        record.add_mount("/a", "/guest/a");

        save(dir.path(), &record).unwrap();

        let expected = r#"{
  "path": "",
  "mounts": {
    "/a": "/guest/a",
    "/b": "/guest/b"
  },
  "source": "/vms/base.vmx",
  "engine": "vmware"
}
"#;
        assert_eq!(std::fs::read_to_string(path_in(dir.path())).unwrap(), expected);
    }

    #[test]
    fn test_hand_written_file_with_missing_fields() {
        let dir = TempDir::new().unwrap();
        std::fs::write(path_in(dir.path()), r#"{"source": "/vms/base.vbox"}"#).unwrap();

        let record = load_or_default(dir.path()).unwrap();
        assert_eq!(record.source, "/vms/base.vbox");
        assert!(record.path.is_empty());
        assert!(record.mounts.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(path_in(dir.path()), "{ not json").unwrap();

        let err = load_or_default(dir.path()).unwrap_err();
        assert!(err.to_string().contains(MACHINE_FILE));
    }
}
