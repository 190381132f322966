//! Shared helpers for engine integration tests.
//!
//! Native tools are replaced by small shell scripts that append their
//! arguments to a call log and answer the way the real tool would.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use lovm_engine::EngineSettings;
use tempfile::TempDir;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A throwaway project directory plus fake native tools.
pub struct Sandbox {
    pub dir: TempDir,
    pub workdir: PathBuf,
    pub log: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("demo");
        fs::create_dir_all(&workdir).unwrap();
        let log = dir.path().join("calls.log");

        Self { dir, workdir, log }
    }

    /// Write an executable script named `name` whose body runs after the
    /// arguments have been logged.
    pub fn tool(&self, name: &str, body: &str) -> String {
        let path = self.dir.path().join(name);
        let script = format!(
            "#!/bin/sh\necho \"$*\" >> '{}'\n{}\n",
            self.log.display(),
            body
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    /// Logged invocations, one per line.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn settings(&self) -> EngineSettings {
        EngineSettings::new(&self.workdir)
    }

    /// Where a clone of this project lands.
    pub fn target(&self, extension: &str) -> String {
        self.workdir
            .join(".lovm")
            .join("demo")
            .join(format!("demo.{extension}"))
            .to_string_lossy()
            .to_string()
    }

    /// Create a descriptor so the record counts as cloned.
    pub fn existing_clone(&self, extension: &str) -> String {
        let target = self.target(extension);
        fs::create_dir_all(Path::new(&target).parent().unwrap()).unwrap();
        fs::copy(fixture("centos.vmx"), &target).unwrap();
        target
    }
}
