//! Configuration management for the lovm CLI.
//!
//! Everything here has a working default, so a config file is only needed
//! when the native tools live somewhere unusual.

use anyhow::{Context, Result};
use lovm_common::LogFormat;
use lovm_engine::settings::{
    DEFAULT_VBOXMANAGE, DEFAULT_VMRUN, DEFAULT_VMWARE_LEASES, DEFAULT_VMWARE_NETWORKING,
};
use lovm_engine::EngineSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Args;

/// Default ssh binary.
pub const DEFAULT_SSH: &str = "ssh";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level or filter directive
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// `vmrun` binary
    pub vmrun_path: String,
    /// `VBoxManage` binary
    pub vboxmanage_path: String,
    /// VMware networking config listing DHCP-enabled networks
    pub vmware_networking_path: PathBuf,
    /// Lease table template; `{id}` is replaced by the network number
    pub vmware_leases_path: String,
    /// ssh binary used by `lovm ssh`
    pub ssh_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
            vmrun_path: DEFAULT_VMRUN.to_string(),
            vboxmanage_path: DEFAULT_VBOXMANAGE.to_string(),
            vmware_networking_path: PathBuf::from(DEFAULT_VMWARE_NETWORKING),
            vmware_leases_path: DEFAULT_VMWARE_LEASES.to_string(),
            ssh_path: DEFAULT_SSH.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // An empty file is a valid "use defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `explicit` if given (it must exist), otherwise the first default
    /// location that exists, otherwise the defaults. Returns the file used.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let candidates = default_locations(
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        );

        for path in candidates {
            if path.is_file() {
                return Ok((Self::load(&path)?, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref level) = args.log_level {
            self.log_level = level.clone();
        }

        if let Some(format) = args.log_format {
            self.log_format = format;
        }

        self
    }

    /// Engine settings for a project directory.
    pub fn engine_settings(&self, workdir: &Path) -> EngineSettings {
        EngineSettings::new(workdir)
            .with_vmrun(self.vmrun_path.clone())
            .with_vboxmanage(self.vboxmanage_path.clone())
            .with_vmware_networking(self.vmware_networking_path.clone())
            .with_vmware_leases(self.vmware_leases_path.clone())
    }
}

/// `$XDG_CONFIG_HOME/lovm/config.yaml`, then `~/.config/lovm/config.yaml`.
pub fn default_locations(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Some(dir) = xdg_config_home.filter(|dir| dir.is_absolute()) {
        locations.push(dir.join("lovm").join("config.yaml"));
    }
    if let Some(home) = home {
        let path = home.join(".config").join("lovm").join("config.yaml");
        if !locations.contains(&path) {
            locations.push(path);
        }
    }

    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "vmrun_path: /Applications/VMware Fusion.app/Contents/Library/vmrun\nlog_format: json\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.vmrun_path,
            "/Applications/VMware Fusion.app/Contents/Library/vmrun"
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.vboxmanage_path, DEFAULT_VBOXMANAGE);
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "\n").unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_files_are_errors() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("missing.yaml")).is_err());

        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "log_format: [not, a, format]\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        assert!(Config::discover(Some(&dir.path().join("nope.yaml"))).is_err());

        let path = dir.path().join("lovm.yaml");
        std::fs::write(&path, "ssh_path: /usr/local/bin/ssh\n").unwrap();
        let (config, used) = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.ssh_path, "/usr/local/bin/ssh");
        assert_eq!(used, Some(path));
    }

    #[test]
    fn test_default_locations() {
        let locations = default_locations(
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/dev")),
        );
        assert_eq!(
            locations,
            vec![
                PathBuf::from("/xdg/lovm/config.yaml"),
                PathBuf::from("/home/dev/.config/lovm/config.yaml"),
            ]
        );

        // Relative XDG values are ignored
        let locations = default_locations(Some(PathBuf::from("xdg")), None);
        assert!(locations.is_empty());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::try_parse_from(["lovm", "--log-level", "debug", "status"]).unwrap();
        let config = Config::default().with_cli_overrides(&args);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_engine_settings() {
        let config = Config {
            vmrun_path: "/opt/vmrun".to_string(),
            vmware_leases_path: "/tmp/vmnet{id}.leases".to_string(),
            ..Config::default()
        };

        let settings = config.engine_settings(Path::new("/work/demo"));
        assert_eq!(settings.workdir, PathBuf::from("/work/demo"));
        assert_eq!(settings.vmrun_path, "/opt/vmrun");
        assert_eq!(settings.vboxmanage_path, DEFAULT_VBOXMANAGE);
        assert_eq!(settings.lease_path(8), PathBuf::from("/tmp/vmnet8.leases"));
    }
}
