//! `lovm status`: report which virtualization tools are available.
//!
//! Only inspects the host. Nothing is changed, and failing to find a tool is
//! a result, not an error.

use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;

/// One line of the checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub ok: bool,
    pub message: String,
}

impl Check {
    fn new(ok: bool, message: impl Into<String>) -> Self {
        Self { ok, message: message.into() }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.ok { "✓" } else { "-" };
        write!(f, " {} {}", prefix, self.message)
    }
}

/// Whether `program` can be launched. Its exit status is irrelevant; only a
/// missing binary counts as absent.
pub async fn command_exists(program: &str) -> bool {
    let result = Command::new(program)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(_) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            debug!(program = %program, error = %e, "Tool present but could not be run");
            true
        }
    }
}

/// Whether VirtualBox has at least one host-only interface.
async fn has_hostonly_interface(vboxmanage: &str) -> bool {
    match Command::new(vboxmanage)
        .args(["list", "hostonlyifs"])
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) => output.status.success() && !output.stdout.iter().all(u8::is_ascii_whitespace),
        Err(_) => false,
    }
}

/// Run every check.
pub async fn run(config: &Config) -> Vec<Check> {
    let mut checks = Vec::new();

    if command_exists(&config.vmrun_path).await {
        checks.push(Check::new(true, "VMware installed"));
    } else {
        checks.push(Check::new(false, format!("VMware not found ({})", config.vmrun_path)));
    }

    if command_exists(&config.vboxmanage_path).await {
        checks.push(Check::new(true, "VirtualBox installed"));

        if has_hostonly_interface(&config.vboxmanage_path).await {
            checks.push(Check::new(true, "VirtualBox host-only interface detected"));
        } else {
            checks.push(Check::new(
                false,
                "VirtualBox host-only interface is missing; SSH will not work. \
                 Create one with: VBoxManage hostonlyif create",
            ));
        }
    } else {
        checks.push(Check::new(
            false,
            format!("VirtualBox not found ({})", config.vboxmanage_path),
        ));
    }

    checks
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_command_exists() {
        assert!(command_exists("true").await);
        assert!(command_exists("false").await);
        assert!(!command_exists("/nonexistent/vmrun").await);
    }

    #[tokio::test]
    async fn test_nothing_installed() {
        let config = Config {
            vmrun_path: "/nonexistent/vmrun".to_string(),
            vboxmanage_path: "/nonexistent/VBoxManage".to_string(),
            ..Config::default()
        };

        let checks = run(&config).await;
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|check| !check.ok));
        assert_eq!(checks[0].to_string(), " - VMware not found (/nonexistent/vmrun)");
    }

    #[tokio::test]
    async fn test_virtualbox_hostonly_interface() {
        let dir = TempDir::new().unwrap();
        let with_iface = script(
            &dir,
            "vbox-ok",
            r#"[ "$1" = list ] && echo "Name:            vboxnet0"; exit 0"#,
        );
        let without_iface = script(&dir, "vbox-none", "exit 0");

        let config = Config {
            vmrun_path: "true".to_string(),
            vboxmanage_path: with_iface,
            ..Config::default()
        };
        let checks = run(&config).await;
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check.ok));
        assert_eq!(checks[0].to_string(), " ✓ VMware installed");

        let config = Config { vboxmanage_path: without_iface, ..config };
        let checks = run(&config).await;
        assert!(checks[1].ok);
        assert!(!checks[2].ok);
    }
}
