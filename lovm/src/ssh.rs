//! `lovm ssh`: run ssh against the guest's address.
//!
//! ssh wants every option before the host and treats whatever follows the
//! host as the remote command, so the caller's arguments are split and the
//! guest address is inserted between the two halves:
//!
//! ```text
//! lovm ssh -l root shutdown -h now
//! ssh -l root <ip> shutdown -h now
//! ```
//!
//! The split is a heuristic:
//!
//! 1. an argument made only of boolean flags (`-A`, `-4v`) is an ssh flag,
//! 2. a single option flag (`-l`, `-i`) is an ssh option and takes the next
//!    argument as its value,
//! 3. anything else starts the remote command.

use anyhow::{bail, Context, Result};
use lovm_engine::SshConfig;
use std::net::Ipv4Addr;
use tokio::process::Command;
use tracing::{debug, info};

/// ssh flags that take no value.
pub const SSH_BOOL_FLAGS: &str = "46AaCfGgKkMNnqsTtVvXxYy";

/// ssh options followed by exactly one value.
pub const SSH_OPTION_FLAGS: &str = "bcDEeFIiJLlmOopQRSWw";

/// `-A`, `-4v`, `-MN6XY`: a dash followed only by boolean flags.
pub fn is_bool_flags(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(flags) if !flags.is_empty() => flags.chars().all(|c| SSH_BOOL_FLAGS.contains(c)),
        _ => false,
    }
}

/// `-l`, `-i`: a dash followed by exactly one option flag.
pub fn is_option_flag(arg: &str) -> bool {
    let mut chars = arg.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('-'), Some(flag), None) if SSH_OPTION_FLAGS.contains(flag)
    )
}

/// Split caller arguments into (ssh options, remote command).
pub fn split_remote_command(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut ssh_args = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        if is_bool_flags(arg) {
            ssh_args.push(arg.clone());
            i += 1;
        } else if is_option_flag(arg) && i + 1 < args.len() {
            ssh_args.push(arg.clone());
            ssh_args.push(args[i + 1].clone());
            i += 2;
        } else {
            break;
        }
    }

    (ssh_args, args[i..].to_vec())
}

/// Full ssh argument vector (without the program name). Record hints come
/// first and are skipped when the caller already passed the same option.
pub fn build_args(args: &[String], ip: Ipv4Addr, hints: &SshConfig) -> Vec<String> {
    let (ssh_args, remote) = split_remote_command(args);
    let passed = |flag: &str| ssh_args.iter().any(|arg| arg == flag);

    let mut out = Vec::with_capacity(ssh_args.len() + remote.len() + 5);
    if let Some(user) = hints.user.as_ref().filter(|_| !passed("-l")) {
        out.push("-l".to_string());
        out.push(user.clone());
    }
    if let Some(key) = hints.identity_file.as_ref().filter(|_| !passed("-i")) {
        out.push("-i".to_string());
        out.push(key.clone());
    }
    out.extend(ssh_args);
    out.push(ip.to_string());
    out.extend(remote);
    out
}

/// Run ssh with the terminal attached and wait for it to exit.
pub async fn passthrough(ssh_path: &str, args: &[String]) -> Result<()> {
    info!(program = %ssh_path, args = ?args, "Opening SSH session");

    let status = Command::new(ssh_path)
        .args(args)
        .status()
        .await
        .with_context(|| format!("failed to run {}", ssh_path))?;

    debug!(status = %status, "SSH session ended");

    if !status.success() {
        bail!("{} exited with {}", ssh_path, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 80);

    #[test]
    fn test_is_bool_flags() {
        let cases = [
            ("a", false),
            ("-a", true),
            ("-Aa", true),
            ("-b", false),
            ("-c", false),
            ("-MN6XY", true),
            ("MN6XY", false),
            ("-", false),
            ("-Ab", false),
        ];
        for (input, expected) in cases {
            assert_eq!(is_bool_flags(input), expected, "{input:?}");
        }
    }

    #[test]
    fn test_is_option_flag() {
        let cases = [
            ("-b", true),
            ("-c", true),
            ("-l", true),
            ("c", false),
            ("-bc", false),
            ("-q", false),
            ("-", false),
        ];
        for (input, expected) in cases {
            assert_eq!(is_option_flag(input), expected, "{input:?}");
        }
    }

    #[test]
    fn test_split_remote_command() {
        let cases = [
            ("", "", ""),
            ("sudo shutdown -r now", "", "sudo shutdown -r now"),
            ("-i ~/.ssh/id_rsa", "-i ~/.ssh/id_rsa", ""),
            ("-l root shutdown -r now", "-l root", "shutdown -r now"),
            ("-A -p 2222 uptime", "-A -p 2222", "uptime"),
            // Option flag with nothing after it starts the remote command
            ("-v -l", "-v", "-l"),
        ];

        for (input, ssh, remote) in cases {
            let (ssh_args, remote_cmd) = split_remote_command(&words(input));
            assert_eq!(ssh_args, words(ssh), "ssh args for {input:?}");
            assert_eq!(remote_cmd, words(remote), "remote command for {input:?}");
        }
    }

    #[test]
    fn test_build_args() {
        let hints = SshConfig::default();
        let cases = [
            ("-l root", "-l root 192.168.1.80"),
            ("shutdown -h now", "192.168.1.80 shutdown -h now"),
            ("-l root shutdown -h now", "-l root 192.168.1.80 shutdown -h now"),
        ];

        for (input, expected) in cases {
            assert_eq!(build_args(&words(input), IP, &hints), words(expected), "{input:?}");
        }
    }

    #[test]
    fn test_build_args_with_record_hints() {
        let hints = SshConfig {
            user: Some("dev".to_string()),
            identity_file: Some("/keys/dev".to_string()),
            interface: None,
        };

        assert_eq!(
            build_args(&words("uptime"), IP, &hints),
            words("-l dev -i /keys/dev 192.168.1.80 uptime")
        );
        // Caller's -l wins over the record
        assert_eq!(
            build_args(&words("-l root"), IP, &hints),
            words("-i /keys/dev -l root 192.168.1.80")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_passthrough_exit_status() {
        assert!(passthrough("true", &[]).await.is_ok());

        let err = passthrough("false", &[]).await.unwrap_err();
        assert!(err.to_string().contains("exited with"));

        assert!(passthrough("/nonexistent/ssh", &[]).await.is_err());
    }
}
