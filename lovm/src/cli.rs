//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use lovm_common::LogFormat;
use std::path::PathBuf;

/// lovm - A minimalist, idempotent command-line tool for managing local virtual machines
///
/// The machine is described by `machine.lovm` in the current directory.
#[derive(Parser, Debug)]
#[command(name = "lovm")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(long, global = true, env = "LOVM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

// Global flags are long-only so they never shadow ssh's short options.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clone a VM. Start here!
    ///
    /// SOURCE is a .vmx or .vbox path, optionally followed by :<snapshot>.
    /// Without SOURCE the source recorded in machine.lovm is used.
    Clone {
        source: Option<String>,
    },

    /// Start the VM, cloning it first if needed
    Start,

    /// Stop the VM
    Stop,

    /// Stop / start the VM
    Restart,

    /// Open an SSH session to the VM
    ///
    /// Options before the first non-option word go to ssh; the rest is run
    /// on the guest: `lovm ssh -l root shutdown -h now`.
    Ssh {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Write the VM's IP address to stdout
    Ip,

    /// Mount a host folder into the VM
    Mount {
        /// Host path to share
        host: String,
        /// Target path in the guest
        guest: String,
    },

    /// Delete the VM
    Delete,

    /// Check which virtualization tools are installed
    Status,
}
