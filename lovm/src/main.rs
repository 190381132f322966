//! # lovm
//!
//! A minimalist, idempotent command-line tool for managing one local virtual
//! machine per project directory.
//!
//! ## Features
//! - Linked clones from VMware (`.vmx`) and VirtualBox (`.vbox`) templates
//! - Start, stop, restart and delete that are safe to repeat
//! - Guest IP lookup from VMware DHCP leases, and `ssh` straight into it
//!
//! ## Usage
//! ```bash
//! lovm clone ~/vms/ubuntu/ubuntu.vmx:clean
//! lovm start
//! lovm ssh -l dev
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, info};

mod cli;
mod commands;
mod config;
mod machine_file;
mod ssh;
mod status;

use cli::Args;
use config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // Load configuration before logging so its level applies
    let (config, config_path) = Config::discover(args.config.as_deref())?;
    let config = config.with_cli_overrides(&args);

    lovm_common::init_logging(&config.log_level, config.log_format)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting lovm");
    match &config_path {
        Some(path) => debug!(config_path = %path.display(), "Configuration loaded"),
        None => debug!("No config file found, using defaults"),
    }

    let workdir = std::env::current_dir().context("cannot determine the current directory")?;

    commands::execute(args.command, &workdir, &config).await
}
