//! Native tool invocation.
//!
//! Every backend drives its product through a command-line tool (`vmrun`,
//! `VBoxManage`). Calls block the current operation until the tool exits;
//! there is no timeout.

use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{EngineError, Result};

/// Captured result of one native tool run.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    /// Full command line, for diagnostics
    pub command: String,
    pub status: ExitStatus,
    /// stdout followed by stderr
    pub text: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Whether the combined output mentions `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Turn a failed run into [`EngineError::CommandFailed`], logging the raw
    /// tool output first.
    pub fn into_result(self) -> Result<()> {
        if self.success() {
            return Ok(());
        }

        error!(
            command = %self.command,
            status = %self.status,
            output = %self.text.trim_end(),
            "Native command failed"
        );

        Err(EngineError::CommandFailed {
            command: self.command,
            status: self.status.to_string(),
            output: self.text.trim().to_string(),
        })
    }
}

/// Run `program` with `args` and capture its combined output.
///
/// A non-zero exit is not an error here; callers inspect the output first so
/// they can downgrade known messages to success.
pub(crate) async fn run(program: &str, args: &[String]) -> Result<ToolOutput> {
    let command = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    debug!(command = %command, "Executing command");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| EngineError::Spawn {
            command: program.to_string(),
            source: e,
        })?;

    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    debug!(
        command = %command,
        status = %output.status,
        output = %text.trim_end(),
        "Command finished"
    );

    Ok(ToolOutput {
        command,
        status: output.status,
        text,
    })
}
