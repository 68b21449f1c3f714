#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::{OsStr, OsString},
    process::Stdio,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use tokio::{process::Command, time::timeout};

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct Collected {
    /// Exit status returned by the process.
    pub status: std::process::ExitStatus,
    /// Contents written to stderr.
    pub stderr: Vec<u8>,
}

impl Collected {
    /// Fails with the captured stderr unless the process exited cleanly.
    pub fn ensure_success(self, what: &str) -> Result<Self> {
        if !self.status.success() {
            bail!(
                "{what} exited with {}:\n{}",
                self.status,
                String::from_utf8_lossy(&self.stderr).trim()
            );
        }
        Ok(self)
    }
}

/// Spawns a command with stdin closed, discards stdout and collects stderr.
/// The child is killed if `deadline` passes first.
pub async fn run_collect(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    deadline: Option<Duration>,
) -> Result<Collected> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().context("failed to spawn process")?;
    let wait = child.wait_with_output();

    let output = match deadline {
        Some(limit) => timeout(limit, wait)
            .await
            .context("subprocess timed out")?
            .context("failed to wait on process")?,
        None => wait.await.context("failed to wait on process")?,
    };

    Ok(Collected {
        status: output.status,
        stderr: output.stderr,
    })
}
