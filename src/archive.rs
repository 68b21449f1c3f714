#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, future::Future, path::Path, time::Duration};

use anyhow::{Context, Result};
use rand::Rng;

use crate::{constants::PASSWORD_ALPHABET, process::run_collect, util};

/// Packs a staging folder into a password protected archive.
pub trait Archiver {
    /// Packs every file directly inside `staging` into `destination`.
    fn archive(
        &self,
        staging: &Path,
        destination: &Path,
        password: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Archiver backed by the `7za` command line tool.
#[derive(Debug, Clone)]
pub struct SevenZip {
    /// Executable name or path
    program: String,
    /// Deadline for one invocation
    timeout: Duration,
}

impl SevenZip {
    /// Archiver running `program`, killed after `timeout`.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Arguments for one invocation: zip format, password, SHA256 checksum.
    pub fn arguments(
        staging: &Path,
        destination: &Path,
        password: &str,
    ) -> Result<Vec<OsString>> {
        let mut args: Vec<OsString> = vec!["a".into(), "-tzip".into(), destination.into()];
        args.extend(util::file_names(staging)?.into_iter().map(|n| staging.join(n).into()));
        args.push(format!("-p{password}").into());
        args.push("-scrcSHA256".into());
        Ok(args)
    }
}

impl Archiver for SevenZip {
    async fn archive(&self, staging: &Path, destination: &Path, password: &str) -> Result<()> {
        let program = util::archiver_path(&self.program)?;
        let args = Self::arguments(staging, destination, password)?;
        run_collect(program, &args, Some(self.timeout))
            .await
            .with_context(|| format!("Could not run {}", self.program))?
            .ensure_success(&self.program)?;
        Ok(())
    }
}

/// Random password drawn from lowercase letters and digits.
pub fn generate_password(rng: &mut impl Rng, length: usize) -> String {
    (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Moves the archive the external tool produced into `destination`. The tool
/// may still be flushing the file when it returns, so a missing file is
/// retried `attempts` times with `backoff` in between.
pub async fn move_with_retry(
    source: &Path,
    destination: &Path,
    attempts: u32,
    backoff: Duration,
) -> Result<()> {
    let mut last_error = None;
    for attempt in 1..=attempts.max(1) {
        match move_file(source, destination) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not there yet (attempt {attempt})", source.display());
                last_error = Some(e);
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Could not move {} to {}", source.display(), destination.display())
                });
            }
        }
    }
    Err(last_error.unwrap_or_else(|| std::io::ErrorKind::NotFound.into())).with_context(|| {
        format!("{} never appeared after {attempts} attempts", source.display())
    })
}

/// Renames, falling back to copy and delete across file systems.
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match std::fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(e),
        Err(_) => {
            std::fs::copy(source, destination)?;
            std::fs::remove_file(source)
        }
    }
}
