//! Subprocess execution seam.
//!
//! The execution engine never spawns processes directly — it goes through the
//! [`Executor`] trait so tests can substitute a scripted implementation and
//! assert on the exact commands a run would issue.

use std::fmt;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context as _, Result};

/// Captured outcome of a single command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Raw exit code, when the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over subprocess spawning.
///
/// The production implementation is [`SystemExecutor`]; engine tests use
/// scripted fakes that never touch the system.
pub trait Executor: fmt::Debug + Send + Sync {
    /// Run a command in `dir`, capturing output without failing on a
    /// non-zero exit status.
    ///
    /// # Errors
    ///
    /// Returns an error only when the process cannot be spawned at all
    /// (missing executable, permission denied). A command that runs and
    /// exits non-zero is reported through [`ExecResult::success`].
    fn run_unchecked(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult>;

    /// Check if a program is available on the search path.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
