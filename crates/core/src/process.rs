//! Subprocess execution for the version-control tool.
//!
//! [`ProcessRunner`] is the single seam through which the core touches the
//! `git` executable. It is injected into every component so tests can script
//! git's behaviour without a real repository.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::ProcessError;

/// Runs an executable in a working directory and returns its trimmed stdout.
///
/// A non-zero exit is reported as [`ProcessError::CommandFailed`]. No retry
/// happens at this layer.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<String, ProcessError>;
}

/// [`ProcessRunner`] backed by `tokio::process` with a per-call timeout.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    timeout: Duration,
}

impl TokioProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<String, ProcessError> {
        let mut cmd = Command::new(program);
        cmd.current_dir(working_dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(cmd = ?format!("{} {}", program, args.join(" ")), dir = %working_dir.display(), "running command");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::BinaryNotFound(program.to_string())
                } else {
                    ProcessError::IoError(e)
                }
            })?,
            Err(_) => {
                warn!(program, secs = self.timeout.as_secs(), "command timed out");
                return Err(ProcessError::Timeout {
                    program: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            debug!(exit_code, %stderr, "command exited non-zero");
            return Err(ProcessError::CommandFailed { exit_code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
