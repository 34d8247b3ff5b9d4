//! Error types for the ConflictPilot core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! Per-file failures (a file the model could not resolve, a write that
//! failed) are *not* errors at the workflow level; they are reported inside
//! the result records in [`crate::models`]. Only terminal failures surface as
//! [`WorkflowError`].

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Rebase(#[from] RebaseError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Subprocess errors
// ---------------------------------------------------------------------------

/// Errors from running the version-control executable.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable was not found on `$PATH`.
    #[error("{0} binary not found")]
    BinaryNotFound(String),

    /// The command exited with a non-zero status.
    #[error("command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// The command did not finish within the configured timeout.
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// Generic I/O wrapper (spawn failure, pipe failure).
    #[error("process I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProcessError {
    /// Captured stderr for a failed command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict scanning errors
// ---------------------------------------------------------------------------

/// Errors from enumerating or reading conflicted files.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The conflict listing command failed.
    #[error("failed to list conflicted files: {0}")]
    ListFailed(#[source] ProcessError),

    /// A conflicted file could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written back into the working tree.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The path escapes the repository working tree.
    #[error("path '{0}' is outside the working tree")]
    PathOutsideWorktree(String),
}

// ---------------------------------------------------------------------------
// Inference service errors
// ---------------------------------------------------------------------------

/// Errors from the inference service boundary.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("inference HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The service returned a non-success status code.
    #[error("inference API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// The service answered but flagged the request as unsuccessful.
    #[error("inference request unsuccessful: {0}")]
    Unsuccessful(String),

    /// The call did not complete within the configured timeout.
    #[error("inference call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response body could not be interpreted.
    #[error("inference response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Resolution client errors
// ---------------------------------------------------------------------------

/// Errors from the analysis half of the resolution client.
///
/// Resolution itself never fails with an error; it reports `resolved=false`
/// in a [`crate::models::ResolutionResult`].
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The conflicted file could not be read.
    #[error(transparent)]
    Read(#[from] ScanError),

    /// The inference call itself failed.
    #[error("conflict analysis failed: {0}")]
    AnalysisServiceError(#[source] InferenceError),

    /// The response did not contain a usable analysis object.
    #[error("could not parse conflict analysis: {0}")]
    AnalysisParseError(String),
}

// ---------------------------------------------------------------------------
// Rebase errors
// ---------------------------------------------------------------------------

/// Errors from rebase state management.
#[derive(Debug, Error)]
pub enum RebaseError {
    /// The underlying git command failed.
    #[error("rebase command failed: {0}")]
    Process(#[from] ProcessError),

    /// A state-machine transition was invalid.
    #[error("invalid rebase state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

// ---------------------------------------------------------------------------
// Workflow errors
// ---------------------------------------------------------------------------

/// Terminal failures of a whole workflow. The working tree is left as-is.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Fetching the target branch failed.
    #[error("failed to fetch target branch: {0}")]
    FetchFailed(#[source] ProcessError),

    /// The current branch name could not be determined.
    #[error("failed to determine current branch: {0}")]
    BranchLookupFailed(#[source] ProcessError),

    /// Enumerating conflicted files failed.
    #[error("failed to scan for conflicts: {0}")]
    ScanFailed(#[source] ScanError),

    /// Another rebase workflow already holds this repository.
    #[error("another rebase workflow is already running for '{0}'")]
    RepositoryBusy(String),

    /// A rebase command failed where the workflow cannot fail soft.
    #[error(transparent)]
    Rebase(#[from] RebaseError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ProcessError::CommandFailed {
            exit_code: 1,
            stderr: "fatal: not a git repository".into(),
        };
        assert_eq!(
            err.to_string(),
            "command failed (exit 1): fatal: not a git repository"
        );

        let err = ProcessError::Timeout {
            program: "git".into(),
            secs: 30,
        };
        assert_eq!(err.to_string(), "git timed out after 30s");

        let err = ScanError::PathOutsideWorktree("../etc/passwd".into());
        assert!(err.to_string().contains("outside the working tree"));

        let err = WorkflowError::RepositoryBusy("/tmp/repo".into());
        assert!(err.to_string().contains("/tmp/repo"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let err = ProcessError::BinaryNotFound("git".into());
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Process(_)));

        let err = ResolutionError::AnalysisParseError("no JSON".into());
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Resolution(_)));
    }

    #[test]
    fn test_stderr_accessor() {
        let err = ProcessError::CommandFailed {
            exit_code: 1,
            stderr: "CONFLICT (content)".into(),
        };
        assert_eq!(err.stderr(), Some("CONFLICT (content)"));
        assert_eq!(ProcessError::BinaryNotFound("git".into()).stderr(), None);
    }
}
