//! ConflictPilot core library.
//!
//! This crate rebases a branch onto a target and resolves the resulting
//! merge conflicts with an inference service: configuration, the git
//! subprocess boundary, conflict scanning, model-backed resolution, the
//! rebase state machine, and the preview / approve / automatic workflows.

pub mod config;
pub mod conflict;
pub mod engine;
pub mod errors;
pub mod git;
pub mod inference;
pub mod models;
pub mod process;
pub mod rebase;
pub mod resolution;
pub mod workflow;
pub mod worktree;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience.
pub use config::AppConfig;
pub use engine::ResolutionEngine;
pub use errors::{CoreError, WorkflowError};
pub use inference::{HttpInferenceClient, InferenceService};
pub use process::{ProcessRunner, TokioProcessRunner};
