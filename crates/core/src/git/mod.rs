//! Git operations for ConflictPilot.
//!
//! All git access goes through the `git` executable via an injected
//! [`ProcessRunner`](crate::process::ProcessRunner).

pub mod client;

pub use client::GitCli;
