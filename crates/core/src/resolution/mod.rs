//! Model-backed analysis and resolution of conflicted files.

pub mod client;
mod prompts;

pub use client::{ResolutionClient, UNRESOLVED_MARKERS_ERROR};
