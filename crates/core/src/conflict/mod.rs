//! Conflict detection and scanning.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- deciding whether content still carries conflict markers.
//! 2. **Scanning** -- listing conflicted files and reading them with their language.

pub mod detector;
pub mod scanner;

pub use detector::{count_conflict_hunks, has_conflict_markers, language_for_path};
pub use scanner::ConflictScanner;
