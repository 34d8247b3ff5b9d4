//! Rebase lifecycle: starting, continuing, aborting and inspecting a rebase,
//! the explicit state machine the automatic loop drives, and the
//! per-repository lock every rebase-mutating workflow holds.

pub mod lock;
pub mod manager;
pub mod state;

pub use lock::{RepoLease, RepoLocks};
pub use manager::{RebaseStart, RebaseStateManager};
pub use state::{RebaseEvent, RebaseState};
