//! Explicit rebase state machine.
//!
//! ```text
//! Idle --Started--> Rebasing --ConflictsFound--> ConflictsPending --ApplyBegun--> Applying
//!  |                  |  ^                                                         |
//!  |                  |  +----------------- ContinuedWithConflicts ----------------+
//!  |                  +--ContinuedDone--> Complete <-------- ContinuedDone --------+
//!  +--StartedClean--> Complete
//! any non-terminal --Aborted--> Aborted
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::RebaseError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RebaseState {
    /// No rebase started by this workflow yet.
    Idle,
    /// Rebase stopped; conflict status not yet scanned.
    Rebasing,
    /// Conflicted files are present and awaiting resolution.
    ConflictsPending,
    /// Resolutions are being written and staged.
    Applying,
    /// No rebase remains in progress.
    Complete,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseEvent {
    /// Rebase start stopped before finishing.
    Started,
    /// Rebase start replayed every commit without stopping.
    StartedClean,
    ConflictsFound,
    ApplyBegun,
    /// `continue` ran and the rebase is still in progress.
    ContinuedWithConflicts,
    /// `continue` ran and no rebase remains in progress.
    ContinuedDone,
    Aborted,
}

impl RebaseState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }

    pub fn transition(self, event: RebaseEvent) -> Result<Self, RebaseError> {
        use RebaseEvent as E;
        use RebaseState as S;

        let next = match (self, event) {
            (S::Idle, E::Started) => S::Rebasing,
            (S::Idle, E::StartedClean) => S::Complete,
            (S::Rebasing | S::ConflictsPending, E::ConflictsFound) => S::ConflictsPending,
            (S::ConflictsPending, E::ApplyBegun) => S::Applying,
            (S::Rebasing | S::Applying, E::ContinuedWithConflicts) => S::Rebasing,
            (S::Rebasing | S::Applying, E::ContinuedDone) => S::Complete,
            (s, E::Aborted) if !s.is_terminal() => S::Aborted,
            (from, event) => {
                return Err(RebaseError::InvalidTransition {
                    from: from.to_string(),
                    event: format!("{event:?}"),
                })
            }
        };
        Ok(next)
    }
}

impl std::fmt::Display for RebaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Rebasing => write!(f, "rebasing"),
            Self::ConflictsPending => write!(f, "conflicts_pending"),
            Self::Applying => write!(f, "applying"),
            Self::Complete => write!(f, "complete"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}
