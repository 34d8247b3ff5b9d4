//! The three top-level workflows.
//!
//! - [`PreviewOrchestrator`] starts a rebase and proposes a resolution for
//!   every conflicted file without touching the working tree.
//! - [`ApprovalApplier`] writes the reviewer-approved resolutions, stages
//!   them and advances the rebase.
//! - [`AutoResolutionLoop`] does both without a reviewer, aborting on the
//!   first unresolvable batch.
//!
//! Every workflow holds the repository's [`RepoLocks`] lease for its whole
//! duration.

pub mod apply;
pub mod auto;
pub mod preview;

pub use apply::ApprovalApplier;
pub use auto::AutoResolutionLoop;
pub use preview::PreviewOrchestrator;

use std::path::Path;

use tracing::warn;

use crate::errors::WorkflowError;
use crate::git::GitCli;
use crate::rebase::{RebaseStart, RebaseStateManager};

#[cfg(doc)]
use crate::rebase::RepoLocks;

/// Shared opening of the preview and automatic workflows: capture the
/// current branch, fetch the target and start the rebase.
pub(crate) async fn begin_rebase(
    git: &GitCli,
    rebase: &RebaseStateManager,
    repo: &Path,
    target: &str,
) -> Result<(String, RebaseStart), WorkflowError> {
    let current = git
        .current_branch(repo)
        .await
        .map_err(WorkflowError::BranchLookupFailed)?;
    git.fetch(repo, target)
        .await
        .map_err(WorkflowError::FetchFailed)?;

    let start = rebase.start_rebase(repo, target).await;
    if let RebaseStart::Stopped { detail } = &start {
        // Conflicts and unrelated failures exit the same way; the scan decides.
        warn!(repo = %repo.display(), %detail, "rebase start reported failure, scanning for conflicts");
    }
    Ok((current, start))
}
