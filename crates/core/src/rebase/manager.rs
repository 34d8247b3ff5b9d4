//! Start, continue, abort and inspect a rebase.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::errors::RebaseError;
use crate::git::GitCli;

/// Outcome of starting a rebase.
///
/// A start never fails as such: git exits non-zero both for genuine
/// conflicts and for unrelated problems, so a non-zero exit is reported as
/// [`RebaseStart::Stopped`] with the captured detail and callers scan for
/// conflicts afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseStart {
    /// Every commit replayed without stopping.
    Clean,
    /// The rebase stopped. `detail` is git's stderr (or the error text).
    Stopped { detail: String },
}

#[derive(Debug, Clone)]
pub struct RebaseStateManager {
    git: GitCli,
}

impl RebaseStateManager {
    pub fn new(git: GitCli) -> Self {
        Self { git }
    }

    /// Rebase the current branch onto `<remote>/<target>`.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn start_rebase(&self, repo: &Path, target: &str) -> RebaseStart {
        match self.git.rebase_onto(repo, target).await {
            Ok(()) => {
                info!("rebase completed without stopping");
                RebaseStart::Clean
            }
            Err(e) => {
                let detail = e.stderr().map(str::to_string).unwrap_or_else(|| e.to_string());
                debug!(%detail, "rebase stopped");
                RebaseStart::Stopped { detail }
            }
        }
    }

    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn continue_rebase(&self, repo: &Path) -> Result<(), RebaseError> {
        self.git.rebase_continue(repo).await?;
        Ok(())
    }

    /// Abort the in-progress rebase. Aborting when no rebase is in progress
    /// succeeds.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn abort_rebase(&self, repo: &Path) -> Result<(), RebaseError> {
        match self.git.rebase_abort(repo).await {
            Ok(()) => {
                info!("rebase aborted");
                Ok(())
            }
            Err(e) if !self.is_rebase_in_progress(repo).await => {
                debug!(error = %e, "abort requested with no rebase in progress");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// True iff the repository's internal directory holds a rebase-in-progress
    /// marker. Any failure to determine this reports `false`.
    pub async fn is_rebase_in_progress(&self, repo: &Path) -> bool {
        let git_dir = match self.git.git_dir(repo).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!(repo = %repo.display(), error = %e, "could not locate git directory");
                return false;
            }
        };
        for marker in ["rebase-merge", "rebase-apply"] {
            if tokio::fs::try_exists(git_dir.join(marker))
                .await
                .unwrap_or(false)
            {
                return true;
            }
        }
        false
    }
}
