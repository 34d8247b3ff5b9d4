//! Automatic mode: scan, resolve, apply and continue until the rebase
//! finishes, without a reviewer.
//!
//! Less safe than the preview flow. A batch is applied only if every file in
//! it resolved; otherwise the rebase is aborted before anything is written.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::begin_rebase;
use crate::conflict::{has_conflict_markers, ConflictScanner};
use crate::errors::WorkflowError;
use crate::git::GitCli;
use crate::models::{RebaseWithResolutionResult, ResolutionResult};
use crate::rebase::{RebaseEvent, RebaseStart, RebaseState, RebaseStateManager, RepoLocks};
use crate::resolution::ResolutionClient;
use crate::worktree;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct AutoResolutionLoop {
    git: GitCli,
    rebase: RebaseStateManager,
    scanner: ConflictScanner,
    resolver: ResolutionClient,
    locks: RepoLocks,
}

/// Bookkeeping for one run of the loop.
struct Run {
    state: RebaseState,
    resolutions: Vec<ResolutionResult>,
    start_error: Option<String>,
}

impl Run {
    fn advance(&mut self, event: RebaseEvent) -> Result<(), WorkflowError> {
        self.state = self.state.transition(event)?;
        debug!(state = %self.state, ?event, "rebase state");
        Ok(())
    }

    fn resolved(&self) -> usize {
        self.resolutions.iter().filter(|r| r.resolved).count()
    }

    fn finish(self, success: bool, message: String) -> RebaseWithResolutionResult {
        let conflicts_resolved = self.resolved();
        RebaseWithResolutionResult {
            success,
            message,
            conflicts_resolved,
            conflicts_failed: self.resolutions.len() - conflicts_resolved,
            resolutions: self.resolutions,
            rebase_start_error: self.start_error,
        }
    }
}

impl AutoResolutionLoop {
    pub fn new(
        git: GitCli,
        scanner: ConflictScanner,
        resolver: ResolutionClient,
        locks: RepoLocks,
    ) -> Self {
        Self {
            rebase: RebaseStateManager::new(git.clone()),
            git,
            scanner,
            resolver,
            locks,
        }
    }

    /// Rebase onto `<remote>/<target>`, resolving each conflict batch
    /// automatically. Every iteration consumes one of `max_retries`.
    ///
    /// If any file in a batch cannot be resolved the rebase is aborted and
    /// none of that batch is written.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn rebase_with_resolution(
        &self,
        repo: &Path,
        target: &str,
        max_retries: u32,
    ) -> Result<RebaseWithResolutionResult, WorkflowError> {
        let _lease = self.locks.try_acquire(repo)?;

        let mut run = Run {
            state: RebaseState::Idle,
            resolutions: Vec::new(),
            start_error: None,
        };

        let (current, start) = begin_rebase(&self.git, &self.rebase, repo, target).await?;
        match start {
            RebaseStart::Clean => {
                run.advance(RebaseEvent::StartedClean)?;
                return Ok(run.finish(true, "Rebase completed without conflicts".into()));
            }
            RebaseStart::Stopped { detail } => run.start_error = Some(detail),
        }
        run.advance(RebaseEvent::Started)?;

        let mut iterations = 0;
        while !run.state.is_terminal() && iterations < max_retries {
            iterations += 1;
            debug!(iteration = iterations, max_retries, "resolution pass");

            let files = match self.scanner.list_conflicted(repo).await {
                Ok(files) => files,
                Err(e) => {
                    self.abort_quietly(repo).await;
                    return Err(WorkflowError::ScanFailed(e));
                }
            };

            if !files.is_empty() {
                run.advance(RebaseEvent::ConflictsFound)?;

                let mut batch = Vec::with_capacity(files.len());
                for path in &files {
                    let resolution = self.resolver.resolve(repo, path, &current, target).await;
                    batch.push(self.explain_failure(repo, resolution).await);
                }

                let unresolved: Vec<String> = batch
                    .iter()
                    .filter(|r| !r.resolved)
                    .map(|r| r.file.clone())
                    .collect();
                run.resolutions.extend(batch);
                if !unresolved.is_empty() {
                    self.abort_quietly(repo).await;
                    run.advance(RebaseEvent::Aborted)?;
                    let message = format!(
                        "Rebase aborted: could not resolve {} file(s): {}",
                        unresolved.len(),
                        unresolved.join(", ")
                    );
                    warn!(%message);
                    return Ok(run.finish(false, message));
                }

                run.advance(RebaseEvent::ApplyBegun)?;
                let offset = run.resolutions.len() - files.len();
                let failure = self.apply_batch(repo, &run.resolutions[offset..]).await;
                if let Some(message) = failure {
                    self.abort_quietly(repo).await;
                    run.advance(RebaseEvent::Aborted)?;
                    warn!(%message);
                    return Ok(run.finish(false, message));
                }
            }

            if let Err(e) = self.rebase.continue_rebase(repo).await {
                debug!(error = %e, "rebase continue stopped");
            }
            if self.rebase.is_rebase_in_progress(repo).await {
                run.advance(RebaseEvent::ContinuedWithConflicts)?;
            } else {
                run.advance(RebaseEvent::ContinuedDone)?;
            }
        }

        if run.state != RebaseState::Complete {
            self.abort_quietly(repo).await;
            run.advance(RebaseEvent::Aborted)?;
            let message = format!("Rebase still in progress after {iterations} attempt(s); aborted");
            warn!(%message);
            return Ok(run.finish(false, message));
        }

        let mut message = format!("Rebase completed; resolved {} conflict(s)", run.resolved());
        if run.resolutions.is_empty() {
            if let Some(detail) = &run.start_error {
                // Stopped without conflicts: whatever git complained about is all the caller gets.
                message.push_str(&format!(" (rebase start reported: {detail})"));
            }
        }
        info!(%message);
        Ok(run.finish(true, message))
    }

    /// Attach a best-effort analysis to a failed resolution so the caller
    /// can see what the conflict was about.
    async fn explain_failure(&self, repo: &Path, resolution: ResolutionResult) -> ResolutionResult {
        if resolution.resolved {
            return resolution;
        }
        let analysis = match self.resolver.analyze(repo, &resolution.file).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                debug!(file = %resolution.file, error = %e, "analysis unavailable");
                None
            }
        };
        resolution.with_analysis(analysis)
    }

    /// Write and stage a fully resolved batch. Returns a failure message if
    /// any file could not be applied.
    async fn apply_batch(&self, repo: &Path, batch: &[ResolutionResult]) -> Option<String> {
        for resolution in batch {
            let content = resolution.content.as_deref().unwrap_or_default();
            if has_conflict_markers(content) {
                return Some(format!(
                    "Rebase aborted: '{}' still contains conflict markers",
                    resolution.file
                ));
            }
            if let Err(e) = worktree::write_text(repo, &resolution.file, content).await {
                return Some(format!("Rebase aborted: {e}"));
            }
            if let Err(e) = self.git.add(repo, &resolution.file).await {
                return Some(format!(
                    "Rebase aborted: failed to stage '{}': {e}",
                    resolution.file
                ));
            }
        }
        None
    }

    async fn abort_quietly(&self, repo: &Path) {
        if let Err(e) = self.rebase.abort_rebase(repo).await {
            warn!(repo = %repo.display(), error = %e, "rebase abort failed");
        }
    }
}
