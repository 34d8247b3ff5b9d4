//! Preview generation: propose a resolution for every conflicted file and
//! hand the proposals to a human for review.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::begin_rebase;
use crate::conflict::{language_for_path, ConflictScanner};
use crate::errors::WorkflowError;
use crate::git::GitCli;
use crate::models::{ConflictPreviewResult, ConflictResolutionPreview};
use crate::rebase::{RebaseStart, RebaseStateManager, RepoLocks};
use crate::resolution::ResolutionClient;

#[derive(Debug, Clone)]
pub struct PreviewOrchestrator {
    git: GitCli,
    rebase: RebaseStateManager,
    scanner: ConflictScanner,
    resolver: ResolutionClient,
    locks: RepoLocks,
}

impl PreviewOrchestrator {
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

    /// Rebase onto `<remote>/<target>` and build a pending preview for each
    /// conflicted file, in enumeration order.
    ///
    /// The working tree is left mid-rebase with every file still conflicted;
    /// nothing is written. Fetch, branch lookup and conflict listing
    /// failures are terminal.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn generate_resolution_previews(
        &self,
        repo: &Path,
        target: &str,
    ) -> Result<ConflictPreviewResult, WorkflowError> {
        let _lease = self.locks.try_acquire(repo)?;

        let (current, start) = begin_rebase(&self.git, &self.rebase, repo, target).await?;
        let mut result = ConflictPreviewResult::new(repo, &current, target);

        match start {
            RebaseStart::Clean => {
                info!(%current, target, "rebase was clean, nothing to preview");
                return Ok(result);
            }
            RebaseStart::Stopped { detail } => result.rebase_start_error = Some(detail),
        }

        let files = self
            .scanner
            .list_conflicted(repo)
            .await
            .map_err(WorkflowError::ScanFailed)?;
        if files.is_empty() {
            warn!("rebase stopped but no conflicted files were found");
        }
        result.total_conflicts = files.len();

        for path in &files {
            let (preview, resolved) = self.preview_file(repo, path, &current, target).await;
            if resolved {
                result.resolved_by_ai += 1;
            } else {
                result.failed_to_resolve += 1;
            }
            result.previews.push(preview);
        }

        info!(
            total = result.total_conflicts,
            resolved = result.resolved_by_ai,
            failed = result.failed_to_resolve,
            "previews ready for review"
        );
        Ok(result)
    }

    /// Build the preview for one file and report whether the model resolved it.
    async fn preview_file(
        &self,
        repo: &Path,
        path: &str,
        current: &str,
        target: &str,
    ) -> (ConflictResolutionPreview, bool) {
        let file = match self.scanner.read_conflicted(repo, path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path, error = %e, "could not read conflicted file");
                let preview =
                    ConflictResolutionPreview::pending(path, language_for_path(path), "", "", None);
                return (preview, false);
            }
        };

        let analysis = match self.resolver.analyze_file(&file).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                debug!(path, error = %e, "analysis unavailable");
                None
            }
        };

        let resolution = self.resolver.resolve_file(&file, current, target).await;
        let (proposed, resolved) = match resolution.content {
            Some(content) if resolution.resolved => (content, true),
            _ => {
                warn!(
                    path,
                    error = resolution.error.as_deref().unwrap_or("unknown"),
                    "leaving conflicted content for manual resolution"
                );
                (file.content.clone(), false)
            }
        };

        let preview = ConflictResolutionPreview::pending(
            file.path,
            file.language,
            file.content,
            proposed,
            analysis,
        );
        (preview, resolved)
    }
}
