//! Apply reviewer-adjudicated previews to the working tree.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::conflict::has_conflict_markers;
use crate::errors::WorkflowError;
use crate::git::GitCli;
use crate::models::{ApplyResolutionsResult, ConflictResolutionPreview, FileFailure, PreviewStatus};
use crate::rebase::{RebaseStateManager, RepoLocks};
use crate::worktree;

/// Rejected when approved content still carries conflict markers.
pub const MARKERS_REMAIN_ERROR: &str = "content still contains conflict markers";

#[derive(Debug, Clone)]
pub struct ApprovalApplier {
    git: GitCli,
    rebase: RebaseStateManager,
    locks: RepoLocks,
}

impl ApprovalApplier {
    pub fn new(git: GitCli, locks: RepoLocks) -> Self {
        Self {
            rebase: RebaseStateManager::new(git.clone()),
            git,
            locks,
        }
    }

    /// Write and stage every approved or modified preview, then try to
    /// continue the rebase if everything applied.
    ///
    /// Each preview lands in exactly one of `applied`, `failed` or
    /// `skipped`. Content with conflict markers is never written.
    #[instrument(skip(self, previews), fields(repo = %repo.display(), count = previews.len()))]
    pub async fn apply_approved_resolutions(
        &self,
        repo: &Path,
        previews: &[ConflictResolutionPreview],
    ) -> Result<ApplyResolutionsResult, WorkflowError> {
        let _lease = self.locks.try_acquire(repo)?;
        let mut result = ApplyResolutionsResult::default();

        for preview in previews {
            match preview.status {
                PreviewStatus::Approved | PreviewStatus::Modified => {}
                PreviewStatus::Rejected | PreviewStatus::Pending => {
                    debug!(file = %preview.file, status = %preview.status, "skipping");
                    result.skipped.push(preview.file.clone());
                    continue;
                }
            }

            match self.apply_one(repo, preview).await {
                Ok(()) => result.applied.push(preview.file.clone()),
                Err(error) => {
                    warn!(file = %preview.file, %error, "could not apply resolution");
                    result.failed.push(FileFailure {
                        file: preview.file.clone(),
                        error,
                    });
                }
            }
        }

        let mut continued = false;
        if result.failed.is_empty() && !result.applied.is_empty() {
            match self.rebase.continue_rebase(repo).await {
                Ok(()) => continued = true,
                // More conflicts may remain for another review round.
                Err(e) => warn!(error = %e, "rebase continue did not complete"),
            }
        }

        result.success = result.failed.is_empty();
        result.message = format!(
            "{} applied, {} failed, {} skipped{}",
            result.applied.len(),
            result.failed.len(),
            result.skipped.len(),
            if continued { "; rebase continued" } else { "" }
        );
        info!(
            applied = result.applied.len(),
            failed = result.failed.len(),
            skipped = result.skipped.len(),
            continued,
            "applied approved resolutions"
        );
        Ok(result)
    }

    async fn apply_one(&self, repo: &Path, preview: &ConflictResolutionPreview) -> Result<(), String> {
        let content = preview.effective_content();
        if has_conflict_markers(content) {
            return Err(MARKERS_REMAIN_ERROR.to_string());
        }
        worktree::write_text(repo, &preview.file, content)
            .await
            .map_err(|e| e.to_string())?;
        self.git
            .add(repo, &preview.file)
            .await
            .map_err(|e| format!("failed to stage '{}': {e}", preview.file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::{write_file, ScriptedRunner, CONFLICTED_TS, RESOLVED_TS};

    fn applier(runner: &Arc<ScriptedRunner>) -> ApprovalApplier {
        ApprovalApplier::new(GitCli::new(runner.clone(), "git", "origin"), RepoLocks::new())
    }

    fn preview(file: &str, status: PreviewStatus) -> ConflictResolutionPreview {
        let mut p = ConflictResolutionPreview::pending(file, "typescript", CONFLICTED_TS, RESOLVED_TS, None);
        p.status = status;
        p
    }

    #[tokio::test]
    async fn test_modified_with_markers_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "file1.ts", CONFLICTED_TS);
        write_file(dir.path(), "file2.ts", CONFLICTED_TS);
        let runner = Arc::new(ScriptedRunner::new());

        let mut second = preview("file2.ts", PreviewStatus::Approved);
        second.modify(CONFLICTED_TS);
        let previews = vec![preview("file1.ts", PreviewStatus::Approved), second];

        let result = applier(&runner)
            .apply_approved_resolutions(dir.path(), &previews)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.applied, vec!["file1.ts"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].file, "file2.ts");
        assert_eq!(result.failed[0].error, MARKERS_REMAIN_ERROR);

        let file1 = std::fs::read_to_string(dir.path().join("file1.ts")).unwrap();
        assert_eq!(file1, RESOLVED_TS);
        let file2 = std::fs::read_to_string(dir.path().join("file2.ts")).unwrap();
        assert_eq!(file2, CONFLICTED_TS);
        assert_eq!(runner.count("add -- file2.ts"), 0);
        assert_eq!(runner.count("rebase --continue"), 0);
    }

    #[tokio::test]
    async fn test_partition_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let mut edited = preview("c.ts", PreviewStatus::Pending);
        edited.modify("export const c = 3;\n");
        let previews = vec![
            preview("a.ts", PreviewStatus::Approved),
            preview("b.ts", PreviewStatus::Rejected),
            edited,
            preview("d.ts", PreviewStatus::Pending),
        ];

        let result = applier(&runner)
            .apply_approved_resolutions(dir.path(), &previews)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.applied, vec!["a.ts", "c.ts"]);
        assert_eq!(result.skipped, vec!["b.ts", "d.ts"]);
        assert!(result.failed.is_empty());
        assert_eq!(
            result.applied.len() + result.failed.len() + result.skipped.len(),
            previews.len()
        );

        let c = std::fs::read_to_string(dir.path().join("c.ts")).unwrap();
        assert_eq!(c, "export const c = 3;\n");
        assert_eq!(runner.count("rebase --continue"), 1);
        assert!(result.message.contains("rebase continued"));
    }

    #[tokio::test]
    async fn test_continue_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().fail("rebase --continue", 1, "CONFLICT in next commit"));
        let previews = vec![preview("a.ts", PreviewStatus::Approved)];

        let result = applier(&runner)
            .apply_approved_resolutions(dir.path(), &previews)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.applied, vec!["a.ts"]);
        assert_eq!(runner.count("rebase --continue"), 1);
    }

    #[tokio::test]
    async fn test_nothing_applied_does_not_continue() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let previews = vec![preview("a.ts", PreviewStatus::Rejected)];

        let result = applier(&runner)
            .apply_approved_resolutions(dir.path(), &previews)
            .await
            .unwrap();
        assert!(result.success);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stage_failure_is_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().fail("add -- b.ts", 128, "fatal: pathspec"));
        let previews = vec![
            preview("a.ts", PreviewStatus::Approved),
            preview("b.ts", PreviewStatus::Approved),
        ];

        let result = applier(&runner)
            .apply_approved_resolutions(dir.path(), &previews)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.applied, vec!["a.ts"]);
        assert_eq!(result.failed[0].file, "b.ts");
        assert!(result.failed[0].error.contains("failed to stage"));
        assert_eq!(runner.count("rebase --continue"), 0);
    }

    #[tokio::test]
    async fn test_path_outside_worktree_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let previews = vec![preview("../escape.ts", PreviewStatus::Approved)];

        let result = applier(&runner)
            .apply_approved_resolutions(dir.path(), &previews)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.failed[0].error.contains("outside the working tree"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_apply_on_busy_repo_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "file1.ts", CONFLICTED_TS);
        let runner = Arc::new(ScriptedRunner::new());
        let applier = applier(&runner);

        let _held = applier.locks.try_acquire(dir.path()).unwrap();
        let err = applier
            .apply_approved_resolutions(dir.path(), &[preview("file1.ts", PreviewStatus::Approved)])
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RepositoryBusy(_)));
        assert!(runner.calls().is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("file1.ts")).unwrap(),
            CONFLICTED_TS
        );
    }
}
