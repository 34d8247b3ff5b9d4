//! The resolution engine: one handle wiring the workflows to a shared git
//! client, inference service and repository lock registry.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::conflict::ConflictScanner;
use crate::errors::{CoreError, WorkflowError};
use crate::git::GitCli;
use crate::inference::{HttpInferenceClient, InferenceService};
use crate::models::{
    ApplyResolutionsResult, ConflictPreviewResult, ConflictResolutionPreview,
    RebaseWithResolutionResult, RepoStatus,
};
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::rebase::{RebaseStateManager, RepoLocks};
use crate::resolution::ResolutionClient;
use crate::workflow::{ApprovalApplier, AutoResolutionLoop, PreviewOrchestrator};

/// Entry point for callers (the CLI, a UI bridge).
///
/// Cloning is cheap and clones share the same lock registry, so two clones
/// still refuse to drive one repository concurrently.
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    git: GitCli,
    rebase: RebaseStateManager,
    scanner: ConflictScanner,
    preview: PreviewOrchestrator,
    applier: ApprovalApplier,
    auto: AutoResolutionLoop,
    locks: RepoLocks,
    max_retries: u32,
}

impl ResolutionEngine {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        service: Arc<dyn InferenceService>,
        config: &AppConfig,
    ) -> Self {
        let git = GitCli::from_config(runner, &config.git);
        let scanner = ConflictScanner::new(git.clone());
        let resolver = ResolutionClient::from_config(service, scanner.clone(), &config.inference);
        let locks = RepoLocks::new();

        Self {
            rebase: RebaseStateManager::new(git.clone()),
            preview: PreviewOrchestrator::new(
                git.clone(),
                scanner.clone(),
                resolver.clone(),
                locks.clone(),
            ),
            applier: ApprovalApplier::new(git.clone(), locks.clone()),
            auto: AutoResolutionLoop::new(
                git.clone(),
                scanner.clone(),
                resolver,
                locks.clone(),
            ),
            git,
            scanner,
            locks,
            max_retries: config.rebase.max_retries,
        }
    }

    /// Build an engine backed by the real `git` executable and the HTTP
    /// inference client.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let runner = Arc::new(TokioProcessRunner::new(config.git.command_timeout()));
        let service = Arc::new(HttpInferenceClient::from_config(&config.inference)?);
        info!(endpoint = %service.endpoint(), "resolution engine ready");
        Ok(Self::new(runner, service, config))
    }

    pub async fn generate_resolution_previews(
        &self,
        repo: &Path,
        target: &str,
    ) -> Result<ConflictPreviewResult, WorkflowError> {
        self.preview.generate_resolution_previews(repo, target).await
    }

    pub async fn apply_approved_resolutions(
        &self,
        repo: &Path,
        previews: &[ConflictResolutionPreview],
    ) -> Result<ApplyResolutionsResult, WorkflowError> {
        self.applier.apply_approved_resolutions(repo, previews).await
    }

    /// Automatic mode. `max_retries` defaults to the configured budget.
    pub async fn rebase_with_resolution(
        &self,
        repo: &Path,
        target: &str,
        max_retries: Option<u32>,
    ) -> Result<RebaseWithResolutionResult, WorkflowError> {
        let budget = max_retries.unwrap_or(self.max_retries);
        self.auto.rebase_with_resolution(repo, target, budget).await
    }

    /// Abort any in-progress rebase. Safe to call when none is active.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn abort_rebase(&self, repo: &Path) -> Result<(), WorkflowError> {
        let _lease = self.locks.try_acquire(repo)?;
        self.rebase.abort_rebase(repo).await?;
        Ok(())
    }

    pub async fn is_rebase_in_progress(&self, repo: &Path) -> bool {
        self.rebase.is_rebase_in_progress(repo).await
    }

    /// Read-only snapshot; lookups that fail are reported as absent.
    pub async fn status(&self, repo: &Path) -> RepoStatus {
        let current_branch = self
            .git
            .current_branch(repo)
            .await
            .ok()
            .filter(|b| !b.is_empty());
        let rebase_in_progress = self.rebase.is_rebase_in_progress(repo).await;
        let conflicted_files = self.scanner.list_conflicted(repo).await.unwrap_or_default();
        RepoStatus {
            current_branch,
            rebase_in_progress,
            conflicted_files,
        }
    }
}
