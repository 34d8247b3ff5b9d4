//! Thin async wrapper over the `git` executable.
//!
//! One method per git invocation the resolution engine needs. Every call
//! returns git's trimmed stdout or the [`ProcessError`] from the runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::GitConfig;
use crate::errors::ProcessError;
use crate::process::ProcessRunner;

/// Git operations executed through an injected [`ProcessRunner`].
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn ProcessRunner>,
    executable: String,
    remote: String,
}

impl GitCli {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        executable: impl Into<String>,
        remote: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            executable: executable.into(),
            remote: remote.into(),
        }
    }

    pub fn from_config(runner: Arc<dyn ProcessRunner>, config: &GitConfig) -> Self {
        Self::new(runner, &config.executable, &config.remote)
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    async fn git(&self, repo: &Path, args: &[&str]) -> Result<String, ProcessError> {
        self.runner.run(&self.executable, args, repo).await
    }

    /// Paths (relative to the repo root) with unmerged index entries.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn list_conflicted(&self, repo: &Path) -> Result<Vec<String>, ProcessError> {
        let output = self
            .git(repo, &["diff", "--name-only", "--diff-filter=U"])
            .await?;
        let files: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = files.len(), "listed conflicted files");
        Ok(files)
    }

    pub async fn current_branch(&self, repo: &Path) -> Result<String, ProcessError> {
        self.git(repo, &["branch", "--show-current"]).await
    }

    #[instrument(skip(self), fields(repo = %repo.display(), remote = %self.remote))]
    pub async fn fetch(&self, repo: &Path, branch: &str) -> Result<(), ProcessError> {
        self.git(repo, &["fetch", &self.remote, branch]).await?;
        info!(branch, "fetched target branch");
        Ok(())
    }

    /// `git rebase <remote>/<branch>`.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn rebase_onto(&self, repo: &Path, branch: &str) -> Result<(), ProcessError> {
        let upstream = format!("{}/{}", self.remote, branch);
        self.git(repo, &["rebase", &upstream]).await?;
        Ok(())
    }

    /// `git rebase --continue`, with the commit-message editor disabled so
    /// the call never blocks on an interactive editor.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn rebase_continue(&self, repo: &Path) -> Result<(), ProcessError> {
        self.git(repo, &["-c", "core.editor=true", "rebase", "--continue"])
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn rebase_abort(&self, repo: &Path) -> Result<(), ProcessError> {
        self.git(repo, &["rebase", "--abort"]).await?;
        Ok(())
    }

    /// Stage a single path.
    pub async fn add(&self, repo: &Path, path: &str) -> Result<(), ProcessError> {
        self.git(repo, &["add", "--", path]).await?;
        debug!(path, "staged file");
        Ok(())
    }

    /// Absolute path of the repository's internal directory.
    pub async fn git_dir(&self, repo: &Path) -> Result<PathBuf, ProcessError> {
        let output = self.git(repo, &["rev-parse", "--git-dir"]).await?;
        let dir = PathBuf::from(output);
        Ok(if dir.is_absolute() { dir } else { repo.join(dir) })
    }
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli")
            .field("executable", &self.executable)
            .field("remote", &self.remote)
            .finish()
    }
}
