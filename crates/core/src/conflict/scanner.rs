//! Enumeration and reading of conflicted files.

use std::path::Path;

use tracing::{debug, instrument};

use super::detector::{has_conflict_markers, language_for_path};
use crate::errors::ScanError;
use crate::git::GitCli;
use crate::models::ConflictedFile;
use crate::worktree;

/// Lists files in a merge-conflict state and reads them fresh from disk.
#[derive(Debug, Clone)]
pub struct ConflictScanner {
    git: GitCli,
}

impl ConflictScanner {
    pub fn new(git: GitCli) -> Self {
        Self { git }
    }

    /// Relative paths of conflicted files. An empty list means no conflicts.
    #[instrument(skip(self), fields(repo = %repo.display()))]
    pub async fn list_conflicted(&self, repo: &Path) -> Result<Vec<String>, ScanError> {
        self.git
            .list_conflicted(repo)
            .await
            .map_err(ScanError::ListFailed)
    }

    /// Read one conflicted file with its inferred language.
    pub async fn read_conflicted(&self, repo: &Path, path: &str) -> Result<ConflictedFile, ScanError> {
        let content = worktree::read_text(repo, path).await?;
        let language = language_for_path(path).to_string();
        debug!(path, %language, markers = has_conflict_markers(&content), "read conflicted file");
        Ok(ConflictedFile {
            path: path.to_string(),
            content,
            language,
        })
    }

    pub fn has_markers(content: &str) -> bool {
        has_conflict_markers(content)
    }
}
