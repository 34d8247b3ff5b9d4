//! Text file access scoped to a repository working tree.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::errors::ScanError;

/// Join `relative` onto `repo`, rejecting anything that could escape it.
pub fn resolve_in_worktree(repo: &Path, relative: &str) -> Result<PathBuf, ScanError> {
    let rel = Path::new(relative);
    if relative.is_empty() || rel.is_absolute() {
        return Err(ScanError::PathOutsideWorktree(relative.to_string()));
    }
    for component in rel.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ScanError::PathOutsideWorktree(relative.to_string()));
            }
        }
    }
    Ok(repo.join(rel))
}

/// Read a working-tree file as text. Invalid UTF-8 is replaced, not rejected.
pub async fn read_text(repo: &Path, relative: &str) -> Result<String, ScanError> {
    let path = resolve_in_worktree(repo, relative)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| ScanError::ReadFailed {
            path: relative.to_string(),
            source,
        })?;
    debug!(path = relative, bytes = bytes.len(), "read working tree file");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Overwrite a working-tree file with `content`.
pub async fn write_text(repo: &Path, relative: &str, content: &str) -> Result<(), ScanError> {
    let path = resolve_in_worktree(repo, relative)?;
    tokio::fs::write(&path, content)
        .await
        .map_err(|source| ScanError::WriteFailed {
            path: relative.to_string(),
            source,
        })?;
    debug!(path = relative, bytes = content.len(), "wrote working tree file");
    Ok(())
}
