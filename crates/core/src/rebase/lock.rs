//! Per-repository exclusion for rebase-mutating workflows.
//!
//! At most one workflow may drive a rebase in a given repository at a time.
//! A second attempt fails fast with [`WorkflowError::RepositoryBusy`] rather
//! than queueing behind the first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::errors::WorkflowError;

/// Registry of busy flags keyed by canonical repository path.
#[derive(Debug, Clone, Default)]
pub struct RepoLocks {
    flags: Arc<Mutex<HashMap<PathBuf, Arc<AtomicBool>>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `repo`, or fail if another workflow holds it.
    ///
    /// The claim is released when the returned lease is dropped.
    pub fn try_acquire(&self, repo: &Path) -> Result<RepoLease, WorkflowError> {
        let key = std::fs::canonicalize(repo).unwrap_or_else(|_| repo.to_path_buf());
        let flag = {
            let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
            flags
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                .clone()
        };

        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkflowError::RepositoryBusy(key.display().to_string()));
        }
        debug!(repo = %key.display(), "acquired repository lock");
        Ok(RepoLease { flag, repo: key })
    }

}

/// Drop guard that releases a repository claim, even on panic.
#[derive(Debug)]
pub struct RepoLease {
    flag: Arc<AtomicBool>,
    repo: PathBuf,
}

impl Drop for RepoLease {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        debug!(repo = %self.repo.display(), "released repository lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let locks = RepoLocks::new();

        let lease = locks.try_acquire(dir.path()).unwrap();
        let err = locks.try_acquire(dir.path()).unwrap_err();
        assert!(matches!(err, WorkflowError::RepositoryBusy(_)));

        drop(lease);
        assert!(locks.try_acquire(dir.path()).is_ok());
    }

    #[test]
    fn test_equivalent_paths_share_a_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let locks = RepoLocks::new();

        let _lease = locks.try_acquire(dir.path()).unwrap();
        let dotted = dir.path().join("sub").join("..");
        assert!(locks.try_acquire(&dotted).is_err());
    }

    #[test]
    fn test_distinct_repos_do_not_block() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let locks = RepoLocks::new();

        let _la = locks.try_acquire(a.path()).unwrap();
        let _lb = locks.try_acquire(b.path()).unwrap();
    }

    #[test]
    fn test_clones_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let locks = RepoLocks::new();
        let other = locks.clone();

        let _lease = locks.try_acquire(dir.path()).unwrap();
        assert!(other.try_acquire(dir.path()).is_err());
    }
}
