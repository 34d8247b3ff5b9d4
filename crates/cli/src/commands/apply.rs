//! `conflictpilot apply`: write the approved proposals and continue.

use std::path::Path;

use anyhow::{Context, Result};

use conflictpilot_core::models::ConflictPreviewResult;
use conflictpilot_core::ResolutionEngine;

use super::style;

pub async fn run(engine: &ResolutionEngine, file: &Path, repo: Option<&Path>) -> Result<()> {
    let saved = ConflictPreviewResult::load_json(file)
        .with_context(|| format!("failed to load previews from {}", file.display()))?;
    let repo = repo.unwrap_or(saved.repo_path.as_path());

    let result = engine
        .apply_approved_resolutions(repo, &saved.previews)
        .await
        .context("applying resolutions failed")?;

    for path in &result.applied {
        println!("{}", style::success(path));
    }
    for path in &result.skipped {
        println!("  {} {}", style::dim("skipped"), path);
    }
    for failure in &result.failed {
        println!("{}", style::error(&format!("{}: {}", failure.file, failure.error)));
    }
    println!();
    println!("{}", result.message);

    if !result.success {
        anyhow::bail!("{} resolution(s) could not be applied", result.failed.len());
    }

    let status = engine.status(repo).await;
    if status.rebase_in_progress {
        println!();
        println!("{}", style::warn("The rebase stopped again."));
        println!(
            "Run `conflictpilot status --repo {}` and resolve the remaining files, or `conflictpilot abort`.",
            repo.display()
        );
    } else {
        println!("{}", style::success("Rebase complete."));
    }
    Ok(())
}
