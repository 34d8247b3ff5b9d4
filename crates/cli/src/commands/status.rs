//! `conflictpilot status` and `conflictpilot abort`.

use std::path::Path;

use anyhow::{Context, Result};

use conflictpilot_core::ResolutionEngine;

use super::style;

pub async fn run_status(engine: &ResolutionEngine, repo: &Path, json: bool) -> Result<()> {
    let status = engine.status(repo).await;

    if json {
        let out = serde_json::to_string_pretty(&status).context("failed to serialize status")?;
        println!("{out}");
        return Ok(());
    }

    println!("{}", style::header("Repository Status"));
    println!();
    println!("  Repository : {}", repo.display());
    println!(
        "  Branch     : {}",
        status.current_branch.as_deref().unwrap_or("(detached)")
    );
    println!(
        "  Rebase     : {}",
        if status.rebase_in_progress {
            "in progress"
        } else {
            "none"
        }
    );
    if status.conflicted_files.is_empty() {
        println!("  Conflicts  : none");
    } else {
        println!("  Conflicts  : {}", status.conflicted_files.len());
        for file in &status.conflicted_files {
            println!("    {}", file);
        }
    }
    Ok(())
}

pub async fn run_abort(engine: &ResolutionEngine, repo: &Path) -> Result<()> {
    let was_active = engine.is_rebase_in_progress(repo).await;
    engine
        .abort_rebase(repo)
        .await
        .context("failed to abort rebase")?;

    if was_active {
        println!("{}", style::success("Rebase aborted; branch restored."));
    } else {
        println!("{}", style::dim("No rebase in progress."));
    }
    Ok(())
}
