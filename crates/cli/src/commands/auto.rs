//! `conflictpilot auto`: unattended rebase with automatic resolution.

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Confirm;

use conflictpilot_core::ResolutionEngine;

use super::style;

pub async fn run(
    engine: &ResolutionEngine,
    repo: &Path,
    target: &str,
    max_retries: Option<u32>,
    yes: bool,
) -> Result<()> {
    if !yes {
        println!(
            "{}",
            style::warn("Automatic mode commits model output without review.")
        );
        let proceed = Confirm::new()
            .with_prompt(format!("Rebase {} onto {target} automatically?", repo.display()))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !proceed {
            println!("Cancelled. Use `conflictpilot preview {target}` to review changes first.");
            return Ok(());
        }
    }

    let spinner = super::spinner(format!("Rebasing onto {target}..."));
    let result = engine.rebase_with_resolution(repo, target, max_retries).await;
    spinner.finish_and_clear();
    let result = result.context("automatic rebase failed")?;

    for resolution in &result.resolutions {
        match &resolution.error {
            None => println!("{}", style::success(&resolution.file)),
            Some(error) => {
                println!("{}", style::error(&format!("{}: {}", resolution.file, error)));
                if let Some(analysis) = &resolution.analysis {
                    println!(
                        "  {}",
                        style::dim(&format!(
                            "{} conflict, suggest {}: {}",
                            analysis.conflict_type, analysis.recommended_strategy, analysis.explanation
                        ))
                    );
                }
            }
        }
    }
    println!();
    println!(
        "Resolved: {}   Failed: {}",
        result.conflicts_resolved, result.conflicts_failed
    );

    if result.success {
        println!("{}", style::success(&result.message));
        Ok(())
    } else {
        anyhow::bail!("{}", result.message)
    }
}
