//! `conflictpilot preview`: start the rebase and save proposals for review.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use conflictpilot_core::models::ConflictPreviewResult;
use conflictpilot_core::ResolutionEngine;

use super::style;

pub async fn run(engine: &ResolutionEngine, repo: &Path, target: &str, out: &Path) -> Result<()> {
    let spinner = super::spinner(format!("Rebasing onto {target} and resolving conflicts..."));
    let result = engine.generate_resolution_previews(repo, target).await;
    spinner.finish_and_clear();
    let result = result.context("preview generation failed")?;

    if result.is_clean() {
        if let Some(detail) = &result.rebase_start_error {
            println!("{}", style::warn("Rebase stopped but no conflicted files were found:"));
            println!("  {}", style::dim(detail));
            println!("Inspect the repository, then run `conflictpilot abort` if needed.");
            return Ok(());
        }
        println!(
            "{}",
            style::success(&format!("Rebased {} onto {} with no conflicts", result.current_branch, target))
        );
        return Ok(());
    }

    result
        .save_json(out)
        .with_context(|| format!("failed to save previews to {}", out.display()))?;

    print_summary(&result);
    println!();
    println!("Proposals saved to {}", out.display());
    println!("Next: conflictpilot review --file {}", out.display());
    Ok(())
}

pub fn print_summary(result: &ConflictPreviewResult) {
    println!();
    println!(
        "{}",
        style::header(&format!(
            "Conflicts rebasing {} onto {} ({})",
            result.current_branch, result.target_branch, result.total_conflicts
        ))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Language", "Status", "Type", "Strategy", "Complexity"]);

    for preview in &result.previews {
        let (kind, strategy, complexity) = match &preview.analysis {
            Some(a) => (
                a.conflict_type.to_string(),
                a.recommended_strategy.to_string(),
                a.complexity.to_string(),
            ),
            None => ("—".into(), "—".into(), "—".into()),
        };
        table.add_row(vec![
            Cell::new(&preview.file),
            Cell::new(&preview.language),
            Cell::new(style::status_label(&preview.status.to_string())),
            Cell::new(kind),
            Cell::new(strategy),
            Cell::new(complexity),
        ]);
    }
    println!("{}", table);

    println!(
        "  Resolved by AI: {}   Need manual resolution: {}",
        result.resolved_by_ai, result.failed_to_resolve
    );
}
