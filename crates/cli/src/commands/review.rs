//! `conflictpilot review`: adjudicate saved proposals one file at a time.

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{Editor, Select};

use conflictpilot_core::conflict::{count_conflict_hunks, has_conflict_markers};
use conflictpilot_core::models::{ConflictPreviewResult, ConflictResolutionPreview, PreviewStatus};

use super::style;

const CHOICES: &[&str] = &["Approve", "Reject", "Edit", "Skip for now"];

pub fn run(file: &Path) -> Result<()> {
    let mut result = ConflictPreviewResult::load_json(file)
        .with_context(|| format!("failed to load previews from {}", file.display()))?;

    let total = result.previews.len();
    for index in 0..total {
        let preview = &mut result.previews[index];
        if preview.status != PreviewStatus::Pending {
            continue;
        }
        show(preview, index + 1, total);
        decide(preview)?;
        // Persist after every decision so an interrupted review keeps its progress.
        result
            .save_json(file)
            .with_context(|| format!("failed to save previews to {}", file.display()))?;
    }

    super::preview::print_summary(&result);
    println!();
    println!("Next: conflictpilot apply --file {}", file.display());
    Ok(())
}

fn show(preview: &ConflictResolutionPreview, index: usize, total: usize) {
    println!();
    println!(
        "{}",
        style::header(&format!("[{index}/{total}] {} ({})", preview.file, preview.language))
    );
    let hunks = count_conflict_hunks(&preview.original_content);
    if hunks > 0 {
        println!("  {}", style::dim(&format!("{hunks} conflict hunk(s)")));
    }
    if let Some(analysis) = &preview.analysis {
        println!("  Current : {}", analysis.current_branch_intent);
        println!("  Incoming: {}", analysis.incoming_branch_intent);
        println!(
            "  {} conflict, suggest {} ({})",
            analysis.conflict_type, analysis.recommended_strategy, analysis.complexity
        );
        if !analysis.explanation.is_empty() {
            println!("  {}", style::dim(&analysis.explanation));
        }
    }
    if has_conflict_markers(&preview.proposed_content) {
        println!(
            "{}",
            style::warn("The model could not resolve this file. Edit it or reject it.")
        );
    }
    println!();
    println!("{}", style::diff(&preview.unified_diff()));
}

fn decide(preview: &mut ConflictResolutionPreview) -> Result<()> {
    loop {
        let choice = Select::new()
            .with_prompt("Decision")
            .items(CHOICES)
            .default(0)
            .interact()
            .context("failed to read decision")?;

        match choice {
            0 if has_conflict_markers(preview.effective_content()) => {
                println!("{}", style::error("Cannot approve content that still has conflict markers."));
            }
            0 => {
                preview.approve();
                return Ok(());
            }
            1 => {
                preview.reject();
                return Ok(());
            }
            2 => {
                let edited = Editor::new()
                    .extension(&extension(&preview.file))
                    .edit(preview.effective_content())
                    .context("failed to open editor")?;
                match edited {
                    Some(content) => {
                        preview.modify(content);
                        if has_conflict_markers(preview.effective_content()) {
                            println!("{}", style::warn("Edited content still has conflict markers; apply will refuse it."));
                        }
                        return Ok(());
                    }
                    None => println!("{}", style::dim("Edit discarded.")),
                }
            }
            _ => return Ok(()),
        }
    }
}

fn extension(file: &str) -> String {
    Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".txt".into())
}
