//! Subcommand implementations that drive the resolution engine.

pub mod apply;
pub mod auto;
pub mod preview;
pub mod review;
pub mod status;
pub mod style;

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use conflictpilot_core::config::AppConfig;
use conflictpilot_core::ResolutionEngine;

pub fn build_engine(config: &AppConfig) -> Result<ResolutionEngine> {
    ResolutionEngine::from_config(config).context("failed to initialise resolution engine")
}

/// Steady-ticking spinner for long engine calls.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(
            template.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
