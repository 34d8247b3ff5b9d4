//! ConflictPilot command-line tool.
//!
//! Rebases a branch onto a target, asks the inference service to resolve
//! each conflict, and lets a human review the proposals before anything is
//! written. Also provides an unattended `auto` mode and helpers to inspect
//! or abort a rebase.

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use conflictpilot_core::config::{AppConfig, DEFAULT_CONFIG_TOML};

use commands::style;

/// Default location of the saved preview set between `preview` and `apply`.
const DEFAULT_PREVIEW_FILE: &str = "conflictpilot-previews.json";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// ConflictPilot command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "conflictpilot",
    version,
    about = "Rebase with AI-proposed conflict resolutions and human review"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "~/.config/conflictpilot/config.toml"
    )]
    config: String,

    /// Log at debug level (overrides the configured level; RUST_LOG wins).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./conflictpilot.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,

    /// Start a rebase and propose a resolution for every conflicted file.
    Preview {
        /// Branch on the remote to rebase onto.
        target: String,

        /// Repository working tree.
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Where to save the proposals for `review` and `apply`.
        #[arg(short, long, default_value = DEFAULT_PREVIEW_FILE)]
        out: PathBuf,
    },

    /// Approve, reject or edit saved proposals interactively.
    Review {
        /// Saved proposals.
        #[arg(short, long, default_value = DEFAULT_PREVIEW_FILE)]
        file: PathBuf,
    },

    /// Write approved proposals, stage them and continue the rebase.
    Apply {
        /// Saved proposals.
        #[arg(short, long, default_value = DEFAULT_PREVIEW_FILE)]
        file: PathBuf,

        /// Repository working tree (defaults to the one recorded in the file).
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },

    /// Rebase and resolve every conflict without review.
    Auto {
        /// Branch on the remote to rebase onto.
        target: String,

        /// Repository working tree.
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Resolution passes before giving up (defaults to the configured value).
        #[arg(long)]
        max_retries: Option<u32>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Abort the in-progress rebase.
    Abort {
        /// Repository working tree.
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,
    },

    /// Show the repository's rebase and conflict state.
    Status {
        /// Repository working tree.
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = expand_tilde(&cli.config);

    match cli.command {
        Commands::Init { output } => {
            init_logging("warn", cli.verbose);
            cmd_init(&output)
        }
        Commands::Validate => {
            init_logging("warn", cli.verbose);
            cmd_validate(&config_path)
        }
        Commands::Review { file } => {
            init_logging("warn", cli.verbose);
            commands::review::run(&file)
        }
        command => {
            let config = load_config(&config_path)?;
            init_logging(&config.log.level, cli.verbose);
            let engine = commands::build_engine(&config)?;

            match command {
                Commands::Preview { target, repo, out } => {
                    commands::preview::run(&engine, &repo, &target, &out).await
                }
                Commands::Apply { file, repo } => {
                    commands::apply::run(&engine, &file, repo.as_deref()).await
                }
                Commands::Auto {
                    target,
                    repo,
                    max_retries,
                    yes,
                } => commands::auto::run(&engine, &repo, &target, max_retries, yes).await,
                Commands::Abort { repo } => commands::status::run_abort(&engine, &repo).await,
                Commands::Status { repo, json } => {
                    commands::status::run_status(&engine, &repo, json).await
                }
                Commands::Init { .. } | Commands::Validate | Commands::Review { .. } => {
                    unreachable!("handled above")
                }
            }
        }
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug, else `level`.
fn init_logging(level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { level })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load, resolve and validate the config. A missing file falls back to the
/// built-in defaults.
fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = if path.exists() {
        AppConfig::load_from_file(path).context("failed to load configuration file")?
    } else {
        AppConfig::default()
    };
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        let overwrite = dialoguer::Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", output.display()))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !overwrite {
            println!("{}", style::warn("Init cancelled. Existing file was not modified."));
            return Ok(());
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    std::fs::write(output, DEFAULT_CONFIG_TOML).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Point [inference].endpoint at your inference service");
    println!("  2. Set api_key_env and export that variable if the service needs a token");
    println!(
        "  3. Validate with: conflictpilot validate --config {}",
        output.display()
    );
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    let _ = config.resolve_env_vars();
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Git executable : {}", config.git.executable);
    println!("  Remote         : {}", config.git.remote);
    println!("  Git timeout    : {}s", config.git.command_timeout_secs);
    println!("  Endpoint       : {}", config.inference.endpoint);
    println!("  Mode           : {}", config.inference.mode_id);
    println!(
        "  API key        : {}",
        match (&config.inference.api_key_env, &config.inference.api_key) {
            (None, _) => "not configured",
            (Some(_), Some(_)) => "set",
            (Some(_), None) => "NOT SET",
        }
    );
    println!("  Model timeout  : {}s", config.inference.timeout_secs);
    println!("  Auto retries   : {}", config.rebase.max_retries);
    println!();
    println!("{}", style::success("Configuration is valid."));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_preview() {
        let cli = Cli::try_parse_from(["conflictpilot", "preview", "main", "--repo", "/tmp/w"]).unwrap();
        match cli.command {
            Commands::Preview { target, repo, out } => {
                assert_eq!(target, "main");
                assert_eq!(repo, PathBuf::from("/tmp/w"));
                assert_eq!(out, PathBuf::from(DEFAULT_PREVIEW_FILE));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_auto_flags() {
        let cli = Cli::try_parse_from(["conflictpilot", "auto", "develop", "--max-retries", "5", "-y"]).unwrap();
        match cli.command {
            Commands::Auto { target, max_retries, yes, .. } => {
                assert_eq!(target, "develop");
                assert_eq!(max_retries, Some(5));
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/etc/cp.toml"), PathBuf::from("/etc/cp.toml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x.toml"), home.join("x.toml"));
        }
    }

    #[test]
    fn test_load_config_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.rebase.max_retries, 3);
    }

    #[test]
    fn test_init_writes_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/conflictpilot.toml");
        cmd_init(&path).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.inference.mode_id, "merge_conflict_resolver");
    }
}
