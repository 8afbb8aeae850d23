//! contriboo CLI.
//!
//! Counts the commits a GitHub user made across the repositories they were
//! active in, and manages the optional settings file.

mod count;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use contriboo_core::config::SettingsBuilder;
use contriboo_core::{ContribooSettings, DaysRange};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "contriboo",
    about = "Count a GitHub user's commits across the repositories they touched",
    version
)]
struct Cli {
    /// Path to the settings file. Defaults to ~/.config/contriboo/config.toml
    /// when that file exists.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count matching commits across the user's recent repositories
    Count(CountArgs),

    /// List the repositories discovery finds, without cloning anything
    Repos(ReposArgs),

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct CountArgs {
    /// GitHub username to count commits for
    #[arg(short, long)]
    username: String,

    /// Commit email to match in addition to the username
    #[arg(short, long)]
    email: Option<String>,

    /// Look-back window in days, or "all"
    #[arg(short, long, default_value = "all")]
    days: DaysRange,

    /// GitHub token (falls back to the variable named by token_env)
    #[arg(long)]
    token: Option<String>,

    /// Time bound for each git command in seconds
    #[arg(long)]
    git_timeout: Option<u64>,

    /// Show per-repository progress while counting
    #[arg(long)]
    progress: bool,

    /// Print a per-repository table after the total
    #[arg(long)]
    report: bool,

    /// Print the report as JSON instead of text
    #[arg(long, conflicts_with = "report")]
    json: bool,
}

#[derive(Args, Debug)]
struct ReposArgs {
    /// GitHub username to search commits for
    #[arg(short, long)]
    username: String,

    /// Look-back window in days, or "all"
    #[arg(short, long, default_value = "all")]
    days: DaysRange,

    /// GitHub token (falls back to the variable named by token_env)
    #[arg(long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a settings file with every default spelled out
    Init {
        /// Output path (defaults to --config or the default location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check the settings file parses and every value is in range
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cli.verbose))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Count(args) => {
            let settings = load_settings(cli.config.as_deref(), |builder| {
                let builder = with_token(builder, args.token.clone());
                match args.git_timeout {
                    Some(secs) => builder.git_timeout_sec(secs),
                    None => builder,
                }
            })?;
            count::cmd_count(&settings, &args).await
        }
        Commands::Repos(args) => {
            let settings = load_settings(cli.config.as_deref(), |builder| {
                with_token(builder, args.token.clone())
            })?;
            count::cmd_repos(&settings, &args).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { output } => {
                let path = match output.or(cli.config) {
                    Some(path) => path,
                    None => default_config_path()
                        .context("could not determine the user config directory")?,
                };
                cmd_config_init(&path)
            }
            ConfigAction::Validate => {
                let path = match cli.config {
                    Some(path) => path,
                    None => default_config_path()
                        .context("could not determine the user config directory")?,
                };
                cmd_config_validate(&path)
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn env_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("contriboo").join("config.toml"))
}

fn with_token(builder: SettingsBuilder, token: Option<String>) -> SettingsBuilder {
    match token {
        Some(token) => builder.token(Some(token)),
        None => builder,
    }
}

/// Load settings from `explicit`, else the default file if it exists, else
/// defaults. Command-line overrides are applied before the token variable is
/// consulted so that `--token` wins.
fn load_settings(
    explicit: Option<&Path>,
    overrides: impl FnOnce(SettingsBuilder) -> SettingsBuilder,
) -> Result<ContribooSettings> {
    let base = match explicit {
        Some(path) => ContribooSettings::load_from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => ContribooSettings::load_from_file(&path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => {
                debug!("no settings file, using defaults");
                ContribooSettings::default()
            }
        },
    };

    let mut settings = overrides(SettingsBuilder::from(base))
        .build()
        .context("invalid settings")?;
    settings.resolve_env_vars();
    Ok(settings)
}

// ---------------------------------------------------------------------------
// config subcommands
// ---------------------------------------------------------------------------

fn cmd_config_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {} (remove it first or choose a different path)",
            output.display()
        );
    }

    let contents = format!(
        "# contriboo settings\n# The token itself is never stored here; set the variable named by token_env.\n\n{}",
        ContribooSettings::default()
            .to_toml()
            .context("failed to render default settings")?
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, contents)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("{}", style::success(&format!("Settings written to {}", output.display())));
    Ok(())
}

fn cmd_config_validate(path: &Path) -> Result<()> {
    println!("Validating settings: {}", path.display());
    println!();

    let mut settings = match ContribooSettings::load_from_file(path) {
        Ok(settings) => settings,
        Err(e) => {
            println!("  [FAIL] {}", e);
            anyhow::bail!("settings validation failed");
        }
    };
    println!("  [OK] TOML structure is valid");
    println!("  [OK] All values are in range");

    settings.resolve_env_vars();

    println!();
    println!("Settings summary:");
    println!("  API URL        : {}", settings.api_url());
    println!(
        "  Git base URL   : {}",
        settings.git_base_url().unwrap_or("(derived from API URL)")
    );
    println!(
        "  Token          : {}",
        if settings.token().is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  HTTP timeout   : {}s", settings.http_timeout().as_secs());
    println!("  HTTP retries   : {}", settings.http_retries());
    println!("  Git timeout    : {}s", settings.git_timeout().as_secs());
    println!("  Search pages   : {}", settings.max_search_pages());
    println!(
        "  Workspace      : {}",
        settings
            .workspace_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(system temp dir)".to_string())
    );
    println!();
    println!("{}", style::success("Settings are valid."));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_count_args() {
        let cli = Cli::try_parse_from([
            "contriboo",
            "count",
            "--username",
            "octocat",
            "--email",
            "octocat@github.com",
            "--days",
            "30",
            "--progress",
        ])
        .unwrap();

        match cli.command {
            Commands::Count(args) => {
                assert_eq!(args.username, "octocat");
                assert_eq!(args.email.as_deref(), Some("octocat@github.com"));
                assert_eq!(args.days, DaysRange::days(30).unwrap());
                assert!(args.progress);
                assert!(!args.report);
            }
            _ => panic!("expected count"),
        }
    }

    #[test]
    fn test_days_default_to_all() {
        let cli = Cli::try_parse_from(["contriboo", "repos", "-u", "octocat"]).unwrap();
        match cli.command {
            Commands::Repos(args) => assert_eq!(args.days, DaysRange::All),
            _ => panic!("expected repos"),
        }
    }

    #[test]
    fn test_zero_days_rejected() {
        assert!(Cli::try_parse_from(["contriboo", "count", "-u", "octocat", "-d", "0"]).is_err());
    }

    #[test]
    fn test_report_and_json_conflict() {
        assert!(Cli::try_parse_from([
            "contriboo", "count", "-u", "octocat", "--report", "--json"
        ])
        .is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "contriboo",
            "config",
            "validate",
            "--config",
            "/tmp/x.toml",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/x.toml")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_load_settings_applies_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "git_timeout_sec = 60\nmax_search_pages = 3\n").unwrap();

        let settings = load_settings(Some(&path), |b| {
            with_token(b, Some("tok".into())).git_timeout_sec(15)
        })
        .unwrap();

        assert_eq!(settings.git_timeout().as_secs(), 15);
        assert_eq!(settings.max_search_pages(), 3);
        assert_eq!(settings.token(), Some("tok"));
    }

    #[test]
    fn test_load_settings_rejects_invalid_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let err = load_settings(Some(&path), |b| b.git_timeout_sec(0)).unwrap_err();
        assert!(format!("{:#}", err).contains("git_timeout_sec"));
    }

    #[test]
    fn test_load_settings_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(Some(&dir.path().join("nope.toml")), |b| b).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load settings"));
    }

    #[test]
    fn test_config_init_then_validate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        cmd_config_init(&path).unwrap();
        assert!(path.exists());
        cmd_config_validate(&path).unwrap();

        // Refuses to overwrite.
        assert!(cmd_config_init(&path).is_err());
    }

    #[test]
    fn test_config_validate_reports_bad_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "http_retries = 0\n").unwrap();
        assert!(cmd_config_validate(&path).is_err());
    }
}
