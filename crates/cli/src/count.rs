//! `count` and `repos` subcommands.

use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use contriboo_core::progress::{NoProgress, ProgressEvent, ProgressSink};
use contriboo_core::{
    AuthorQuery, ContribooClient, ContribooSettings, CountReport, DaysRange, RepositoryOutcome,
};

use crate::style;
use crate::{CountArgs, ReposArgs};

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub async fn cmd_count(settings: &ContribooSettings, args: &CountArgs) -> Result<()> {
    let client = ContribooClient::new(settings).context("failed to set up client")?;

    let mut query = AuthorQuery::new(args.username.as_str());
    if let Some(email) = &args.email {
        query = query.with_email(email.as_str());
    }

    let report = if args.progress {
        let sink = BarProgress::new();
        let result = client.profile().count_report(&query, args.days, &sink).await;
        sink.finish();
        result
    } else {
        client
            .profile()
            .count_report(&query, args.days, &NoProgress)
            .await
    }
    .context("failed to count commits")?;

    if args.json {
        let value = serde_json::json!({
            "username": query.username,
            "email": query.email,
            "days": args.days.to_string(),
            "total": report.total(),
            "outcomes": report.outcomes,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("failed to render JSON")?
        );
        return Ok(());
    }

    println!("Total commits: {} ({})", report.total(), window_label(args.days));

    let skipped = report.skipped().count();
    if skipped > 0 {
        println!(
            "{}",
            style::warn(&format!(
                "{} of {} repositories skipped",
                skipped,
                report.outcomes.len()
            ))
        );
    }

    if args.report && !report.outcomes.is_empty() {
        println!();
        println!("{}", report_table(&report));
    }

    Ok(())
}

pub async fn cmd_repos(settings: &ContribooSettings, args: &ReposArgs) -> Result<()> {
    let client = ContribooClient::new(settings).context("failed to set up client")?;

    let spinner = spinner(&format!("Searching commits by {}...", args.username));
    let result = client.profile().discover(&args.username, args.days).await;
    spinner.finish_and_clear();
    let repositories = result.context("repository discovery failed")?;

    if repositories.is_empty() {
        println!(
            "No repositories found for {} ({}).",
            args.username,
            window_label(args.days)
        );
        return Ok(());
    }

    println!(
        "{}",
        style::header(&format!(
            "{} repositories ({})",
            repositories.len(),
            window_label(args.days)
        ))
    );
    for name in &repositories {
        println!("  {}", name);
    }
    Ok(())
}

fn window_label(days: DaysRange) -> String {
    match days {
        DaysRange::All => "all time".to_string(),
        DaysRange::Days(n) => format!("last {} days", n),
    }
}

fn report_table(report: &CountReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Repository", "Commits", "Note"]);

    for outcome in &report.outcomes {
        match outcome {
            RepositoryOutcome::Counted {
                repository,
                commits,
            } => {
                let count = Cell::new(commits);
                table.add_row(vec![
                    Cell::new(repository),
                    if *commits > 0 {
                        count.fg(Color::Green)
                    } else {
                        count
                    },
                    Cell::new(""),
                ]);
            }
            RepositoryOutcome::Skipped { repository, reason } => {
                table.add_row(vec![
                    Cell::new(repository),
                    Cell::new("-").fg(Color::Yellow),
                    Cell::new(reason).fg(Color::Yellow),
                ]);
            }
        }
    }
    table
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        bar.set_style(style.tick_strings(SPINNER_TICKS));
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

// ---------------------------------------------------------------------------
// Progress bar sink
// ---------------------------------------------------------------------------

/// Spinner while discovery runs, then a bar over the repositories with one
/// printed line per finished repository.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        Self {
            bar: spinner("Searching commits..."),
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarProgress {
    fn on_event(&self, event: &ProgressEvent<'_>) {
        match event {
            ProgressEvent::Discovered { count } => {
                self.bar.set_length(*count as u64);
                if let Ok(style) =
                    ProgressStyle::with_template("{spinner:.blue} [{pos}/{len}] {wide_msg}")
                {
                    self.bar.set_style(style.tick_strings(SPINNER_TICKS));
                }
                self.bar
                    .println(style::dim(&format!("found {} repositories", count)));
            }
            ProgressEvent::Cloning { repository, .. } => {
                self.bar.set_message(format!("cloning {}", repository));
            }
            ProgressEvent::Counted {
                index,
                total,
                repository,
                commits,
            } => {
                self.bar.inc(1);
                self.bar.println(format!(
                    "{} {} {}",
                    style::dim(&format!("[{}/{}]", index, total)),
                    repository,
                    style::commits(*commits)
                ));
            }
            ProgressEvent::Skipped {
                index,
                total,
                repository,
                reason,
            } => {
                self.bar.inc(1);
                self.bar.println(format!(
                    "{} {}",
                    style::dim(&format!("[{}/{}]", index, total)),
                    style::warn(&format!("skip {}: {}", repository, reason))
                ));
            }
        }
    }
}
