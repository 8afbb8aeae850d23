//! High-level entry points.
//!
//! [`ContribooClient`] wires the production search provider and git gateway
//! from one [`ContribooSettings`] value, or wraps an injected counter.
//! [`get_total_commits_count`] is the one-call convenience on top of it.

use tracing::info;

use crate::commit_counter::CommitCounter;
use crate::config::ContribooSettings;
use crate::errors::CoreError;
use crate::git::history::SubprocessGitHistoryGateway;
use crate::github::search::GitHubSearchProvider;
use crate::models::{AuthorQuery, DaysRange};
use crate::progress::{NoProgress, ProgressSink, StdoutProgress};

/// Counter wired with the GitHub search API and the `git` executable.
pub type DefaultCommitCounter = CommitCounter<GitHubSearchProvider, SubprocessGitHistoryGateway>;

/// Entry point bundling the profile (commit counting) service.
#[derive(Debug, Clone)]
pub struct ContribooClient<P = GitHubSearchProvider, G = SubprocessGitHistoryGateway> {
    profile: CommitCounter<P, G>,
}

impl ContribooClient {
    /// Build the default service from `settings`.
    pub fn new(settings: &ContribooSettings) -> Result<Self, CoreError> {
        let provider = GitHubSearchProvider::from_settings(settings)?;
        let history = SubprocessGitHistoryGateway::from_settings(settings);
        let mut profile = CommitCounter::new(provider, history);
        if let Some(dir) = settings.workspace_dir() {
            profile = profile.with_workspace_dir(dir);
        }
        info!("created contriboo client");
        Ok(Self { profile })
    }
}

impl<P, G> ContribooClient<P, G> {
    /// Use an already assembled service, e.g. one built on test doubles.
    pub fn with_profile_service(profile: CommitCounter<P, G>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &CommitCounter<P, G> {
        &self.profile
    }
}

/// Count commits by `username` / `email` in repositories active within
/// `days`, using default settings plus the given token and git timeout.
///
/// With `show_progress`, one line per repository is printed to stdout.
pub async fn get_total_commits_count(
    username: &str,
    email: Option<&str>,
    days: DaysRange,
    token: Option<String>,
    show_progress: bool,
    git_timeout_sec: Option<u64>,
) -> Result<u64, CoreError> {
    let mut builder = ContribooSettings::builder().token(token);
    if let Some(secs) = git_timeout_sec {
        builder = builder.git_timeout_sec(secs);
    }
    let settings = builder.build()?;
    let client = ContribooClient::new(&settings)?;

    let mut query = AuthorQuery::new(username);
    if let Some(email) = email {
        query = query.with_email(email);
    }

    let progress: &dyn ProgressSink = if show_progress {
        &StdoutProgress
    } else {
        &NoProgress
    };
    let report = client.profile().count_report(&query, days, progress).await?;
    Ok(report.total())
}
