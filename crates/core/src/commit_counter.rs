//! Counting a user's commits across the repositories they touched.
//!
//! The [`CommitCounter`] drives the whole run:
//!
//! 1. Discover repositories through a [`ProfileRepositoryProvider`].
//! 2. Create one scratch directory for the run.
//! 3. For each repository in turn: clone, resolve the mainline branch and
//!    count the commits whose signature matches the [`AuthorMatcher`].
//! 4. Collect a [`RepositoryOutcome`] per repository and sum them.
//!
//! Discovery failures abort the run. A failure inside step 3 only turns that
//! repository into a skipped outcome.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::errors::{ConfigError, CoreError, GitError};
use crate::git::history::{CommitSignatures, GitHistoryGateway};
use crate::github::search::ProfileRepositoryProvider;
use crate::models::{AuthorQuery, CommitSignature, CountReport, DaysRange, RepositoryOutcome};
use crate::progress::{NoProgress, ProgressEvent, ProgressSink};
use crate::repository_name::RepositoryName;

const WORKSPACE_PREFIX: &str = "contriboo-";

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Decides whether a commit belongs to the queried person.
///
/// Email and username are compared trimmed and lower-cased. A commit matches
/// when the email equals the author or committer email, or else when the
/// username equals the author or committer name. Either check may match on
/// its own; a commit is counted at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorMatcher {
    username: Option<String>,
    email: Option<String>,
}

impl AuthorMatcher {
    pub fn new(username: Option<&str>, email: Option<&str>) -> Self {
        Self {
            username: username.and_then(normalize),
            email: email.and_then(normalize),
        }
    }

    pub fn from_query(query: &AuthorQuery) -> Self {
        Self::new(Some(&query.username), query.email.as_deref())
    }

    pub fn matches(&self, signature: &CommitSignature) -> bool {
        if let Some(email) = &self.email {
            if same(&signature.author_email, email) || same(&signature.committer_email, email) {
                return true;
            }
        }
        if let Some(username) = &self.username {
            if same(&signature.author_name, username) || same(&signature.committer_name, username)
            {
                return true;
            }
        }
        false
    }
}

fn normalize(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

fn same(field: &str, normalized: &str) -> bool {
    field.trim().to_lowercase() == normalized
}

/// Drain `signatures`, counting the ones `matcher` accepts.
pub async fn count_matching(
    signatures: &mut CommitSignatures,
    matcher: &AuthorMatcher,
) -> Result<u64, GitError> {
    let mut total = 0u64;
    while let Some(signature) = signatures.next().await? {
        if matcher.matches(&signature) {
            total += 1;
        }
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Sequential discovery-then-scan pipeline over two capabilities.
#[derive(Debug, Clone)]
pub struct CommitCounter<P, G> {
    provider: P,
    history: G,
    workspace_dir: Option<PathBuf>,
}

impl<P, G> CommitCounter<P, G>
where
    P: ProfileRepositoryProvider,
    G: GitHistoryGateway,
{
    pub fn new(provider: P, history: G) -> Self {
        Self {
            provider,
            history,
            workspace_dir: None,
        }
    }

    /// Create the per-run scratch directory under `dir` instead of the
    /// system temp directory.
    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(dir.into());
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn history(&self) -> &G {
        &self.history
    }

    /// Repositories with commit activity by `username` in the window.
    pub async fn discover(&self, username: &str, days: DaysRange) -> Result<Vec<String>, CoreError> {
        let username = require_username(username)?;
        Ok(self
            .provider
            .find_repositories_for_author(username, days)
            .await?)
    }

    /// Total matching commits across all discovered repositories.
    pub async fn total_commits(&self, query: &AuthorQuery, days: DaysRange) -> Result<u64, CoreError> {
        Ok(self.count_report(query, days, &NoProgress).await?.total())
    }

    /// Per-repository outcomes of a full run.
    #[instrument(skip(self, progress), fields(username = %query.username))]
    pub async fn count_report(
        &self,
        query: &AuthorQuery,
        days: DaysRange,
        progress: &dyn ProgressSink,
    ) -> Result<CountReport, CoreError> {
        let repositories = self.discover(&query.username, days).await?;
        progress.on_event(&ProgressEvent::Discovered {
            count: repositories.len(),
        });
        if repositories.is_empty() {
            info!("no repositories discovered");
            return Ok(CountReport::default());
        }

        let workspace = self.create_workspace()?;
        let matcher = AuthorMatcher::from_query(query);
        let total = repositories.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, repository) in repositories.iter().enumerate() {
            let index = i + 1;
            progress.on_event(&ProgressEvent::Cloning {
                index,
                total,
                repository,
            });

            let outcome = match self
                .count_repository(repository, &matcher, workspace.path())
                .await
            {
                Ok(commits) => {
                    debug!(%repository, commits, "repository counted");
                    progress.on_event(&ProgressEvent::Counted {
                        index,
                        total,
                        repository,
                        commits,
                    });
                    RepositoryOutcome::Counted {
                        repository: repository.clone(),
                        commits,
                    }
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(%repository, %reason, "skipping repository");
                    progress.on_event(&ProgressEvent::Skipped {
                        index,
                        total,
                        repository,
                        reason: &reason,
                    });
                    RepositoryOutcome::Skipped {
                        repository: repository.clone(),
                        reason,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = CountReport { outcomes };
        info!(
            total = report.total(),
            repositories = total,
            skipped = report.skipped().count(),
            "count complete"
        );

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            debug!(path = %path.display(), error = %e, "failed to remove workspace");
        }
        Ok(report)
    }

    /// Clone one repository into `workspace` and count its matching commits.
    /// A repository without `main` or `master` counts zero.
    pub async fn count_repository(
        &self,
        full_name: &str,
        matcher: &AuthorMatcher,
        workspace: &Path,
    ) -> Result<u64, CoreError> {
        let repo = RepositoryName::parse(full_name)?;
        let repo_dir = self.history.clone_repository(&repo, workspace).await?;

        let Some(branch) = self.history.resolve_mainline_branch(&repo_dir).await? else {
            debug!(%repo, "no mainline branch, counting zero");
            return Ok(0);
        };

        let mut signatures = self.history.commit_signatures(&repo_dir, &branch).await?;
        Ok(count_matching(&mut signatures, matcher).await?)
    }

    fn create_workspace(&self) -> Result<TempDir, CoreError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let workspace = match &self.workspace_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(CoreError::Workspace)?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
        .map_err(CoreError::Workspace)?;
        debug!(path = %workspace.path().display(), "created workspace");
        Ok(workspace)
    }
}

fn require_username(username: &str) -> Result<&str, ConfigError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "username".into(),
            detail: "username must not be empty".into(),
        });
    }
    Ok(username)
}
