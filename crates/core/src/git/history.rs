//! Commit history of remote repositories, read through the `git` CLI.
//!
//! Only identity metadata is needed, so repositories are cloned without
//! blobs and without a working tree, and `git log` is read line by line.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, instrument, warn};

use super::remote_url::RemoteBase;
use crate::config::ContribooSettings;
use crate::errors::GitError;
use crate::models::CommitSignature;
use crate::repository_name::RepositoryName;

/// Branches tried, in order, when looking for a repository's mainline.
pub const MAINLINE_CANDIDATES: [&str; 2] = ["main", "master"];

/// `git log` format: author email, author name, committer email, committer
/// name, separated by the ASCII unit separator.
const SIGNATURE_FORMAT: &str = "--pretty=format:%ae%x1f%an%x1f%ce%x1f%cn";

/// Access to the commit history of a repository.
#[allow(async_fn_in_trait)]
pub trait GitHistoryGateway {
    /// Clone `repo` (history only) into a subdirectory of `destination_root`
    /// and return the clone's path.
    async fn clone_repository(
        &self,
        repo: &RepositoryName,
        destination_root: &Path,
    ) -> Result<PathBuf, GitError>;

    /// `main` if `origin/main` exists, else `master` if `origin/master`
    /// exists, else `None`.
    async fn resolve_mainline_branch(&self, repo_dir: &Path) -> Result<Option<String>, GitError>;

    /// Signatures of every commit reachable from `origin/<branch>`.
    async fn commit_signatures(
        &self,
        repo_dir: &Path,
        branch: &str,
    ) -> Result<CommitSignatures, GitError>;
}

// ---------------------------------------------------------------------------
// Signature stream
// ---------------------------------------------------------------------------

/// A finite, single-pass sequence of commit signatures.
///
/// Blank and malformed records are skipped, and bytes that are not UTF-8 are
/// replaced rather than rejected. When backed by a `git log` process, the
/// exit status is checked once its output is exhausted.
pub struct CommitSignatures {
    source: Source,
}

enum Source {
    Process {
        reader: BufReader<ChildStdout>,
        buf: Vec<u8>,
        child: Option<Child>,
    },
    Records(std::vec::IntoIter<String>),
}

impl CommitSignatures {
    /// In-memory sequence over already formatted records.
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records: Vec<String> = records.into_iter().map(Into::into).collect();
        Self {
            source: Source::Records(records.into_iter()),
        }
    }

    fn from_child(mut child: Child) -> Result<Self, GitError> {
        let stdout = child.stdout.take().ok_or_else(|| GitError::CommandFailed {
            message: "git log stdout was not captured".into(),
        })?;
        Ok(Self {
            source: Source::Process {
                reader: BufReader::new(stdout),
                buf: Vec::new(),
                child: Some(child),
            },
        })
    }

    /// Next signature, or `None` once the history is exhausted.
    pub async fn next(&mut self) -> Result<Option<CommitSignature>, GitError> {
        loop {
            let line = match &mut self.source {
                Source::Records(records) => records.next(),
                Source::Process { reader, buf, child } => {
                    buf.clear();
                    if reader.read_until(b'\n', buf).await? == 0 {
                        if let Some(child) = child.take() {
                            finish_log(child).await?;
                        }
                        None
                    } else {
                        Some(decode_line(buf))
                    }
                }
            };

            let Some(line) = line else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            match CommitSignature::parse_record(&line) {
                Some(signature) => return Ok(Some(signature)),
                None => debug!(record = %line, "skipping malformed log record"),
            }
        }
    }
}

/// One `git log` output line without its terminator, lossily decoded.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

async fn finish_log(child: Child) -> Result<(), GitError> {
    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let message = failure_message(&output);
        warn!(%message, "git log failed");
        return Err(GitError::CommandFailed { message });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subprocess implementation
// ---------------------------------------------------------------------------

/// [`GitHistoryGateway`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct SubprocessGitHistoryGateway {
    remote: RemoteBase,
    timeout: Duration,
}

impl SubprocessGitHistoryGateway {
    pub fn new(remote: RemoteBase, timeout: Duration) -> Self {
        info!(remote = %remote.as_str(), timeout_secs = timeout.as_secs(), "created git history gateway");
        Self { remote, timeout }
    }

    pub fn from_settings(settings: &ContribooSettings) -> Self {
        Self::new(
            RemoteBase::resolve(settings.api_url(), settings.git_base_url()),
            settings.git_timeout(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, args: &[String], cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run `git` to completion within the configured timeout and return its
    /// trimmed stdout.
    async fn run_git(&self, args: &[String], cwd: Option<&Path>) -> Result<String, GitError> {
        let rendered = format!("git {}", args.join(" "));
        debug!(cmd = %rendered, "running git command");

        let output = match tokio::time::timeout(self.timeout, self.command(args, cwd).output()).await
        {
            Ok(result) => result.map_err(spawn_error)?,
            Err(_) => {
                warn!(cmd = %rendered, secs = self.timeout.as_secs(), "git command timed out");
                return Err(GitError::Timeout {
                    secs: self.timeout.as_secs(),
                    command: rendered,
                });
            }
        };

        if !output.status.success() {
            let message = failure_message(&output);
            debug!(exit_code = output.status.code().unwrap_or(-1), %message, "git command failed");
            return Err(GitError::CommandFailed { message });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitHistoryGateway for SubprocessGitHistoryGateway {
    #[instrument(skip(self, destination_root), fields(repo = %repo))]
    async fn clone_repository(
        &self,
        repo: &RepositoryName,
        destination_root: &Path,
    ) -> Result<PathBuf, GitError> {
        let repo_dir = destination_root.join(repo.local_dir_name());
        let args = clone_args(&self.remote.clone_url(repo), &repo_dir);
        self.run_git(&args, None).await?;
        info!(path = %repo_dir.display(), "clone completed");
        Ok(repo_dir)
    }

    #[instrument(skip(self), fields(path = %repo_dir.display()))]
    async fn resolve_mainline_branch(&self, repo_dir: &Path) -> Result<Option<String>, GitError> {
        for candidate in MAINLINE_CANDIDATES {
            let args = vec![
                "rev-parse".to_string(),
                "--verify".to_string(),
                "--quiet".to_string(),
                remote_ref(candidate),
            ];
            match self.run_git(&args, Some(repo_dir)).await {
                Ok(_) => {
                    debug!(branch = candidate, "resolved mainline branch");
                    return Ok(Some(candidate.to_string()));
                }
                Err(GitError::CommandFailed { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        debug!("no mainline branch found");
        Ok(None)
    }

    #[instrument(skip(self), fields(path = %repo_dir.display()))]
    async fn commit_signatures(
        &self,
        repo_dir: &Path,
        branch: &str,
    ) -> Result<CommitSignatures, GitError> {
        let args = vec![
            "log".to_string(),
            remote_ref(branch),
            SIGNATURE_FORMAT.to_string(),
        ];
        debug!(cmd = %format!("git {}", args.join(" ")), "streaming git log");
        let child = self
            .command(&args, Some(repo_dir))
            .spawn()
            .map_err(spawn_error)?;
        CommitSignatures::from_child(child)
    }
}

fn remote_ref(branch: &str) -> String {
    format!("refs/remotes/origin/{}", branch)
}

fn clone_args(url: &str, repo_dir: &Path) -> Vec<String> {
    vec![
        "clone".to_string(),
        "--filter=blob:none".to_string(),
        "--no-checkout".to_string(),
        url.to_string(),
        repo_dir.to_string_lossy().to_string(),
    ]
}

fn spawn_error(e: std::io::Error) -> GitError {
    if e.kind() == std::io::ErrorKind::NotFound {
        GitError::BinaryNotFound("git".into())
    } else {
        GitError::IoError(e)
    }
}

/// Stderr, else stdout, else a generic message.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    "command failed".to_string()
}
