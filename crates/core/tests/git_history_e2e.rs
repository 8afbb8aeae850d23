//! End-to-end tests for history scanning against real `git`.
//!
//! Remotes are plain local repositories laid out as
//! `<root>/<owner>/<repo>.git` and reached through a `file://` base URL, so
//! no network I/O happens.
//!
//! Tests skip gracefully if `git` is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tempfile::TempDir;

use contriboo_core::commit_counter::{count_matching, AuthorMatcher, CommitCounter};
use contriboo_core::errors::{GitError, GitHubError};
use contriboo_core::git::{GitHistoryGateway, RemoteBase, SubprocessGitHistoryGateway};
use contriboo_core::github::ProfileRepositoryProvider;
use contriboo_core::models::{AuthorQuery, DaysRange, RepositoryOutcome};
use contriboo_core::RepositoryName;

// ===========================================================================
// Helpers
// ===========================================================================

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(dir)
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

struct Identity<'a> {
    author: (&'a str, &'a str),
    committer: (&'a str, &'a str),
}

const OCTOCAT: Identity<'static> = Identity {
    author: ("octocat", "octocat@github.com"),
    committer: ("octocat", "octocat@github.com"),
};

const STRANGER: Identity<'static> = Identity {
    author: ("Stranger", "stranger@example.com"),
    committer: ("Stranger", "stranger@example.com"),
};

/// Remote hosting root plus helpers to populate `owner/repo` remotes.
struct RemoteRoot {
    dir: TempDir,
}

impl RemoteRoot {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn base(&self) -> RemoteBase {
        RemoteBase::resolve(
            "https://api.github.com",
            Some(&format!("file://{}", self.dir.path().display())),
        )
    }

    fn gateway(&self) -> SubprocessGitHistoryGateway {
        SubprocessGitHistoryGateway::new(self.base(), Duration::from_secs(60))
    }

    fn repo_path(&self, full_name: &str) -> PathBuf {
        self.dir.path().join(format!("{}.git", full_name))
    }

    /// Create `full_name` with `branch` holding one empty commit per identity.
    fn create(&self, full_name: &str, branch: &str, commits: &[&Identity<'_>]) -> &Self {
        let path = self.repo_path(full_name);
        if !path.exists() {
            std::fs::create_dir_all(&path).unwrap();
            git(&path, &["init", "-q"]);
        }
        let head = format!("refs/heads/{}", branch);
        git(&path, &["symbolic-ref", "HEAD", head.as_str()]);
        for (i, who) in commits.iter().enumerate() {
            let message = format!("commit {} on {}", i, branch);
            let output = Command::new("git")
                .current_dir(&path)
                .args([
                    "-c",
                    "commit.gpgsign=false",
                    "commit",
                    "-q",
                    "--allow-empty",
                    "-m",
                    message.as_str(),
                ])
                .env("GIT_AUTHOR_NAME", who.author.0)
                .env("GIT_AUTHOR_EMAIL", who.author.1)
                .env("GIT_COMMITTER_NAME", who.committer.0)
                .env("GIT_COMMITTER_EMAIL", who.committer.1)
                .output()
                .expect("failed to run git commit");
            assert!(
                output.status.success(),
                "git commit failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        self
    }
}

struct StaticProvider(Vec<String>);

impl ProfileRepositoryProvider for StaticProvider {
    async fn find_repositories_for_author(
        &self,
        _username: &str,
        _days: DaysRange,
    ) -> Result<Vec<String>, GitHubError> {
        Ok(self.0.clone())
    }
}

fn repo(name: &str) -> RepositoryName {
    RepositoryName::parse(name).unwrap()
}

// ===========================================================================
// Gateway
// ===========================================================================

#[tokio::test]
async fn test_clone_into_owner_repo_subdirectory() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let remotes = RemoteRoot::new();
    remotes.create("owner/repo", "main", &[&OCTOCAT]);
    let workspace = TempDir::new().unwrap();

    let repo_dir = remotes
        .gateway()
        .clone_repository(&repo("owner/repo"), workspace.path())
        .await
        .unwrap();

    assert_eq!(repo_dir, workspace.path().join("owner__repo"));
    assert!(repo_dir.join(".git").exists());
}

#[tokio::test]
async fn test_clone_failure_reports_git_diagnostics() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let remotes = RemoteRoot::new();
    let workspace = TempDir::new().unwrap();

    let err = remotes
        .gateway()
        .clone_repository(&repo("ghost/missing"), workspace.path())
        .await
        .unwrap_err();

    match err {
        GitError::CommandFailed { message } => {
            assert!(!message.is_empty());
            assert_ne!(message, "command failed");
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_clone_timeout_names_the_bound() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let remotes = RemoteRoot::new();
    remotes.create("owner/repo", "main", &[&OCTOCAT]);
    let gateway = SubprocessGitHistoryGateway::new(remotes.base(), Duration::from_nanos(1));
    let workspace = TempDir::new().unwrap();

    let err = gateway
        .clone_repository(&repo("owner/repo"), workspace.path())
        .await
        .unwrap_err();

    assert!(matches!(err, GitError::Timeout { secs: 0, .. }));
    assert!(err.to_string().starts_with("command timeout after 0s: git clone"));
}

#[tokio::test]
async fn test_branch_resolution_prefers_main() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let remotes = RemoteRoot::new();
    remotes
        .create("a/both", "master", &[&STRANGER])
        .create("a/both", "main", &[&OCTOCAT])
        .create("a/legacy", "master", &[&OCTOCAT])
        .create("a/trunk", "trunk", &[&OCTOCAT]);
    let gateway = remotes.gateway();
    let workspace = TempDir::new().unwrap();

    let both = gateway
        .clone_repository(&repo("a/both"), workspace.path())
        .await
        .unwrap();
    let legacy = gateway
        .clone_repository(&repo("a/legacy"), workspace.path())
        .await
        .unwrap();
    let trunk = gateway
        .clone_repository(&repo("a/trunk"), workspace.path())
        .await
        .unwrap();

    assert_eq!(
        gateway.resolve_mainline_branch(&both).await.unwrap().as_deref(),
        Some("main")
    );
    assert_eq!(
        gateway.resolve_mainline_branch(&legacy).await.unwrap().as_deref(),
        Some("master")
    );
    assert_eq!(gateway.resolve_mainline_branch(&trunk).await.unwrap(), None);
}

#[tokio::test]
async fn test_commit_signatures_stream_the_branch_log() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let mixed = Identity {
        author: ("Alice | Admin", "alice@example.com"),
        committer: ("GitHub", "noreply@github.com"),
    };
    let remotes = RemoteRoot::new();
    remotes.create("owner/repo", "main", &[&OCTOCAT, &mixed, &STRANGER]);
    let gateway = remotes.gateway();
    let workspace = TempDir::new().unwrap();
    let repo_dir = gateway
        .clone_repository(&repo("owner/repo"), workspace.path())
        .await
        .unwrap();

    let mut signatures = gateway.commit_signatures(&repo_dir, "main").await.unwrap();
    let mut seen = Vec::new();
    while let Some(signature) = signatures.next().await.unwrap() {
        seen.push(signature);
    }

    // git log lists newest first.
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].author_email, "stranger@example.com");
    assert_eq!(seen[1].author_name, "Alice | Admin");
    assert_eq!(seen[1].committer_email, "noreply@github.com");
    assert_eq!(seen[2].committer_name, "octocat");

    let mut again = gateway.commit_signatures(&repo_dir, "main").await.unwrap();
    let matcher = AuthorMatcher::new(Some("alice | admin"), None);
    assert_eq!(count_matching(&mut again, &matcher).await.unwrap(), 1);
}

#[tokio::test]
async fn test_commit_signatures_for_unknown_branch_fail_at_end_of_stream() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let remotes = RemoteRoot::new();
    remotes.create("owner/repo", "main", &[&OCTOCAT]);
    let gateway = remotes.gateway();
    let workspace = TempDir::new().unwrap();
    let repo_dir = gateway
        .clone_repository(&repo("owner/repo"), workspace.path())
        .await
        .unwrap();

    let mut signatures = gateway.commit_signatures(&repo_dir, "nope").await.unwrap();
    let err = signatures.next().await.unwrap_err();
    assert!(matches!(err, GitError::CommandFailed { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_non_utf8_identity_does_not_fail_the_scan() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let remotes = RemoteRoot::new();
    remotes.create("owner/legacy", "main", &[&OCTOCAT]);
    let latin1_name = OsStr::from_bytes(b"Octo Cat \xe9");
    let output = Command::new("git")
        .current_dir(remotes.repo_path("owner/legacy"))
        .args(["-c", "commit.gpgsign=false", "commit", "-q", "--allow-empty", "-m", "latin-1"])
        .env("GIT_AUTHOR_NAME", latin1_name)
        .env("GIT_AUTHOR_EMAIL", "octocat@github.com")
        .env("GIT_COMMITTER_NAME", latin1_name)
        .env("GIT_COMMITTER_EMAIL", "octocat@github.com")
        .output()
        .expect("failed to run git commit");
    assert!(output.status.success());

    let gateway = remotes.gateway();
    let workspace = TempDir::new().unwrap();
    let repo_dir = gateway
        .clone_repository(&repo("owner/legacy"), workspace.path())
        .await
        .unwrap();

    let mut signatures = gateway.commit_signatures(&repo_dir, "main").await.unwrap();
    let matcher = AuthorMatcher::new(None, Some("octocat@github.com"));
    assert_eq!(count_matching(&mut signatures, &matcher).await.unwrap(), 2);
}

// ===========================================================================
// Full pipeline
// ===========================================================================

#[tokio::test]
async fn test_counter_over_local_remotes() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }

    let by_email_only = Identity {
        author: ("Octo Cat", "OctoCat@GitHub.com"),
        committer: ("GitHub", "noreply@github.com"),
    };
    let remotes = RemoteRoot::new();
    remotes
        .create("a/repo1", "main", &[&OCTOCAT, &STRANGER, &by_email_only])
        .create("a/repo2", "master", &[&OCTOCAT, &OCTOCAT, &OCTOCAT])
        .create("a/repo3", "develop", &[&OCTOCAT]);
    let provider = StaticProvider(vec![
        "a/repo1".into(),
        "a/missing".into(),
        "a/repo2".into(),
        "a/repo3".into(),
    ]);
    let scratch = TempDir::new().unwrap();
    let counter =
        CommitCounter::new(provider, remotes.gateway()).with_workspace_dir(scratch.path());
    let query = AuthorQuery::new("octocat").with_email("octocat@github.com");

    let report = counter
        .count_report(&query, DaysRange::All, &contriboo_core::progress::NoProgress)
        .await
        .unwrap();

    assert_eq!(report.total(), 5);
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(
        report.outcomes[0],
        RepositoryOutcome::Counted {
            repository: "a/repo1".into(),
            commits: 2
        }
    );
    assert!(matches!(report.outcomes[1], RepositoryOutcome::Skipped { .. }));
    assert_eq!(report.outcomes[2].commits(), 3);
    assert_eq!(
        report.outcomes[3],
        RepositoryOutcome::Counted {
            repository: "a/repo3".into(),
            commits: 0
        }
    );

    // The per-run workspace is gone, only the parent remains.
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
