//! contriboo core library.
//!
//! Counts the commits a GitHub user authored or committed across every
//! repository they touched recently: repositories are discovered through the
//! commit-search API, then each one is cloned (history only) and its log is
//! scanned for matching author/committer identities.

pub mod client;
pub mod commit_counter;
pub mod config;
pub mod errors;
pub mod git;
pub mod github;
pub mod models;
pub mod progress;
pub mod repository_name;

// Re-exports for convenience.
pub use client::{get_total_commits_count, ContribooClient};
pub use commit_counter::{AuthorMatcher, CommitCounter};
pub use config::ContribooSettings;
pub use errors::CoreError;
pub use models::{AuthorQuery, CommitSignature, CountReport, DaysRange, RepositoryOutcome};
pub use repository_name::RepositoryName;
