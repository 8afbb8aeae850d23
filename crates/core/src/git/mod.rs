//! Commit history access through the `git` executable.

pub mod history;
pub mod remote_url;

pub use history::{CommitSignatures, GitHistoryGateway, SubprocessGitHistoryGateway};
pub use remote_url::RemoteBase;
