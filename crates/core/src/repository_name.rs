//! Validated `owner/repo` repository names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::InvalidRepositoryName;

/// A GitHub repository full name such as `octocat/hello-world`.
///
/// Both parts are non-empty and contain no `/`. Values are immutable and
/// compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryName {
    owner: String,
    repo: String,
}

impl RepositoryName {
    /// Parse `owner/repo`, splitting on the first `/` and trimming each part.
    pub fn parse(value: &str) -> Result<Self, InvalidRepositoryName> {
        let invalid = |reason: &str| InvalidRepositoryName {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let (owner, repo) = value
            .split_once('/')
            .ok_or_else(|| invalid("repository name must be in format 'owner/repo'"))?;
        let owner = owner.trim();
        let repo = repo.trim();

        if owner.is_empty() || repo.is_empty() {
            return Err(invalid("repository name must be in format 'owner/repo'"));
        }
        if repo.contains('/') {
            return Err(invalid("owner and repo must not contain '/'"));
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Canonical `owner/repo` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Directory name used for a local clone: `owner__repo`.
    pub fn local_dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepositoryName {
    type Err = InvalidRepositoryName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryName {
    type Error = InvalidRepositoryName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepositoryName> for String {
    fn from(name: RepositoryName) -> Self {
        name.full_name()
    }
}
