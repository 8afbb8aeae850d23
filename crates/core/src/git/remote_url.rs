//! Where repositories are cloned from.
//!
//! The clone host is derived from the configured API URL so that GitHub
//! Enterprise installations work without extra settings, or taken from an
//! explicit override (which is also how tests point clones at local bare
//! repositories).

use crate::repository_name::RepositoryName;

/// Base URL that `owner/repo.git` paths are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBase(String);

impl RemoteBase {
    /// Resolution order:
    /// 1. `git_base_url` when it is non-blank.
    /// 2. `https://api.github.com` maps to `https://github.com`.
    /// 3. `https://<host>/api/v3` maps to `https://<host>`.
    /// 4. Anything else is used as-is.
    ///
    /// Trailing slashes are dropped in every case.
    pub fn resolve(api_url: &str, git_base_url: Option<&str>) -> Self {
        if let Some(explicit) = git_base_url.map(str::trim).filter(|s| !s.is_empty()) {
            return Self(explicit.trim_end_matches('/').to_string());
        }

        let url = api_url.trim().trim_end_matches('/');
        if url.eq_ignore_ascii_case("https://api.github.com") {
            return Self("https://github.com".to_string());
        }
        if let Some(host) = url.strip_suffix("/api/v3") {
            return Self(host.to_string());
        }
        Self(url.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<base>/<owner>/<repo>.git`
    pub fn clone_url(&self, repo: &RepositoryName) -> String {
        format!("{}/{}.git", self.0, repo.full_name())
    }
}

impl Default for RemoteBase {
    fn default() -> Self {
        Self("https://github.com".to_string())
    }
}
