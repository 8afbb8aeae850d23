//! Settings for contriboo.
//!
//! [`ContribooSettings`] is one immutable value holding every timeout, retry
//! and paging limit used by the discovery provider and the history gateway.
//! It is validated eagerly: [`SettingsBuilder::build`] and
//! [`ContribooSettings::load_from_file`] fail immediately on an out-of-range
//! value.
//!
//! The GitHub token may be given directly or, as with the other secrets in
//! this workspace, through an environment variable named by `token_env`
//! (default `GITHUB_TOKEN`), resolved by
//! [`ContribooSettings::resolve_env_vars`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Validated, immutable settings shared by discovery and history scanning.
///
/// Deserializing applies the same range checks as
/// [`SettingsBuilder::build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSettings")]
pub struct ContribooSettings {
    /// GitHub API base URL (default `https://api.github.com`).
    api_url: String,

    /// Base URL repositories are cloned from. Derived from `api_url` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    git_base_url: Option<String>,

    /// Environment variable holding the GitHub token.
    token_env: String,

    /// Bearer token for the search API.
    #[serde(skip)]
    token: Option<String>,

    /// Per-request HTTP timeout in seconds (> 0).
    http_timeout_sec: u64,

    /// Attempts per search page on connect/timeout errors (> 0).
    http_retries: u32,

    /// Delay between those attempts in seconds (>= 0).
    http_retry_delay_sec: u64,

    /// Time bound for each `git` subprocess in seconds (> 0).
    git_timeout_sec: u64,

    /// Hard cap on search result pages (> 0).
    max_search_pages: u32,

    /// Parent directory for the per-run scratch directory. System temp dir
    /// when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_dir: Option<PathBuf>,
}

/// Settings file layout before range checks.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default = "default_api_url")]
    api_url: String,
    #[serde(default)]
    git_base_url: Option<String>,
    #[serde(default = "default_token_env")]
    token_env: String,
    #[serde(default = "default_http_timeout")]
    http_timeout_sec: u64,
    #[serde(default = "default_http_retries")]
    http_retries: u32,
    #[serde(default = "default_http_retry_delay")]
    http_retry_delay_sec: u64,
    #[serde(default = "default_git_timeout")]
    git_timeout_sec: u64,
    #[serde(default = "default_max_search_pages")]
    max_search_pages: u32,
    #[serde(default)]
    workspace_dir: Option<PathBuf>,
}

impl TryFrom<RawSettings> for ContribooSettings {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let settings = Self {
            api_url: raw.api_url,
            git_base_url: raw.git_base_url,
            token_env: raw.token_env,
            token: None,
            http_timeout_sec: raw.http_timeout_sec,
            http_retries: raw.http_retries,
            http_retry_delay_sec: raw.http_retry_delay_sec,
            git_timeout_sec: raw.git_timeout_sec,
            max_search_pages: raw.max_search_pages,
            workspace_dir: raw.workspace_dir,
        };
        settings.validate()?;
        Ok(settings)
    }
}

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.into()
}
fn default_http_timeout() -> u64 {
    30
}
fn default_http_retries() -> u32 {
    3
}
fn default_http_retry_delay() -> u64 {
    2
}
fn default_git_timeout() -> u64 {
    180
}
fn default_max_search_pages() -> u32 {
    20
}

impl Default for ContribooSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            git_base_url: None,
            token_env: default_token_env(),
            token: None,
            http_timeout_sec: default_http_timeout(),
            http_retries: default_http_retries(),
            http_retry_delay_sec: default_http_retry_delay(),
            git_timeout_sec: default_git_timeout(),
            max_search_pages: default_max_search_pages(),
            workspace_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl ContribooSettings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            settings: Self::default(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn git_base_url(&self) -> Option<&str> {
        self.git_base_url.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_sec)
    }

    pub fn http_retries(&self) -> u32 {
        self.http_retries
    }

    pub fn http_retry_delay(&self) -> Duration {
        Duration::from_secs(self.http_retry_delay_sec)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_sec)
    }

    pub fn max_search_pages(&self) -> u32 {
        self.max_search_pages
    }

    pub fn workspace_dir(&self) -> Option<&Path> {
        self.workspace_dir.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Loading, resolving & validating
// ---------------------------------------------------------------------------

impl ContribooSettings {
    /// Load settings from a TOML file and validate them.
    ///
    /// This does **not** resolve the token variable -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let raw: RawSettings =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let settings = ContribooSettings::try_from(raw)?;

        debug!("configuration parsed successfully");
        Ok(settings)
    }

    /// Fill in the token from the `token_env` variable unless one is already
    /// set. A missing variable is not an error; the search API then runs
    /// unauthenticated with a much lower rate limit.
    pub fn resolve_env_vars(&mut self) {
        if self.token.is_some() {
            return;
        }
        match std::env::var(&self.token_env) {
            Ok(val) if !val.trim().is_empty() => {
                debug!(env_name = %self.token_env, "resolved token from environment");
                self.token = Some(val.trim().to_string());
            }
            Ok(_) => warn!(env_name = %self.token_env, "token env var is set but empty"),
            Err(_) => debug!(env_name = %self.token_env, "token env var not set"),
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        if self.http_timeout_sec == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_timeout_sec".into(),
                detail: "HTTP timeout must be > 0".into(),
            });
        }
        if self.http_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_retries".into(),
                detail: "HTTP retries must be > 0".into(),
            });
        }
        if self.git_timeout_sec == 0 {
            return Err(ConfigError::InvalidValue {
                field: "git_timeout_sec".into(),
                detail: "git timeout must be > 0".into(),
            });
        }
        if self.max_search_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_search_pages".into(),
                detail: "max search pages must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Render as TOML, e.g. for `contriboo config init`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`ContribooSettings`]; [`build`](Self::build) validates.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: ContribooSettings,
}

impl SettingsBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.settings.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn git_base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.git_base_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.settings.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn http_timeout_sec(mut self, secs: u64) -> Self {
        self.settings.http_timeout_sec = secs;
        self
    }

    pub fn http_retries(mut self, retries: u32) -> Self {
        self.settings.http_retries = retries;
        self
    }

    pub fn http_retry_delay_sec(mut self, secs: u64) -> Self {
        self.settings.http_retry_delay_sec = secs;
        self
    }

    pub fn git_timeout_sec(mut self, secs: u64) -> Self {
        self.settings.git_timeout_sec = secs;
        self
    }

    pub fn max_search_pages(mut self, pages: u32) -> Self {
        self.settings.max_search_pages = pages;
        self
    }

    pub fn workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.workspace_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<ContribooSettings, ConfigError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

impl From<ContribooSettings> for SettingsBuilder {
    fn from(settings: ContribooSettings) -> Self {
        Self { settings }
    }
}
