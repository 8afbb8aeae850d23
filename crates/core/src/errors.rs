//! Error types for the contriboo core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    RepositoryName(#[from] InvalidRepositoryName),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Git(#[from] GitError),

    /// The scratch directory for clones could not be created.
    #[error("failed to create workspace directory: {0}")]
    Workspace(#[source] std::io::Error),
}

// ---------------------------------------------------------------------------
// Repository names
// ---------------------------------------------------------------------------

/// A string that is not a valid `owner/repo` repository name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository name '{value}': {reason}")]
pub struct InvalidRepositoryName {
    pub value: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from settings construction and loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is out of range.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from the GitHub commit-search API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Rate limit exhausted and the reset is too far away (or unknown).
    #[error("github rate limit exceeded; wait about {wait_secs}s or use a token")]
    RateLimited { wait_secs: u64 },

    /// Connect/timeout failures on every attempt.
    #[error(
        "github api is unreachable after {attempts} attempt(s) (dns/network issue: {detail}). \
         Check internet/VPN/DNS and try again"
    )]
    Unreachable { attempts: u32, detail: String },

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Transport failure that is not worth retrying.
    #[error("GitHub HTTP error: {0}")]
    Transport(String),

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    Parse(String),
}

/// Classified failure of a single HTTP GET, before any retry decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// DNS resolution or TCP/TLS connect failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request did not complete within the HTTP timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Anything else (malformed URL, body decoding, ...).
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from running the `git` executable.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("{message}")]
    CommandFailed { message: String },

    /// A `git` command did not finish within its time bound.
    #[error("command timeout after {secs}s: {command}")]
    Timeout { secs: u64, command: String },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
