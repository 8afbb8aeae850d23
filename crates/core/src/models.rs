//! Domain model types used throughout contriboo.
//!
//! These types bridge the discovery provider, the history gateway and the
//! commit counter.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Commit signatures
// ---------------------------------------------------------------------------

/// Identity fields of a single commit as printed by `git log`.
///
/// Values are stored exactly as git printed them; normalization happens when
/// they are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSignature {
    pub author_email: String,
    pub author_name: String,
    pub committer_email: String,
    pub committer_name: String,
}

impl CommitSignature {
    /// Parse one log record of four delimited fields (author email, author
    /// name, committer email, committer name).
    ///
    /// Records are split on the ASCII unit separator; records without one
    /// fall back to `|`. Returns `None` for records with fewer than four
    /// fields.
    pub fn parse_record(line: &str) -> Option<Self> {
        let separator = if line.contains('\x1f') { '\x1f' } else { '|' };
        let mut parts = line.split(separator);
        let author_email = parts.next()?;
        let author_name = parts.next()?;
        let committer_email = parts.next()?;
        let committer_name = parts.next()?;
        Some(Self {
            author_email: author_email.to_string(),
            author_name: author_name.to_string(),
            committer_email: committer_email.to_string(),
            committer_name: committer_name.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Day window
// ---------------------------------------------------------------------------

/// How far back repository discovery looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysRange {
    /// The last `n` days.
    Days(NonZeroU32),
    /// No lower bound.
    All,
}

impl DaysRange {
    /// A window of `days` days; zero is rejected.
    pub fn days(days: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(days)
            .map(Self::Days)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "days".into(),
                detail: "day window must be a positive integer or 'all'".into(),
            })
    }

    /// Lower-bound date for the window relative to `now`, or `None` for
    /// [`DaysRange::All`]. A window reaching past the earliest representable
    /// date has no lower bound either.
    pub fn since(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        match self {
            Self::Days(n) => Duration::try_days(i64::from(n.get()))
                .and_then(|window| now.checked_sub_signed(window))
                .map(|since| since.date_naive()),
            Self::All => None,
        }
    }
}

impl fmt::Display for DaysRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{}", n),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for DaysRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let days: u32 = s.parse().map_err(|_| ConfigError::InvalidValue {
            field: "days".into(),
            detail: format!("'{}' is not a positive integer or 'all'", s),
        })?;
        Self::days(days)
    }
}

// ---------------------------------------------------------------------------
// Author query
// ---------------------------------------------------------------------------

/// Who to count commits for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorQuery {
    /// GitHub login; drives repository discovery and name matching.
    pub username: String,
    /// Optional commit email; matched before the username.
    pub email: Option<String>,
}

impl AuthorQuery {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Per-repository outcomes
// ---------------------------------------------------------------------------

/// Result of processing one discovered repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryOutcome {
    /// History was scanned; `commits` matched.
    Counted { repository: String, commits: u64 },
    /// Processing failed; the repository contributes nothing.
    Skipped { repository: String, reason: String },
}

impl RepositoryOutcome {
    pub fn repository(&self) -> &str {
        match self {
            Self::Counted { repository, .. } | Self::Skipped { repository, .. } => repository,
        }
    }

    /// Commits this outcome adds to the total.
    pub fn commits(&self) -> u64 {
        match self {
            Self::Counted { commits, .. } => *commits,
            Self::Skipped { .. } => 0,
        }
    }
}

/// All per-repository outcomes of one counting run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountReport {
    pub outcomes: Vec<RepositoryOutcome>,
}

impl CountReport {
    pub fn total(&self) -> u64 {
        self.outcomes.iter().map(RepositoryOutcome::commits).sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &RepositoryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RepositoryOutcome::Skipped { .. }))
    }
}
