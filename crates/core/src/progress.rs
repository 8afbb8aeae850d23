//! Progress reporting for counting runs.

use tracing::debug;

/// Something that happened while counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// Discovery finished with `count` repositories.
    Discovered { count: usize },
    /// About to clone repository `index` of `total` (1-based).
    Cloning {
        index: usize,
        total: usize,
        repository: &'a str,
    },
    /// The repository contributed `commits`.
    Counted {
        index: usize,
        total: usize,
        repository: &'a str,
        commits: u64,
    },
    /// The repository failed and contributes nothing.
    Skipped {
        index: usize,
        total: usize,
        repository: &'a str,
        reason: &'a str,
    },
}

/// Receives [`ProgressEvent`]s from the commit counter.
pub trait ProgressSink {
    fn on_event(&self, event: &ProgressEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, event: &ProgressEvent<'_>) {
        debug!(?event, "progress");
    }
}

/// Prints one line per event to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn on_event(&self, event: &ProgressEvent<'_>) {
        if let Some(line) = render(event) {
            println!("{}", line);
        }
    }
}

/// Plain-text rendering shared by line-oriented sinks.
pub fn render(event: &ProgressEvent<'_>) -> Option<String> {
    match event {
        ProgressEvent::Discovered { .. } => None,
        ProgressEvent::Cloning {
            index,
            total,
            repository,
        } => Some(format!("[{}/{}] cloning {} ...", index, total, repository)),
        ProgressEvent::Counted {
            index,
            total,
            repository,
            commits,
        } => Some(format!("[{}/{}] {}: +{}", index, total, repository, commits)),
        ProgressEvent::Skipped {
            index,
            total,
            repository,
            reason,
        } => Some(format!("[{}/{}] skip {}: {}", index, total, repository, reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(
            render(&ProgressEvent::Cloning {
                index: 1,
                total: 3,
                repository: "a/repo1"
            })
            .as_deref(),
            Some("[1/3] cloning a/repo1 ...")
        );
        assert_eq!(
            render(&ProgressEvent::Counted {
                index: 2,
                total: 3,
                repository: "a/repo2",
                commits: 4
            })
            .as_deref(),
            Some("[2/3] a/repo2: +4")
        );
        assert_eq!(
            render(&ProgressEvent::Skipped {
                index: 3,
                total: 3,
                repository: "a/repo3",
                reason: "fail clone"
            })
            .as_deref(),
            Some("[3/3] skip a/repo3: fail clone")
        );
        assert_eq!(render(&ProgressEvent::Discovered { count: 3 }), None);
    }
}
