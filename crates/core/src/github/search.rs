//! Repository discovery through GitHub's commit-search API.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::transport::{GetRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::config::ContribooSettings;
use crate::errors::{GitHubError, TransportError};
use crate::models::DaysRange;

/// Results requested per search page (the API maximum).
pub const PER_PAGE: u32 = 100;

/// Longest rate-limit reset the provider is willing to sleep through.
pub const MAX_RATE_LIMIT_WAIT_SECS: i64 = 60;

/// Rate-limit sleeps allowed for one page before giving up.
pub const MAX_RATE_LIMIT_SLEEPS: u32 = 5;

const API_VERSION: &str = "2022-11-28";

/// Finds repositories a user has committed to.
#[allow(async_fn_in_trait)]
pub trait ProfileRepositoryProvider {
    /// Distinct `owner/repo` full names with commits by `username` inside
    /// the `days` window, in discovery order.
    async fn find_repositories_for_author(
        &self,
        username: &str,
        days: DaysRange,
    ) -> Result<Vec<String>, GitHubError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    repository: Option<SearchRepository>,
}

#[derive(Debug, Deserialize)]
struct SearchRepository {
    #[serde(default)]
    full_name: Option<String>,
}

/// [`ProfileRepositoryProvider`] backed by `GET /search/commits`.
#[derive(Debug, Clone)]
pub struct GitHubSearchProvider<T = ReqwestTransport> {
    transport: T,
    api_url: String,
    token: Option<String>,
    retries: u32,
    retry_delay: Duration,
    max_pages: u32,
}

impl GitHubSearchProvider<ReqwestTransport> {
    pub fn from_settings(settings: &ContribooSettings) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::new(settings.http_timeout())?;
        Ok(Self::with_transport(transport, settings))
    }
}

impl<T: HttpTransport> GitHubSearchProvider<T> {
    pub fn with_transport(transport: T, settings: &ContribooSettings) -> Self {
        let api_url = settings.api_url().trim_end_matches('/').to_string();
        info!(api_url = %api_url, authenticated = settings.token().is_some(), "created search provider");
        Self {
            transport,
            api_url,
            token: settings.token().map(str::to_string),
            retries: settings.http_retries(),
            retry_delay: settings.http_retry_delay(),
            max_pages: settings.max_search_pages(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn page_request(&self, query: &str, page: u32) -> GetRequest {
        let mut request = GetRequest::new(format!("{}/search/commits", self.api_url))
            .query("q", query)
            .query("per_page", PER_PAGE)
            .query("page", page)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }

    /// Fetch one page, sleeping through short rate-limit resets and retrying
    /// connect/timeout failures.
    async fn fetch_page(&self, query: &str, page: u32) -> Result<SearchResponse, GitHubError> {
        let request = self.page_request(query, page);
        let mut failures = 0u32;
        let mut sleeps = 0u32;

        loop {
            match self.transport.get(&request).await {
                Ok(resp) if resp.is_success() => {
                    return serde_json::from_str(&resp.body)
                        .map_err(|e| GitHubError::Parse(e.to_string()));
                }
                Ok(resp) => {
                    if let Some(wait) = rate_limit_wait(&resp, Utc::now()) {
                        let short = wait > 0 && wait <= MAX_RATE_LIMIT_WAIT_SECS;
                        if short && sleeps < MAX_RATE_LIMIT_SLEEPS {
                            sleeps += 1;
                            warn!(
                                page,
                                wait_secs = wait,
                                sleeps,
                                "search rate limited, waiting for reset"
                            );
                            tokio::time::sleep(Duration::from_secs(wait as u64)).await;
                            continue;
                        }
                        return Err(GitHubError::RateLimited {
                            wait_secs: wait.max(0) as u64,
                        });
                    }
                    return Err(GitHubError::Api {
                        status: resp.status,
                        body: resp.body.trim().to_string(),
                    });
                }
                Err(TransportError::Connect(detail)) | Err(TransportError::Timeout(detail)) => {
                    failures += 1;
                    if failures >= self.retries {
                        return Err(GitHubError::Unreachable {
                            attempts: failures,
                            detail,
                        });
                    }
                    warn!(page, attempt = failures, %detail, "search request failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(TransportError::Other(detail)) => return Err(GitHubError::Transport(detail)),
            }
        }
    }
}

impl<T: HttpTransport> ProfileRepositoryProvider for GitHubSearchProvider<T> {
    #[instrument(skip(self))]
    async fn find_repositories_for_author(
        &self,
        username: &str,
        days: DaysRange,
    ) -> Result<Vec<String>, GitHubError> {
        let query = search_query(username, days, Utc::now());
        let mut seen = HashSet::new();
        let mut repositories = Vec::new();

        for page in 1..=self.max_pages {
            let items = self.fetch_page(&query, page).await?.items.unwrap_or_default();
            debug!(page, items = items.len(), "fetched search page");
            if items.is_empty() {
                break;
            }
            let names = items
                .into_iter()
                .filter_map(|item| item.repository.and_then(|r| r.full_name))
                .filter(|name| !name.trim().is_empty());
            for full_name in names {
                if seen.insert(full_name.clone()) {
                    repositories.push(full_name);
                }
            }
        }

        info!(count = repositories.len(), "discovered repositories");
        Ok(repositories)
    }
}

/// `author:<username>` plus a `committer-date:>=` bound unless the window is
/// the whole history.
pub fn search_query(username: &str, days: DaysRange, now: DateTime<Utc>) -> String {
    match days.since(now) {
        Some(since) => format!(
            "author:{} committer-date:>={}",
            username,
            since.format("%Y-%m-%d")
        ),
        None => format!("author:{}", username),
    }
}

/// Seconds until the rate limit resets (plus one), when `resp` is a 403 with
/// no remaining quota and a reset header. An unreadable reset timestamp
/// yields 0, i.e. an unknown wait that is never slept on.
fn rate_limit_wait(resp: &HttpResponse, now: DateTime<Utc>) -> Option<i64> {
    if resp.status != 403 || resp.header("x-ratelimit-remaining") != Some("0") {
        return None;
    }
    let reset = resp.header("x-ratelimit-reset")?;
    match reset.trim().parse::<i64>() {
        Ok(reset) => Some(reset - now.timestamp() + 1),
        Err(_) => {
            warn!(%reset, "unreadable rate limit reset header");
            Some(0)
        }
    }
}
