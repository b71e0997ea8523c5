//! HTTP fetching with response caching, politeness, and bounded retry.
//!
//! All page and article fetches go through this module. The design is a small
//! decorator stack:
//! - [`Fetch`]: the trait the pager (and the tests) program against
//! - [`CachingFetcher`]: a `reqwest` client behind `http-cache-reqwest`,
//!   applying the politeness delay and the optional run-wide proxy
//! - [`RetryFetch`]: adds bounded exponential backoff with jitter for
//!   transient failures
//!
//! Page-list fetches use the caching fetcher directly: a failure there
//! abandons the keyword. Article fetches go through [`fetch_with_backoff`],
//! which retries transient failures up to a fixed attempt budget and then
//! surfaces the failure for that single article.
//!
//! # Retry strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use http_cache_reqwest::{CACacheManager, Cache, CacheMode, HttpCache, HttpCacheOptions};
use rand::{Rng, rng};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("pressklipp/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_RETRIES: usize = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Errors surfaced by a fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (connect failure, timeout,
    /// proxy failure, cache-layer failure).
    #[error("connection failed for {url}")]
    Connection {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a non-success status.
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: StatusCode },

    /// The response body could not be read.
    #[error("failed reading body from {url}")]
    Body {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Whether a retry can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Connection { .. } | FetchError::Body { .. } => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Fetch a URL and return its body as text.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// The run-wide HTTP session: cached, polite, optionally proxied.
///
/// Responses are cached on disk under standard HTTP caching semantics, so a
/// repeated fetch of the same URL within a run (or across runs) may be served
/// without re-issuing the request. The politeness delay is applied after
/// every fetch.
pub struct CachingFetcher {
    client: ClientWithMiddleware,
    delay: Duration,
}

impl CachingFetcher {
    /// Build the session. `proxy` routes every outbound request of the run
    /// when set; `cache_dir` is where cached responses live.
    pub fn new(
        delay: Duration,
        proxy: Option<&str>,
        cache_dir: &str,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        let client = ClientBuilder::new(builder.build()?)
            .with(Cache(HttpCache {
                mode: CacheMode::Default,
                manager: CACacheManager {
                    path: PathBuf::from(cache_dir),
                },
                options: HttpCacheOptions::default(),
            }))
            .build();
        Ok(Self { client, delay })
    }
}

impl Fetch for CachingFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Connection {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        debug!(bytes = body.len(), "Fetched");

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        Ok(body)
    }
}

/// Bounded-retry decorator over any [`Fetch`] implementation.
///
/// Retries only transient failures; a non-transient error (a 404, say) is
/// returned immediately. After the attempt budget is exhausted the last
/// error is returned.
pub struct RetryFetch<'a, T> {
    inner: &'a T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<'a, T> RetryFetch<'a, T>
where
    T: Fetch,
{
    pub fn new(inner: &'a T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: MAX_DELAY,
        }
    }
}

impl<T> Fetch for RetryFetch<'_, T>
where
    T: Fetch,
{
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || attempt > self.max_retries {
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        %url,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Fetch an article body with the standard bounded-backoff policy.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_with_backoff<F: Fetch>(fetcher: &F, url: &str) -> Result<String, FetchError> {
    RetryFetch::new(fetcher, MAX_RETRIES, BASE_DELAY)
        .fetch(url)
        .await
}
