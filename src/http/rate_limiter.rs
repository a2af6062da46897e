//! Per-host request pacing.
//!
//! [`RateLimiter`] enforces a minimum spacing between consecutive requests to
//! the same host. The listing backfill walks dozens of pages on one host, so it
//! acquires a slot before every page to stay under anti-scraping thresholds.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use examwatch_core::http::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_millis(500));
//!
//! // First request proceeds immediately
//! limiter.acquire("https://example.com/berita").await;
//!
//! // Second request to the same host waits out the remaining spacing
//! limiter.acquire("https://example.com/berita/5").await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Warning threshold for cumulative pacing delay per host (60 seconds).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(60);

/// Per-host rate limiter.
///
/// Designed to be shared (directly or behind `Arc`) across tasks. Host state
/// lives in a `DashMap`; each host's timing sits behind its own async mutex so
/// the map shard lock is never held across an `.await`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum delay between requests to the same host.
    min_spacing: Duration,

    /// Whether pacing is disabled (spacing of zero).
    disabled: bool,

    /// Per-host state. `Arc` lets us clone the entry out and release the
    /// `DashMap` lock before awaiting on the inner mutex.
    hosts: DashMap<String, Arc<HostState>>,
}

#[derive(Debug)]
struct HostState {
    /// Time of the last request to this host; `None` until the first one.
    last_request: Mutex<Option<Instant>>,

    /// Cumulative delay applied to this host (milliseconds).
    cumulative_delay_ms: AtomicU64,
}

impl HostState {
    fn new() -> Self {
        Self {
            last_request: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let new_total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(new_total)
    }
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing; zero disables pacing.
    #[must_use]
    #[instrument(skip_all, fields(spacing_ms = min_spacing.as_millis()))]
    pub fn new(min_spacing: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            min_spacing,
            disabled: min_spacing.is_zero(),
            hosts: DashMap::new(),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the minimum spacing between requests to one host.
    #[must_use]
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Waits until a request to `url`'s host is allowed, then records it.
    ///
    /// The first request to any host proceeds immediately.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) {
        if self.disabled {
            return;
        }

        let host = extract_host(url);
        tracing::Span::current().record("host", &host);

        let state = self
            .hosts
            .entry(host.clone())
            .or_insert_with(|| Arc::new(HostState::new()))
            .clone();

        let mut last_request_guard = state.last_request.lock().await;

        if let Some(last_request) = *last_request_guard {
            let elapsed = last_request.elapsed();
            if elapsed < self.min_spacing {
                let delay = self.min_spacing.saturating_sub(elapsed);
                let cumulative = state.add_cumulative_delay(delay);

                debug!(
                    host = %host,
                    delay_ms = delay.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "pacing request"
                );

                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                    warn!(
                        host = %host,
                        cumulative_delay_secs = cumulative.as_secs(),
                        "long cumulative pacing delay for host"
                    );
                }

                tokio::time::sleep(delay).await;
            }
        } else {
            debug!(host = %host, "first request to host - no delay");
        }

        *last_request_guard = Some(Instant::now());
    }
}

/// Extracts the lowercase host from a URL, or `"unknown"` for malformed input
/// so that every request is still paced.
///
/// ```
/// use examwatch_core::http::extract_host;
///
/// assert_eq!(extract_host("https://Example.COM/berita/5"), "example.com");
/// assert_eq!(extract_host("not a url"), "unknown");
/// ```
#[must_use]
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}
