//! Paginated listing retrieval.

use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use super::entry::Entry;
use super::error::ListingError;
use super::parser::{DEFAULT_DETAIL_PATTERN, EntryCollector, ListingParser};
use crate::http::{FetchError, HttpClient, RateLimiter};

/// Offset increment between consecutive listing pages.
pub const PAGE_STEP: u32 = 5;

/// Largest offset requested by a full backfill.
pub const MAX_OFFSET: u32 = 260;

/// Default spacing between backfill page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// All backfill offsets: `0, 5, ..., 260`.
pub fn page_offsets() -> impl Iterator<Item = u32> {
    (0..=MAX_OFFSET).step_by(PAGE_STEP as usize)
}

/// URL of the listing page at `offset`.
///
/// Offset 0 is the base URL itself; other offsets are appended as a path
/// segment without doubling a trailing slash.
#[must_use]
pub fn page_url(base: &Url, offset: u32) -> Url {
    if offset == 0 {
        return base.clone();
    }
    let mut url = base.clone();
    let path = format!("{}/{offset}", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url
}

/// Listing source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    /// Listing URL at offset 0.
    pub url: String,
    /// Detail-link pattern; its first capture group is the entry id.
    pub detail_pattern: String,
    /// Spacing between backfill page requests. Zero disables pacing.
    pub page_delay: Duration,
}

impl ListingConfig {
    /// Settings for `url` with the default pattern and pacing.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            detail_pattern: DEFAULT_DETAIL_PATTERN.to_string(),
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Outcome of one backfill page, reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// Offset of the page.
    pub offset: u32,
    /// 1-based position of the page within the run.
    pub position: usize,
    /// Total pages in the run.
    pub total: usize,
    /// Matching entries on the page, or `None` if the fetch failed.
    pub entries: Option<usize>,
}

/// Result of a full backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Deduplicated entries across every page that loaded, newest first.
    pub entries: Vec<Entry>,
    /// Number of page requests issued.
    pub pages_requested: usize,
    /// Offsets whose fetch failed and were skipped.
    pub failed_offsets: Vec<u32>,
}

impl BackfillReport {
    /// Whether every page loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_offsets.is_empty()
    }
}

/// Fetches and parses the public listing.
#[derive(Debug)]
pub struct ListingFetcher {
    http: HttpClient,
    parser: ListingParser,
    base_url: Url,
    limiter: RateLimiter,
}

impl ListingFetcher {
    /// Creates a fetcher from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] for an unparseable URL or detail pattern.
    pub fn new(http: HttpClient, config: &ListingConfig) -> Result<Self, ListingError> {
        let base_url = Url::parse(&config.url).map_err(|_| ListingError::InvalidUrl {
            url: config.url.clone(),
        })?;
        let parser = ListingParser::new(&config.detail_pattern)?;
        Ok(Self {
            http,
            parser,
            base_url,
            limiter: RateLimiter::new(config.page_delay),
        })
    }

    /// Returns the listing URL at offset 0.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches only the first page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the page cannot be retrieved. An empty page is
    /// `Ok(vec![])`.
    #[instrument(skip(self), fields(url = %self.base_url))]
    pub async fn fetch_incremental(&self) -> Result<Vec<Entry>, FetchError> {
        let entries = self.fetch_page(0).await?;
        info!(count = entries.len(), "incremental listing fetched");
        Ok(entries)
    }

    /// Fetches every page from offset 0 to [`MAX_OFFSET`].
    pub async fn fetch_backfill(&self) -> BackfillReport {
        self.fetch_backfill_with_progress(|_| {}).await
    }

    /// Fetches every page sequentially, reporting each page to `on_page`.
    ///
    /// A failed page is logged and skipped; later pages are still fetched.
    #[instrument(skip(self, on_page), fields(url = %self.base_url))]
    pub async fn fetch_backfill_with_progress<F>(&self, mut on_page: F) -> BackfillReport
    where
        F: FnMut(&PageProgress),
    {
        let offsets: Vec<u32> = page_offsets().collect();
        let total = offsets.len();
        let mut collector = EntryCollector::new();
        let mut report = BackfillReport::default();

        for (index, offset) in offsets.into_iter().enumerate() {
            report.pages_requested += 1;
            let entries = match self.fetch_page_entries(offset).await {
                Ok(entries) => {
                    let count = entries.len();
                    collector.extend(entries);
                    Some(count)
                }
                Err(error) => {
                    warn!(offset, error = %error, "listing page failed, skipping");
                    report.failed_offsets.push(offset);
                    None
                }
            };
            on_page(&PageProgress {
                offset,
                position: index + 1,
                total,
                entries,
            });
        }

        report.entries = collector.into_sorted();
        info!(
            pages = report.pages_requested,
            failed = report.failed_offsets.len(),
            entries = report.entries.len(),
            "backfill finished"
        );
        report
    }

    async fn fetch_page(&self, offset: u32) -> Result<Vec<Entry>, FetchError> {
        let mut collector = EntryCollector::new();
        collector.extend(self.fetch_page_entries(offset).await?);
        Ok(collector.into_sorted())
    }

    async fn fetch_page_entries(&self, offset: u32) -> Result<Vec<Entry>, FetchError> {
        let url = page_url(&self.base_url, offset);
        self.limiter.acquire(url.as_str()).await;
        let page = self.http.get_page(url.as_str(), None).await?;
        Ok(self.parser.entries_in(&page.text(), &page.final_url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offsets_cover_53_pages() {
        let offsets: Vec<u32> = page_offsets().collect();
        assert_eq!(offsets.len(), 53);
        assert_eq!(offsets.first(), Some(&0));
        assert_eq!(offsets.last(), Some(&260));
        assert!(offsets.windows(2).all(|w| w[1] - w[0] == PAGE_STEP));
    }

    #[test]
    fn test_page_url_offset_zero_is_base() {
        let base = Url::parse("https://news.example/berita").unwrap();
        assert_eq!(page_url(&base, 0), base);
    }

    #[test]
    fn test_page_url_appends_offset_segment() {
        let base = Url::parse("https://news.example/berita").unwrap();
        assert_eq!(page_url(&base, 5).as_str(), "https://news.example/berita/5");

        let trailing = Url::parse("https://news.example/berita/").unwrap();
        assert_eq!(
            page_url(&trailing, 260).as_str(),
            "https://news.example/berita/260"
        );
    }

    #[test]
    fn test_fetcher_rejects_bad_config() {
        let mut config = ListingConfig::new("::not a url::");
        assert!(matches!(
            ListingFetcher::new(HttpClient::new(), &config),
            Err(ListingError::InvalidUrl { .. })
        ));

        config.url = "https://news.example/berita".to_string();
        config.detail_pattern = "(".to_string();
        assert!(matches!(
            ListingFetcher::new(HttpClient::new(), &config),
            Err(ListingError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_backfill_report_completeness() {
        let mut report = BackfillReport::default();
        assert!(report.is_complete());
        report.failed_offsets.push(50);
        assert!(!report.is_complete());
    }
}
