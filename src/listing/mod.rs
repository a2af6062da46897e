//! Public paginated listing: fetching, parsing and deduplication.
//!
//! - [`ListingParser`] - detail-link anchors to [`Entry`] values
//! - [`ListingFetcher`] - incremental (first page) and full backfill runs
//!
//! Backfill walks offsets `0..=260` in steps of 5, pacing requests through a
//! per-host [`RateLimiter`](crate::http::RateLimiter).

mod entry;
mod error;
mod fetcher;
mod parser;

pub use entry::{Entry, compare_numeric_ids, normalize_id, sort_newest_first};
pub use error::ListingError;
pub use fetcher::{
    BackfillReport, DEFAULT_PAGE_DELAY, ListingConfig, ListingFetcher, MAX_OFFSET, PAGE_STEP,
    PageProgress, page_offsets, page_url,
};
pub use parser::{DEFAULT_DETAIL_PATTERN, EntryCollector, ListingParser};
