//! The two data flows wired to their persistence collaborators.
//!
//! Public path: listing fetch, then delta against the seen set. The seen set is
//! only written when the consumer calls [`ListingDelta::commit`] after
//! delivering the new entries.
//!
//! Authenticated path: exam records, then one result per published link, served
//! from the [`ResultCache`] when possible.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::changes::{mark_seen, new_entries};
use crate::document::ExamResult;
use crate::http::FetchError;
use crate::listing::{Entry, ListingFetcher, PageProgress};
use crate::portal::{ExamRecord, PortalClient, PortalError};
use crate::session::Credentials;
use crate::store::{ResultCache, SeenStore, StoreError};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The listing could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The portal could not be used at all (e.g. the login was rejected).
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// Persisted state could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which listing pages to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// First page only.
    #[default]
    Incremental,
    /// Every page from offset 0 to 260.
    Backfill,
}

/// New entries found by one listing check, plus what committing them means.
#[derive(Debug, Clone)]
pub struct ListingDelta {
    /// Entries not seen before, newest first.
    pub new_entries: Vec<Entry>,
    /// Every entry in this snapshot, newest first.
    pub snapshot: Vec<Entry>,
    /// Backfill offsets that failed and were skipped.
    pub failed_offsets: Vec<u32>,
    previous_seen: HashSet<String>,
}

impl ListingDelta {
    /// Whether there is anything to deliver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_entries.is_empty()
    }

    /// Persists the seen set extended with this snapshot. Returns its new size.
    ///
    /// Call after the new entries were delivered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the set cannot be written.
    pub async fn commit(&self, store: &dyn SeenStore) -> Result<usize, StoreError> {
        let updated = mark_seen(&self.previous_seen, &self.snapshot);
        store.save(&updated).await?;
        info!(seen = updated.len(), "seen set committed");
        Ok(updated.len())
    }
}

/// Fetches the listing and computes the delta against `store`.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] if the seen set cannot be read and
/// [`PipelineError::Fetch`] if an incremental fetch fails. Backfill page
/// failures are reported in [`ListingDelta::failed_offsets`] instead.
pub async fn check_listing(
    fetcher: &ListingFetcher,
    store: &dyn SeenStore,
    mode: ListingMode,
) -> Result<ListingDelta, PipelineError> {
    check_listing_with_progress(fetcher, store, mode, |_| {}).await
}

/// [`check_listing`] with a per-page callback for backfill runs.
///
/// # Errors
///
/// Same as [`check_listing`].
#[instrument(skip(fetcher, store, on_page), fields(url = %fetcher.base_url()))]
pub async fn check_listing_with_progress<F>(
    fetcher: &ListingFetcher,
    store: &dyn SeenStore,
    mode: ListingMode,
    on_page: F,
) -> Result<ListingDelta, PipelineError>
where
    F: FnMut(&PageProgress),
{
    let previous_seen = store.load().await?;

    let (snapshot, failed_offsets) = match mode {
        ListingMode::Incremental => (fetcher.fetch_incremental().await?, Vec::new()),
        ListingMode::Backfill => {
            let report = fetcher.fetch_backfill_with_progress(on_page).await;
            (report.entries, report.failed_offsets)
        }
    };

    let fresh = new_entries(&snapshot, &previous_seen);
    info!(
        ?mode,
        snapshot = snapshot.len(),
        new = fresh.len(),
        "listing checked"
    );
    Ok(ListingDelta {
        new_entries: fresh,
        snapshot,
        failed_offsets,
        previous_seen,
    })
}

/// The outcome for one exam record with a published result.
#[derive(Debug)]
pub struct RecordResult {
    /// Exam code of the record.
    pub code: String,
    /// Result document link.
    pub link: String,
    /// Whether the result came from the cache.
    pub cached: bool,
    /// The extracted result, or why it could not be read.
    pub result: Result<ExamResult, PortalError>,
}

/// Resolves the result of every record that links one.
///
/// Cached results are returned without touching the network. Fresh results
/// are cached; a cache write failure is logged and does not fail the record.
/// Per-record fetch or document failures are returned in
/// [`RecordResult::result`].
///
/// # Errors
///
/// A rejected login aborts the batch with [`PipelineError::Portal`], since
/// every following record would fail the same way.
#[instrument(skip(portal, credentials, records, cache), fields(identity = %identity, records = records.len()))]
pub async fn collect_results(
    portal: &PortalClient,
    identity: &str,
    credentials: &Credentials,
    records: &[ExamRecord],
    cache: &dyn ResultCache,
) -> Result<Vec<RecordResult>, PipelineError> {
    let mut results = Vec::new();

    for record in records {
        let Some(link) = record.result.link.as_deref() else {
            debug!(code = %record.code, "no result published");
            continue;
        };

        match cache.get(&record.code).await {
            Ok(Some(result)) => {
                debug!(code = %record.code, "result served from cache");
                results.push(RecordResult {
                    code: record.code.clone(),
                    link: link.to_string(),
                    cached: true,
                    result: Ok(result),
                });
                continue;
            }
            Ok(None) => {}
            Err(error) => warn!(code = %record.code, error = %error, "result cache unreadable"),
        }

        let result = match portal.exam_result(identity, credentials, link).await {
            Err(error) if error.is_rejected_login() => return Err(error.into()),
            other => other,
        };
        if let Ok(fresh) = &result {
            if let Err(error) = cache.put(&record.code, fresh).await {
                warn!(code = %record.code, error = %error, "failed to cache result");
            }
        }
        results.push(RecordResult {
            code: record.code.clone(),
            link: link.to_string(),
            cached: false,
            result,
        });
    }

    info!(
        resolved = results.iter().filter(|r| r.result.is_ok()).count(),
        failed = results.iter().filter(|r| r.result.is_err()).count(),
        "exam results collected"
    );
    Ok(results)
}
