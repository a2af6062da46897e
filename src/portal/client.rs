//! High-level portal operations: the exam table and result documents.

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use super::{AuthenticatedFetcher, ExamRecord, PortalError, parse_exam_table};
use crate::document::{DocumentError, ExamResult, PdfTextExtractor, TextExtractor, extract_document};
use crate::session::Credentials;

/// Reads exam records and results for portal members.
#[derive(Clone)]
pub struct PortalClient {
    fetcher: AuthenticatedFetcher,
    extractor: Arc<dyn TextExtractor>,
}

impl fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalClient")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    /// Creates a client that reads documents as PDF.
    #[must_use]
    pub fn new(fetcher: AuthenticatedFetcher) -> Self {
        Self::with_extractor(fetcher, Arc::new(PdfTextExtractor))
    }

    /// Creates a client with a custom document text extractor.
    #[must_use]
    pub fn with_extractor(fetcher: AuthenticatedFetcher, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Returns the underlying authenticated fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &AuthenticatedFetcher {
        &self.fetcher
    }

    /// Fetches and parses the member's exam table.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the page cannot be fetched. An empty table
    /// is `Ok(vec![])`.
    #[instrument(skip(self, credentials), fields(identity = %identity))]
    pub async fn exam_records(
        &self,
        identity: &str,
        credentials: &Credentials,
    ) -> Result<Vec<ExamRecord>, PortalError> {
        let url = self.fetcher.config().exams_url()?;
        let page = self
            .fetcher
            .fetch_page(identity, credentials, url.as_str())
            .await?;
        let records = parse_exam_table(&page.text(), &page.final_url);
        info!(count = records.len(), "exam records fetched");
        Ok(records)
    }

    /// Downloads the result document at `link` and extracts its fields.
    ///
    /// Text extraction runs on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Document`] for unreadable or empty documents, and
    /// the fetch errors of [`AuthenticatedFetcher::fetch_document`].
    #[instrument(skip(self, credentials), fields(identity = %identity))]
    pub async fn exam_result(
        &self,
        identity: &str,
        credentials: &Credentials,
        link: &str,
    ) -> Result<ExamResult, PortalError> {
        let document = self
            .fetcher
            .fetch_document(identity, credentials, link)
            .await?;

        let extractor = Arc::clone(&self.extractor);
        let result = tokio::task::spawn_blocking(move || {
            extract_document(extractor.as_ref(), &document.body)
        })
        .await
        .map_err(|e| DocumentError::unreadable(format!("extraction task failed: {e}")))
        .and_then(|result| result)
        .map_err(|source| PortalError::document(link, source))?;

        info!(
            subject_code = result.subject_code.as_deref().unwrap_or("-"),
            passed = ?result.passed,
            "exam result extracted"
        );
        Ok(result)
    }
}
