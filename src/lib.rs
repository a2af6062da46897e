//! examwatch core library
//!
//! Acquisition pipeline for two sources: a public paginated listing that
//! announces new entries, and a cookie-session member portal that publishes
//! exam records and PDF result documents.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`http`] - HTTP transport with browser headers, timeouts and body limits
//! - [`session`] - login exchange and per-identity session cache
//! - [`listing`] - paginated listing fetch, parsing and deduplication
//! - [`portal`] - authenticated fetching with one re-authentication, exam table parsing
//! - [`document`] - PDF text extraction and result field extraction
//! - [`changes`] - new-entry detection against a seen set
//! - [`store`] - persistence traits and JSON-file implementations
//! - [`pipeline`] - the listing and result flows wired to persistence

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod changes;
pub mod document;
pub mod http;
pub mod listing;
pub mod pipeline;
pub mod portal;
pub mod session;
pub mod store;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use changes::{mark_seen, new_entries};
pub use document::{DocumentError, ExamResult, PdfTextExtractor, TextExtractor, extract_result};
pub use http::{FetchError, FetchedResponse, HttpClient, HttpSettings, RateLimiter};
pub use listing::{BackfillReport, Entry, ListingConfig, ListingError, ListingFetcher, ListingParser};
pub use pipeline::{ListingDelta, ListingMode, PipelineError, check_listing, collect_results};
pub use portal::{
    AuthenticatedFetcher, ExamAction, ExamRecord, PortalClient, PortalConfig, PortalError,
    ResultRef, parse_exam_table,
};
pub use session::{AuthError, Authenticator, Credentials, LoginForm, Session, SessionStore};
pub use store::{JsonResultCache, JsonSeenStore, ResultCache, SeenStore, StoreError};
