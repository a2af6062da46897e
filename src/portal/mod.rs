//! Session-gated member portal.
//!
//! - [`AuthenticatedFetcher`] - GETs with the session cookie, re-authenticating
//!   once when the portal bounces the request to its login page
//! - [`parse_exam_table`] - the member exam table as [`ExamRecord`]s
//! - [`PortalClient`] - exam records and extracted result documents

mod client;
mod config;
mod error;
mod exams;
mod fetcher;

pub use client::PortalClient;
pub use config::{DEFAULT_EXAMS_PATH, DEFAULT_LOGIN_PATH, PortalConfig};
pub use error::PortalError;
pub use exams::{
    ACTION_DENYLIST, ExamAction, ExamRecord, HEADER_CODE_LABEL, ResultRef, parse_exam_table,
};
pub use fetcher::AuthenticatedFetcher;
