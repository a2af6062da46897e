//! Persistence collaborators for the seen set and cached exam results.
//!
//! The core only talks to the [`SeenStore`] and [`ResultCache`] traits. The
//! JSON-file implementations back the CLI.

mod json;

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::document::ExamResult;

pub use json::{JsonResultCache, JsonSeenStore, RESULTS_FILE_NAME, SEEN_FILE_NAME};

/// Errors from persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the file failed.
    #[error("state file {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold valid state.
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        /// The file involved.
        path: PathBuf,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// The set of listing entry ids already delivered.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Loads the seen set; a store that was never written is empty.
    async fn load(&self) -> Result<HashSet<String>, StoreError>;

    /// Replaces the seen set.
    async fn save(&self, seen: &HashSet<String>) -> Result<(), StoreError>;
}

/// Extracted exam results keyed by exam code.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns the cached result for `code`.
    async fn get(&self, code: &str) -> Result<Option<ExamResult>, StoreError>;

    /// Stores the result for `code`, replacing any previous one.
    async fn put(&self, code: &str, result: &ExamResult) -> Result<(), StoreError>;
}
