use thiserror::Error;

/// Errors building a listing parser from configuration.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The detail-link pattern is not a valid regular expression.
    #[error("invalid detail pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// The detail-link pattern has no group to capture the entry id.
    #[error("detail pattern '{pattern}' needs a capture group for the entry id")]
    MissingCaptureGroup {
        /// The rejected pattern.
        pattern: String,
    },

    /// The listing URL cannot be parsed.
    #[error("invalid listing URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },
}
