use thiserror::Error;

/// Errors turning a result document into text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The bytes are not a readable document.
    #[error("document unreadable: {reason}")]
    Unreadable {
        /// What went wrong while decoding.
        reason: String,
    },

    /// The document decoded but holds no text (e.g. a scanned image).
    #[error("document contains no extractable text")]
    NoText,
}

impl DocumentError {
    /// Creates an unreadable-document error.
    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self::Unreadable {
            reason: reason.into(),
        }
    }
}
