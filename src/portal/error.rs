//! Errors for authenticated portal access.

use thiserror::Error;

use crate::document::DocumentError;
use crate::http::FetchError;
use crate::session::AuthError;

/// Errors from fetching session-gated portal resources.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Logging in failed (rejected credentials or login transport failure).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Fetching the resource itself failed.
    #[error(transparent)]
    Transport(#[from] FetchError),

    /// Still redirected to the login page after one re-authentication.
    #[error("session expired again right after re-authenticating while fetching {url}")]
    SessionExpired {
        /// The resource that kept redirecting to login.
        url: String,
    },

    /// The resource was fetched but its document could not be read.
    #[error("result document at {url}: {source}")]
    Document {
        /// The document URL.
        url: String,
        /// What went wrong while reading it.
        #[source]
        source: DocumentError,
    },
}

impl PortalError {
    /// Creates a session-expired error.
    pub fn session_expired(url: impl Into<String>) -> Self {
        Self::SessionExpired { url: url.into() }
    }

    /// Creates a document error.
    pub fn document(url: impl Into<String>, source: DocumentError) -> Self {
        Self::Document {
            url: url.into(),
            source,
        }
    }

    /// Whether the failure is a rejected login.
    #[must_use]
    pub fn is_rejected_login(&self) -> bool {
        matches!(self, Self::Auth(error) if error.is_rejected())
    }
}
