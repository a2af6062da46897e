//! Error types for the login exchange.

use thiserror::Error;

use crate::http::FetchError;

/// Errors returned by [`Authenticator::login`](super::Authenticator::login).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The portal answered but issued no session cookie (usually wrong credentials).
    ///
    /// This is an expected business outcome, not a transport problem.
    #[error("[AUTH] login rejected for {identity} (HTTP {status})\n  Suggestion: check the stored username and password")]
    Rejected {
        /// The identity whose login was rejected.
        identity: String,
        /// Status code of the login response.
        status: u16,
    },

    /// The login request itself failed (DNS, timeout, connection reset, ...).
    #[error("login request failed: {0}")]
    Transport(#[from] FetchError),
}

impl AuthError {
    /// Creates a rejected-login error.
    pub fn rejected(identity: impl Into<String>, status: u16) -> Self {
        Self::Rejected {
            identity: identity.into(),
            status,
        }
    }

    /// Whether this is a rejected login rather than a transport failure.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_suggests_checking_credentials() {
        let error = AuthError::rejected("chat-42", 200);
        let msg = error.to_string();
        assert!(msg.starts_with("[AUTH]"), "{msg}");
        assert!(msg.contains("chat-42"), "{msg}");
        assert!(msg.contains("HTTP 200"), "{msg}");
        assert!(msg.contains("check the stored username and password"), "{msg}");
        assert!(error.is_rejected());
    }

    #[test]
    fn test_transport_is_distinct_from_rejected() {
        let error = AuthError::from(FetchError::timeout("https://portal.example/login"));
        assert!(!error.is_rejected());
        assert!(error.to_string().contains("timeout"));
    }
}
