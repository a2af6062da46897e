//! Session-gated fetching with one transparent re-authentication.
//!
//! Every logical fetch runs a two-state machine:
//!
//! ```text
//! Fresh --(landed on login page)--> Retried --(landed on login page)--> SessionExpired
//! ```
//!
//! Each state first makes sure a valid session exists (logging in when the
//! store has none), then GETs the target with the session cookie. Landing on
//! the login page clears the stored session, so the `Retried` state always
//! logs in again before its single retry.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{PortalConfig, PortalError};
use crate::http::{FetchError, FetchedResponse, HttpClient};
use crate::session::{Authenticator, Credentials, Session, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Fresh,
    Retried,
}

impl Attempt {
    /// The next state after an expiry, or `None` once the retry is spent.
    fn after_expiry(self) -> Option<Self> {
        match self {
            Self::Fresh => Some(Self::Retried),
            Self::Retried => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ResourceKind {
    Page,
    Document,
}

/// Fetches portal resources on behalf of an identity.
#[derive(Debug, Clone)]
pub struct AuthenticatedFetcher {
    http: HttpClient,
    authenticator: Authenticator,
    sessions: Arc<SessionStore>,
    config: PortalConfig,
}

impl AuthenticatedFetcher {
    /// Creates a fetcher that caches sessions in `sessions`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the login URL cannot be built.
    pub fn new(
        http: HttpClient,
        config: PortalConfig,
        sessions: Arc<SessionStore>,
    ) -> Result<Self, FetchError> {
        let authenticator = Authenticator::new(http.clone(), config.login_form()?);
        Ok(Self {
            http,
            authenticator,
            sessions,
            config,
        })
    }

    /// Returns the portal settings.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Returns the shared session store.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Fetches an HTML page behind the login.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Auth`] if logging in fails
    /// - [`PortalError::Transport`] if the request fails
    /// - [`PortalError::SessionExpired`] if the portal still redirects to login
    ///   after one re-authentication
    pub async fn fetch_page(
        &self,
        identity: &str,
        credentials: &Credentials,
        url: &str,
    ) -> Result<FetchedResponse, PortalError> {
        self.fetch(identity, credentials, url, ResourceKind::Page)
            .await
    }

    /// Fetches a binary document behind the login, with the document timeout.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_page`](Self::fetch_page).
    pub async fn fetch_document(
        &self,
        identity: &str,
        credentials: &Credentials,
        url: &str,
    ) -> Result<FetchedResponse, PortalError> {
        self.fetch(identity, credentials, url, ResourceKind::Document)
            .await
    }

    #[instrument(skip(self, credentials), fields(identity = %identity))]
    async fn fetch(
        &self,
        identity: &str,
        credentials: &Credentials,
        url: &str,
        kind: ResourceKind,
    ) -> Result<FetchedResponse, PortalError> {
        let mut attempt = Attempt::Fresh;
        loop {
            let session = self.ensure_session(identity, credentials).await?;
            let cookie = session.cookie_header();
            let response = match kind {
                ResourceKind::Page => self.http.get_page(url, Some(&cookie)).await?,
                ResourceKind::Document => self.http.get_document(url, Some(&cookie)).await?,
            };

            if !self.config.is_login_page(&response.final_url) {
                debug!(?attempt, status = response.status, "authenticated fetch succeeded");
                return Ok(response);
            }

            self.sessions.clear(identity);
            match attempt.after_expiry() {
                Some(next) => {
                    warn!(final_url = %response.final_url, "redirected to login, re-authenticating");
                    attempt = next;
                }
                None => {
                    warn!(final_url = %response.final_url, "redirected to login after re-authentication");
                    return Err(PortalError::session_expired(url));
                }
            }
        }
    }

    async fn ensure_session(
        &self,
        identity: &str,
        credentials: &Credentials,
    ) -> Result<Session, PortalError> {
        if let Some(session) = self.sessions.valid_session(identity) {
            return Ok(session);
        }
        let session = self.authenticator.login(identity, credentials).await?;
        self.sessions.put_session(identity, session.clone());
        info!("session renewed");
        Ok(session)
    }
}
