//! Per-identity session cache.

use std::fmt;
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::{debug, instrument};

use super::{VALIDITY_MARGIN, session_cookie_header};

/// A portal session token and its expiry.
///
/// The token is redacted in Debug output; it grants account access.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    expires_at: SystemTime,
}

impl Session {
    /// Creates a session from a token and its expiry instant.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Returns the raw session token.
    ///
    /// Tokens are sensitive; do not log the return value.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns when the server is assumed to expire this session.
    #[must_use]
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Valid iff `now < expires_at - VALIDITY_MARGIN`.
    #[must_use]
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        self.expires_at
            .checked_sub(VALIDITY_MARGIN)
            .is_some_and(|cutoff| now < cutoff)
    }

    /// Returns the `Cookie` header value that carries this session.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        session_cookie_header(&self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Concurrent per-identity session cache.
///
/// Backed by a sharded `DashMap`: operations on distinct identities do not
/// contend, and operations on one identity are serialized by its shard lock.
/// Racing renewals for the same identity resolve last-writer-wins. Stale
/// entries are never evicted; the next renewal overwrites them.
///
/// Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token for `identity`, valid or not.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<String> {
        self.sessions
            .get(identity)
            .map(|entry| entry.token().to_string())
    }

    /// Returns the cached token for `identity` only if it is valid now.
    #[must_use]
    pub fn valid_token(&self, identity: &str) -> Option<String> {
        self.valid_session(identity)
            .map(|session| session.token().to_string())
    }

    /// Returns the cached session for `identity` if it is valid now.
    #[must_use]
    pub fn valid_session(&self, identity: &str) -> Option<Session> {
        self.valid_session_at(identity, SystemTime::now())
    }

    /// Returns the cached session for `identity` if it is valid at `now`.
    #[must_use]
    pub fn valid_session_at(&self, identity: &str, now: SystemTime) -> Option<Session> {
        self.sessions
            .get(identity)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.value().clone())
    }

    /// Stores a token for `identity`, replacing any previous session.
    #[instrument(skip(self, token), fields(identity = %identity))]
    pub fn put(&self, identity: &str, token: impl Into<String>, expires_at: SystemTime) {
        self.put_session(identity, Session::new(token, expires_at));
    }

    /// Stores a session for `identity`, replacing any previous one.
    #[instrument(skip(self, session), fields(identity = %identity))]
    pub fn put_session(&self, identity: &str, session: Session) {
        let replaced = self.sessions.insert(identity.to_string(), session).is_some();
        debug!(replaced, "session stored");
    }

    /// Drops the session for `identity`. Returns whether one was present.
    #[instrument(skip(self), fields(identity = %identity))]
    pub fn clear(&self, identity: &str) -> bool {
        let removed = self.sessions.remove(identity).is_some();
        debug!(removed, "session cleared");
        removed
    }

    /// Whether `identity` has a session that is valid now.
    #[must_use]
    pub fn is_valid(&self, identity: &str) -> bool {
        self.is_valid_at(identity, SystemTime::now())
    }

    /// Whether `identity` has a session that is valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, identity: &str, now: SystemTime) -> bool {
        self.sessions
            .get(identity)
            .is_some_and(|entry| entry.is_valid_at(now))
    }

    /// Number of identities with a cached session (valid or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::SESSION_LIFETIME;

    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fresh_session_valid_until_margin() {
        let now = SystemTime::now();
        let store = SessionStore::new();
        store.put("alice", "tok", now + SESSION_LIFETIME);

        assert!(store.is_valid_at("alice", now));

        let just_before = now + SESSION_LIFETIME - VALIDITY_MARGIN - Duration::from_secs(1);
        assert!(store.is_valid_at("alice", just_before));

        let at_cutoff = now + SESSION_LIFETIME - VALIDITY_MARGIN;
        assert!(!store.is_valid_at("alice", at_cutoff));

        let after_expiry = now + SESSION_LIFETIME + Duration::from_secs(1);
        assert!(!store.is_valid_at("alice", after_expiry));
    }

    #[test]
    fn test_session_expiring_inside_margin_is_invalid_immediately() {
        let now = SystemTime::now();
        let session = Session::new("tok", now + Duration::from_secs(120));
        assert!(!session.is_valid_at(now));
    }

    #[test]
    fn test_unknown_identity_is_invalid_and_absent() {
        let store = SessionStore::new();
        assert!(!store.is_valid("nobody"));
        assert_eq!(store.get("nobody"), None);
        assert!(store.valid_session("nobody").is_none());
    }

    #[test]
    fn test_get_returns_token_even_when_stale() {
        let now = SystemTime::now();
        let store = SessionStore::new();
        store.put("alice", "old", now + Duration::from_secs(10));

        assert_eq!(store.get("alice").as_deref(), Some("old"));
        assert!(store.valid_session_at("alice", now).is_none());
        assert_eq!(store.valid_token("alice"), None);
    }

    #[test]
    fn test_put_overwrites_and_clear_removes() {
        let expires = SystemTime::now() + SESSION_LIFETIME;
        let store = SessionStore::new();
        store.put("alice", "first", expires);
        store.put("alice", "second", expires);
        assert_eq!(store.get("alice").as_deref(), Some("second"));
        assert_eq!(store.len(), 1);

        assert!(store.clear("alice"));
        assert!(!store.clear("alice"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("super-secret-token", SystemTime::now());
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret-token"), "{debug}");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_cookie_header_uses_session_cookie_name() {
        let session = Session::new("abc", SystemTime::now());
        assert_eq!(session.cookie_header(), "ci_session=abc");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_identities_do_not_interfere() {
        let store = Arc::new(SessionStore::new());
        let expires = SystemTime::now() + SESSION_LIFETIME;

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let identity = format!("user-{i}");
                for round in 0..50 {
                    store.put(&identity, format!("{identity}-{round}"), expires);
                    assert!(store.is_valid(&identity));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 64);
        for i in 0..64 {
            assert_eq!(
                store.get(&format!("user-{i}")),
                Some(format!("user-{i}-49"))
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_renewals_leave_one_valid_session() {
        let store = Arc::new(SessionStore::new());
        let expires = SystemTime::now() + SESSION_LIFETIME;

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put("shared", format!("token-{i}"), expires);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let token = store.get("shared").unwrap();
        assert!(token.starts_with("token-"));
        assert!(store.is_valid("shared"));
        assert_eq!(store.len(), 1);
    }
}
