//! Session acquisition and caching for the member portal.
//!
//! The portal uses a cookie-based login: a form POST answered by a redirect
//! that carries a `ci_session` cookie. This module provides:
//!
//! - [`SessionStore`] - per-identity token cache with expiry-aware validity
//! - [`Authenticator`] - the login exchange that produces a [`Session`]
//! - [`Credentials`] - an opaque username/password pair
//! - Set-Cookie scanning helpers

mod authenticator;
mod cookies;
mod credentials;
mod error;
mod store;

use std::time::Duration;

pub use authenticator::{Authenticator, LoginForm};
pub use cookies::{find_cookie, session_cookie_header};
pub use credentials::Credentials;
pub use error::AuthError;
pub use store::{Session, SessionStore};

/// Name of the portal's session cookie.
pub const SESSION_COOKIE_NAME: &str = "ci_session";

/// Lifetime assumed for a freshly issued session (10 hours).
pub const SESSION_LIFETIME: Duration = Duration::from_secs(36_000);

/// Safety margin subtracted from the expiry before a session is considered stale (5 minutes).
pub const VALIDITY_MARGIN: Duration = Duration::from_secs(300);
