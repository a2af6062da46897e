//! Shared User-Agent and browser-like request headers.
//!
//! The listing site and the member portal both sit behind basic bot filtering,
//! so every request (listing pages, login, exam pages, documents) presents the
//! same desktop browser identity.

/// Browser User-Agent sent on every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// `Accept` header for HTML page requests.
pub(crate) const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// `Accept` header for result document downloads.
pub(crate) const ACCEPT_DOCUMENT: &str = "application/pdf,application/octet-stream;q=0.9,*/*;q=0.8";

/// `Accept-Language` header; the portal serves Indonesian content.
pub(crate) const ACCEPT_LANGUAGE: &str = "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7";
