//! Constants for the HTTP transport (timeouts, body limits).

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default timeout for listing, login and exam page requests (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default timeout for result document downloads (2 minutes, documents can be large).
pub const DOCUMENT_TIMEOUT_SECS: u64 = 120;

/// Maximum HTML page body accepted (5 MiB).
pub const MAX_PAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Maximum result document body accepted (25 MiB).
pub const MAX_DOCUMENT_BYTES: u64 = 25 * 1024 * 1024;

/// Redirect hops followed for GET requests.
pub const MAX_REDIRECTS: usize = 10;
