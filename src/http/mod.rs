//! HTTP transport shared by the listing and portal paths.
//!
//! # Features
//!
//! - One constant browser-like User-Agent on every request
//! - Redirect-following GETs for pages and documents
//! - Non-following form POST so login cookies can be read off the redirect
//! - Bounded timeouts (10s connect, 30s pages, 2min documents by default)
//! - Body size limits enforced while streaming
//! - Per-host request pacing
//!
//! # Example
//!
//! ```no_run
//! use examwatch_core::http::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let page = client.get_page("https://example.com/berita", None).await?;
//! println!("{} bytes from {}", page.body.len(), page.final_url);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
pub mod rate_limiter;

pub use client::{FetchedResponse, HttpClient, HttpSettings};
pub use error::FetchError;
pub use rate_limiter::{RateLimiter, extract_host};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
