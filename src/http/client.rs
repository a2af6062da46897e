//! HTTP client wrapper shared by the listing and portal paths.
//!
//! `HttpClient` owns two `reqwest` clients built from the same policy: one that
//! follows redirects (page and document GETs) and one that never does (login
//! POST, where the session cookie must be read from the redirect response
//! itself). Both are connection-pooled and cheap to clone.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER,
};
use reqwest::{Client, ClientBuilder, redirect};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{
    CONNECT_TIMEOUT_SECS, DOCUMENT_TIMEOUT_SECS, MAX_DOCUMENT_BYTES, MAX_PAGE_BYTES,
    MAX_REDIRECTS, REQUEST_TIMEOUT_SECS,
};
use super::error::FetchError;
use crate::user_agent;

/// Timeout and size policy for [`HttpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout for pages and login.
    pub request_timeout: Duration,
    /// Whole-request timeout for result documents.
    pub document_timeout: Duration,
    /// Largest HTML body accepted.
    pub max_page_bytes: u64,
    /// Largest document body accepted.
    pub max_document_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            document_timeout: Duration::from_secs(DOCUMENT_TIMEOUT_SECS),
            max_page_bytes: MAX_PAGE_BYTES,
            max_document_bytes: MAX_DOCUMENT_BYTES,
        }
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Status code of the final response.
    pub status: u16,
    /// URL of the final response, after any redirects that were followed.
    pub final_url: Url,
    /// Response headers of the final response.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// Body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the status is 3xx.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// All values of the named header that are valid visible ASCII.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
    }
}

/// HTTP client for listing pages, the login exchange and authenticated resources.
///
/// Create once and share; clones reuse the same connection pools.
#[derive(Debug, Clone)]
pub struct HttpClient {
    following: Client,
    non_following: Client,
    settings: HttpSettings,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static default
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_settings(HttpSettings::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with explicit timeouts and limits.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialised.
    pub fn with_settings(settings: HttpSettings) -> Result<Self, FetchError> {
        let following = base_client_builder(&settings)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::from_reqwest("<client>", e))?;
        let non_following = base_client_builder(&settings)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::from_reqwest("<client>", e))?;
        Ok(Self {
            following,
            non_following,
            settings,
        })
    }

    /// Returns the timeout and size policy in use.
    #[must_use]
    pub fn settings(&self) -> HttpSettings {
        self.settings
    }

    /// GETs an HTML page, following redirects.
    ///
    /// `cookie` is sent verbatim as the `Cookie` header when present.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for invalid URLs, network failures, timeouts,
    /// non-2xx final responses and oversized bodies.
    #[instrument(skip(self, cookie), fields(url = %url, with_cookie = cookie.is_some()))]
    pub async fn get_page(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<FetchedResponse, FetchError> {
        let parsed = parse_url(url)?;
        let mut request = self
            .following
            .get(parsed)
            .header(ACCEPT, user_agent::ACCEPT_HTML);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let fetched = read_response(response, url, self.settings.max_page_bytes).await?;
        ensure_success(&fetched, url)?;
        debug!(
            status = fetched.status,
            final_url = %fetched.final_url,
            bytes = fetched.body.len(),
            "page fetched"
        );
        Ok(fetched)
    }

    /// GETs a binary document, following redirects, with the document timeout.
    ///
    /// # Errors
    ///
    /// Same as [`get_page`](Self::get_page), with the document size limit.
    #[instrument(skip(self, cookie), fields(url = %url, with_cookie = cookie.is_some()))]
    pub async fn get_document(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<FetchedResponse, FetchError> {
        let parsed = parse_url(url)?;
        let mut request = self
            .following
            .get(parsed)
            .timeout(self.settings.document_timeout)
            .header(ACCEPT, user_agent::ACCEPT_DOCUMENT);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let fetched = read_response(response, url, self.settings.max_document_bytes).await?;
        ensure_success(&fetched, url)?;
        debug!(
            status = fetched.status,
            final_url = %fetched.final_url,
            bytes = fetched.body.len(),
            "document fetched"
        );
        Ok(fetched)
    }

    /// POSTs a URL-encoded form without following redirects.
    ///
    /// Any status is returned as-is: a 3xx is the expected outcome of a
    /// successful login, and deciding what a 200 or 4xx means is up to the caller.
    /// `Origin` is derived from `url`; `Referer` is sent when given.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] only for invalid URLs, network failures, timeouts
    /// and oversized bodies.
    #[instrument(skip(self, form), fields(url = %url))]
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        referer: Option<&str>,
    ) -> Result<FetchedResponse, FetchError> {
        let parsed = parse_url(url)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter().copied())
            .finish();
        let mut request = self
            .non_following
            .post(parsed.clone())
            .header(ACCEPT, user_agent::ACCEPT_HTML)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ORIGIN, parsed.origin().ascii_serialization());
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let fetched = read_response(response, url, self.settings.max_page_bytes).await?;
        debug!(status = fetched.status, "form posted");
        Ok(fetched)
    }
}

fn base_client_builder(settings: &HttpSettings) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(user_agent::ACCEPT_LANGUAGE),
    );
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .gzip(true)
        .user_agent(user_agent::BROWSER_USER_AGENT)
        .default_headers(headers)
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(parsed)
    } else {
        Err(FetchError::invalid_url(url))
    }
}

fn ensure_success(response: &FetchedResponse, url: &str) -> Result<(), FetchError> {
    if (200..300).contains(&response.status) {
        Ok(())
    } else {
        Err(FetchError::http_status(url, response.status))
    }
}

/// Streams the body into memory, enforcing `limit`.
async fn read_response(
    response: reqwest::Response,
    url: &str,
    limit: u64,
) -> Result<FetchedResponse, FetchError> {
    if response.content_length().is_some_and(|len| len > limit) {
        return Err(FetchError::too_large(url, limit));
    }

    let status = response.status().as_u16();
    let final_url = response.url().clone();
    let headers = response.headers().clone();

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::from_reqwest(url, e))?;
        if body.len() as u64 + chunk.len() as u64 > limit {
            return Err(FetchError::too_large(url, limit));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(FetchedResponse {
        status,
        final_url,
        headers,
        body,
    })
}
