//! Listing page parsing.
//!
//! Entries are the anchors whose link matches the detail pattern. Parse
//! misses are empty results, never errors.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::entry::{Entry, normalize_id, sort_newest_first};
use super::error::ListingError;

/// Detail-link pattern used when none is configured.
pub const DEFAULT_DETAIL_PATTERN: &str = r"/detail/(\d+)";

#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector must parse"));

#[allow(clippy::expect_used)]
static DEFAULT_DETAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_DETAIL_PATTERN).expect("default detail pattern must compile"));

/// Extracts [`Entry`] values from listing HTML.
#[derive(Debug, Clone)]
pub struct ListingParser {
    detail_pattern: Regex,
}

impl Default for ListingParser {
    fn default() -> Self {
        Self {
            detail_pattern: DEFAULT_DETAIL_REGEX.clone(),
        }
    }
}

impl ListingParser {
    /// Creates a parser for a custom detail-link pattern.
    ///
    /// The first capture group must match the entry's numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::InvalidPattern`] if the regex does not compile and
    /// [`ListingError::MissingCaptureGroup`] if it has no capture group.
    pub fn new(pattern: &str) -> Result<Self, ListingError> {
        let detail_pattern = Regex::new(pattern).map_err(|source| ListingError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        if detail_pattern.captures_len() < 2 {
            return Err(ListingError::MissingCaptureGroup {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self { detail_pattern })
    }

    /// Returns the detail-link pattern.
    #[must_use]
    pub fn detail_pattern(&self) -> &str {
        self.detail_pattern.as_str()
    }

    /// Every matching anchor on the page, in document order, duplicates kept.
    #[must_use]
    pub fn entries_in(&self, html: &str, page_url: &Url) -> Vec<Entry> {
        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        for anchor in document.select(&ANCHOR_SELECTOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let url = page_url
                .join(href.trim())
                .map_or_else(|_| href.trim().to_string(), String::from);
            let Some(id) = self
                .detail_pattern
                .captures(&url)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
                .map(normalize_id)
            else {
                continue;
            };
            let title = collapse_whitespace(&anchor.text().collect::<String>());
            if title.is_empty() {
                trace!(id = %id, "skipping detail link without text");
                continue;
            }
            entries.push(Entry::new(id, title, url));
        }

        debug!(url = %page_url, matched = entries.len(), "listing page parsed");
        entries
    }

    /// Entries of one page, deduplicated (first wins) and newest first.
    #[must_use]
    pub fn parse(&self, html: &str, page_url: &Url) -> Vec<Entry> {
        let mut collector = EntryCollector::new();
        collector.extend(self.entries_in(html, page_url));
        collector.into_sorted()
    }
}

/// Accumulates entries across pages keyed by id; the first occurrence wins.
#[derive(Debug, Default)]
pub struct EntryCollector {
    entries: HashMap<String, Entry>,
}

impl EntryCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entries, keeping earlier ones on id collision. Returns how many were new.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = Entry>) -> usize {
        let mut added = 0;
        for entry in entries {
            if let std::collections::hash_map::Entry::Vacant(slot) =
                self.entries.entry(entry.id.clone())
            {
                slot.insert(entry);
                added += 1;
            }
        }
        added
    }

    /// Number of distinct ids collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the collector, returning entries sorted by descending numeric id.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.entries.into_values().collect();
        sort_newest_first(&mut entries);
        entries
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
