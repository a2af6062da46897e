use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One normalized listing item.
///
/// Identity is `id`, a string of ASCII digits taken from the detail link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Numeric identifier from the detail link.
    pub id: String,
    /// Visible anchor text, whitespace-collapsed.
    pub title: String,
    /// Absolute URL of the detail page.
    pub url: String,
}

impl Entry {
    /// Creates an entry.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Compares two digit-string ids by numeric value, without overflow.
///
/// Leading zeros are ignored; a longer significant part is larger.
#[must_use]
pub fn compare_numeric_ids(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Canonical form of a digit-string id: leading zeros dropped, `"0"` kept.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    let trimmed = id.trim_start_matches('0');
    if trimmed.is_empty() && !id.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sorts entries by descending numeric id.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|x, y| compare_numeric_ids(&y.id, &x.id));
}
