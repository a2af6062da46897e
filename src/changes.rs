//! New-entry detection against the persisted seen set.

use std::collections::HashSet;

use crate::listing::Entry;

/// Entries of `current` whose id is not in `seen`, in their original order.
#[must_use]
pub fn new_entries(current: &[Entry], seen: &HashSet<String>) -> Vec<Entry> {
    current
        .iter()
        .filter(|entry| !seen.contains(&entry.id))
        .cloned()
        .collect()
}

/// The union of `seen` and the ids of `entries`, as a new set.
#[must_use]
pub fn mark_seen(seen: &HashSet<String>, entries: &[Entry]) -> HashSet<String> {
    let mut updated = seen.clone();
    updated.extend(entries.iter().map(|entry| entry.id.clone()));
    updated
}
