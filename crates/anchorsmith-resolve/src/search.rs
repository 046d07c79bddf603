//! Topic search over an existing live-link table.

use std::collections::HashSet;

use anchorsmith_core::{LinkHit, LinkRow};

/// Rows whose topic or URL contains `topic` (case-insensitive), as
/// `(url, anchor)` hits deduplicated in first-seen order.
pub fn search_links(rows: &[LinkRow], topic: &str) -> Vec<LinkHit> {
    let needle = topic.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| !row.url.is_empty())
        .filter(|row| {
            row.topic.to_lowercase().contains(&needle) || row.url.to_lowercase().contains(&needle)
        })
        .map(|row| LinkHit {
            url: row.url.clone(),
            anchor: row.anchor.clone(),
        })
        .filter(|hit| seen.insert(hit.clone()))
        .collect()
}
