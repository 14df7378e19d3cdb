//! Merge a fresh scan with the persisted snapshot.
//!
//! Curation (title, featured flag and rank, custom position) is carried over
//! by identity. Records whose source vanished are dropped, and new items are
//! appended after every previously ordered record, in scan order.

use crate::config::OrderConfig;
use crate::models::{Artwork, ScanEntry};
use crate::order::ArtList;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// The merged catalog plus pass counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub artworks: ArtList,
    /// Scanned items that matched a persisted record.
    pub matched: usize,
    /// Scanned items with no persisted record.
    pub added: usize,
    /// Persisted records with no scanned item.
    pub dropped: usize,
    /// Scanned items skipped because their identity was already seen.
    pub duplicates: usize,
}

/// Build the catalog from `entries` (in scan order) and the persisted
/// records keyed by identity.
///
/// Matched records keep their persisted order. Items with no persisted
/// record sort after every matched one, in scan order, even when their scan
/// position comes first; a new file never jumps ahead of curated items.
///
/// The first occurrence of an identity wins; later ones are skipped and
/// counted. The result always has dense ids and featured ranks.
pub fn reconcile<'a>(
    existing: &HashMap<String, Artwork>,
    entries: impl IntoIterator<Item = &'a ScanEntry>,
) -> Reconciliation {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<(u64, Artwork)> = Vec::new();
    let mut matched = 0;
    let mut added = 0;
    let mut duplicates = 0;

    for entry in entries {
        let key = entry.identity();
        if seen.contains(&key) {
            warn!("Skipping duplicate item {}", key);
            duplicates += 1;
            continue;
        }

        let mut art = Artwork::from_scan(entry, merged.len() as u64 + 1);
        let mut sort_key = OrderConfig::UNASSIGNED_ID;

        match existing.get(&key) {
            Some(previous) => {
                art.title = previous.title.clone();
                art.featured = previous.featured;
                art.featured_rank = previous.featured_rank;
                if previous.id != 0 {
                    art.id = previous.id;
                    sort_key = previous.id;
                }
                matched += 1;
            }
            None => {
                debug!("New item {}", key);
                added += 1;
            }
        }

        seen.insert(key);
        merged.push((sort_key, art));
    }

    // Stable: equal keys (all new items) keep scan order.
    merged.sort_by_key(|(key, _)| *key);

    let dropped = existing.keys().filter(|k| !seen.contains(*k)).count();
    let artworks = ArtList::from_artworks(merged.into_iter().map(|(_, art)| art).collect());

    info!(
        "Reconciled {} items ({} matched, {} new, {} dropped, {} duplicates)",
        artworks.len(),
        matched,
        added,
        dropped,
        duplicates
    );

    Reconciliation {
        artworks,
        matched,
        added,
        dropped,
        duplicates,
    }
}
