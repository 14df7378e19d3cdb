//! Custom order and featured ranks.
//!
//! [`ArtList`] is the single owner of the ordered artwork records. Every
//! mutation ends by renumbering, so these hold whenever control returns to
//! the caller:
//!
//! - `id` runs 1..N in list order;
//! - `featured_rank` is set exactly on featured items and runs 1..K in list
//!   order.
//!
//! Callers address rows by index (or look one up by identity); they never
//! hold a second copy of a record.

use crate::models::Artwork;
use crate::{ArtdexError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Bulk re-sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// Current custom order (by `id`).
    Custom,
    /// Newest first.
    DateDesc,
    /// Oldest first.
    DateAsc,
    /// File name A to Z.
    NameAsc,
    /// File name Z to A.
    NameDesc,
    /// Title A to Z.
    TitleAsc,
    /// Title Z to A.
    TitleDesc,
    /// Featured items by rank, everything else after them.
    Featured,
}

impl SortMode {
    pub const ALL: [SortMode; 8] = [
        SortMode::Custom,
        SortMode::DateDesc,
        SortMode::DateAsc,
        SortMode::NameAsc,
        SortMode::NameDesc,
        SortMode::TitleAsc,
        SortMode::TitleDesc,
        SortMode::Featured,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Custom => "custom",
            SortMode::DateDesc => "date-desc",
            SortMode::DateAsc => "date-asc",
            SortMode::NameAsc => "name-asc",
            SortMode::NameDesc => "name-desc",
            SortMode::TitleAsc => "title-asc",
            SortMode::TitleDesc => "title-desc",
            SortMode::Featured => "featured",
        }
    }

    fn compare(&self, a: &Artwork, b: &Artwork) -> Ordering {
        match self {
            SortMode::Custom => a.id.cmp(&b.id),
            SortMode::DateDesc => b.date.total_cmp(&a.date),
            SortMode::DateAsc => a.date.total_cmp(&b.date),
            SortMode::NameAsc => a.fname.to_lowercase().cmp(&b.fname.to_lowercase()),
            SortMode::NameDesc => b.fname.to_lowercase().cmp(&a.fname.to_lowercase()),
            SortMode::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortMode::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
            SortMode::Featured => featured_key(a).cmp(&featured_key(b)),
        }
    }
}

fn featured_key(art: &Artwork) -> (bool, u32) {
    match art.featured_rank {
        Some(rank) if art.featured => (false, rank),
        _ => (true, u32::MAX),
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ArtdexError;

    fn from_str(s: &str) -> Result<Self> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ArtdexError::Config {
                message: format!(
                    "unknown sort mode '{}', expected one of: {}",
                    s,
                    SortMode::ALL.map(|m| m.as_str()).join(", ")
                ),
            })
    }
}

/// Ordered artwork records with dense ids and featured ranks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtList {
    items: Vec<Artwork>,
}

impl ArtList {
    /// Take ownership of records in their current order and renumber them.
    pub fn from_artworks(items: Vec<Artwork>) -> Self {
        let mut list = Self { items };
        list.normalize();
        list
    }

    pub fn as_slice(&self) -> &[Artwork] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Artwork> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artwork> {
        self.items.iter()
    }

    /// Index of the record with this identity.
    pub fn position(&self, identity: &str) -> Option<usize> {
        self.items.iter().position(|a| a.identity() == identity)
    }

    /// Index by identity, falling back to the first record with this file
    /// name.
    pub fn find(&self, key: &str) -> Option<usize> {
        self.position(key)
            .or_else(|| self.items.iter().position(|a| a.fname == key))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ArtdexError::InvalidIndex {
                index,
                len: self.items.len(),
            })
        }
    }

    /// Move one record by `offset` positions, clamped to the list bounds.
    /// Returns the record's new index.
    pub fn move_by(&mut self, index: usize, offset: isize) -> Result<usize> {
        self.check_index(index)?;
        let last = self.items.len() - 1;
        let target = index.saturating_add_signed(offset).min(last);
        if target != index {
            let art = self.items.remove(index);
            self.items.insert(target, art);
            self.normalize();
            debug!("Moved item {} to {}", index, target);
        }
        Ok(target)
    }

    /// Move a featured record within the featured subsequence by `offset`
    /// (clamped). Only featured slots change hands; every non-featured record
    /// keeps its position. Returns the record's new index, or `None` when the
    /// record is not featured.
    pub fn move_featured(&mut self, index: usize, offset: isize) -> Result<Option<usize>> {
        self.check_index(index)?;
        if !self.items[index].featured {
            return Ok(None);
        }

        let slots: Vec<usize> = (0..self.items.len())
            .filter(|&i| self.items[i].featured)
            .collect();
        let Some(from) = slots.iter().position(|&i| i == index) else {
            return Ok(None);
        };
        let to = from.saturating_add_signed(offset).min(slots.len() - 1);
        if to == from {
            return Ok(Some(index));
        }

        let mut featured: Vec<Artwork> = slots.iter().map(|&i| self.items[i].clone()).collect();
        let moved = featured.remove(from);
        featured.insert(to, moved);
        for (slot, art) in slots.iter().zip(featured) {
            self.items[*slot] = art;
        }
        self.normalize();
        debug!("Moved featured item from rank {} to {}", from + 1, to + 1);
        Ok(Some(slots[to]))
    }

    /// Set the featured flag; ranks are recomputed from list position.
    pub fn set_featured(&mut self, index: usize, featured: bool) -> Result<()> {
        self.check_index(index)?;
        self.items[index].featured = featured;
        self.normalize();
        Ok(())
    }

    /// Flip the featured flag, returning the new value.
    pub fn toggle_featured(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let featured = !self.items[index].featured;
        self.set_featured(index, featured)?;
        Ok(featured)
    }

    pub fn set_title(&mut self, index: usize, title: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.items[index].title = title.into();
        Ok(())
    }

    /// Stable re-sort; ids and ranks are reassigned from the new order.
    pub fn sort(&mut self, mode: SortMode) {
        self.items.sort_by(|a, b| mode.compare(a, b));
        self.normalize();
        debug!("Sorted {} items by {}", self.items.len(), mode);
    }

    /// Indices of records whose title or file name contains `query`
    /// (case-insensitive), optionally restricted to featured records.
    pub fn filter(&self, query: &str, featured_only: bool) -> Vec<usize> {
        let query = query.trim().to_lowercase();
        self.items
            .iter()
            .enumerate()
            .filter(|(_, a)| !featured_only || a.featured)
            .filter(|(_, a)| {
                query.is_empty()
                    || a.title.to_lowercase().contains(&query)
                    || a.fname.to_lowercase().contains(&query)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether ids and featured ranks are dense and follow list order.
    pub fn check_invariants(&self) -> bool {
        let mut next_rank = 1;
        for (i, art) in self.items.iter().enumerate() {
            if art.id != i as u64 + 1 {
                return false;
            }
            match (art.featured, art.featured_rank) {
                (true, Some(rank)) if rank == next_rank => next_rank += 1,
                (false, None) => {}
                _ => return false,
            }
        }
        true
    }

    /// Mutable access for in-place record rewrites that keep order and
    /// featured flags (export relocation).
    pub(crate) fn records_mut(&mut self) -> &mut [Artwork] {
        &mut self.items
    }

    /// Renumber ids 1..N and featured ranks 1..K from list order.
    pub(crate) fn normalize(&mut self) {
        let mut rank = 1;
        for (i, art) in self.items.iter_mut().enumerate() {
            art.id = i as u64 + 1;
            if art.featured {
                art.featured_rank = Some(rank);
                rank += 1;
            } else {
                art.featured_rank = None;
            }
        }
        debug_assert!(self.check_invariants());
    }
}

impl<'a> IntoIterator for &'a ArtList {
    type Item = &'a Artwork;
    type IntoIter = std::slice::Iter<'a, Artwork>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
