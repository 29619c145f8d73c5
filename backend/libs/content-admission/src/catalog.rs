// ============================================
// Catalog & Item Selection
// ============================================
//
// The catalog itself is supplied by an external collaborator (feed fetchers,
// channel lists, ...). This module only holds it in memory and implements the
// selection side of the dedup contract: never pick an id that is still in the
// (user, category) recent window.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{Category, EngagementRecord};
use crate::random::RandomSource;

/// A candidate piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub category: Category,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, category: Category, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            title: title.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Candidate items grouped by category.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: BTreeMap<Category, Vec<CatalogItem>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// Add an item; an item with the same id in the same category is replaced.
    pub fn insert(&mut self, item: CatalogItem) {
        let slot = self.items.entry(item.category.clone()).or_default();
        match slot.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => slot.push(item),
        }
    }

    pub fn items(&self, category: &Category) -> &[CatalogItem] {
        self.items.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Picks an item for an admitted category, skipping recently shown ids.
pub struct ItemSelector;

impl ItemSelector {
    /// Ids of `candidates` not present in `record`'s recent window.
    pub fn eligible<'a>(
        candidates: &'a [CatalogItem],
        record: Option<&EngagementRecord>,
    ) -> Vec<&'a CatalogItem> {
        candidates
            .iter()
            .filter(|item| record.map_or(true, |r| !r.was_recently_shown(&item.id)))
            .collect()
    }

    /// Uniformly choose one eligible item, or `None` when all were shown recently.
    pub fn select<'a, R: RandomSource + ?Sized>(
        candidates: &'a [CatalogItem],
        record: Option<&EngagementRecord>,
        random: &R,
    ) -> Option<&'a CatalogItem> {
        let eligible = Self::eligible(candidates, record);
        if eligible.is_empty() {
            debug!(
                candidates = candidates.len(),
                "No eligible item outside the recent window"
            );
            return None;
        }

        let idx = random.next_index(eligible.len());
        eligible.get(idx).copied()
    }
}
