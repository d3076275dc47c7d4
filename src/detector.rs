use std::collections::HashSet;

use crate::types::{FetchResult, Identifier, SeenSet};

/// Result of comparing the persisted set with a fresh catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// True when nothing had been recorded yet; the listing is baselined instead of announced.
    pub is_first_run: bool,
    pub new_items: HashSet<Identifier>,
    pub updated_seen: SeenSet,
}

/// An empty `seen` counts as a first run, so a store that gets emptied re-baselines.
/// Identifiers that drop out of the catalog stay in the updated set.
pub fn detect(seen: &SeenSet, fetched: &FetchResult) -> Detection {
    if seen.is_empty() {
        return Detection { is_first_run: true, new_items: HashSet::new(), updated_seen: fetched.clone() };
    }
    let new_items: HashSet<Identifier> = fetched.difference(seen).cloned().collect();
    let mut updated_seen = seen.clone();
    updated_seen.extend(new_items.iter().cloned());
    Detection { is_first_run: false, new_items, updated_seen }
}
