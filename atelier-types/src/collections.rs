//! Dedup and selection helpers over keyed sequences.

use std::collections::HashSet;
use std::hash::Hash;

/// Appends items from `incoming` whose key is not yet present in `target`.
///
/// Duplicates inside `incoming` are also collapsed, first occurrence wins.
/// Existing entries are never modified. Returns the appended items, in order.
pub fn push_unique<T, K, F>(target: &mut Vec<T>, incoming: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen: HashSet<K> = target.iter().map(&key).collect();
    let mut added = Vec::new();
    for item in incoming {
        if seen.insert(key(&item)) {
            added.push(item.clone());
            target.push(item);
        }
    }
    added
}

/// Returns the item with the smallest key, or `None` for an empty slice.
///
/// On ties the first such item is returned.
pub fn min_by_key<T, K, F>(items: &[T], key: F) -> Option<&T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.iter().min_by_key(|item| key(*item))
}
