//! Deterministic ordering helpers.
//!
//! Output ordering is part of the report contract: issues follow the
//! ruleset's evaluation order, never message position or hash order.
//! These helpers remove duplicates without disturbing that order.

use std::collections::HashSet;
use std::hash::Hash;

use crate::rules::eval::TriggeredRule;

/// Keeps the first item for each key, preserving input order.
pub fn dedup_stable_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Drops triggered rules whose rendered message is byte-identical to an
/// earlier one.
pub fn dedup_triggered(rules: Vec<TriggeredRule>) -> Vec<TriggeredRule> {
    dedup_stable_by_key(rules, |r| r.message.clone())
}
