// src/diff.rs
//! Baseline diffing: which subdomains appeared since the last observation

use std::collections::BTreeSet;

/// Names present in `current` but absent from `known`.
///
/// Pure set subtraction; inputs are expected to be normalized already
/// (lower-cased, wildcard-free) by the fetcher and the store.
pub fn new_subdomains(known: &BTreeSet<String>, current: &BTreeSet<String>) -> BTreeSet<String> {
    current.difference(known).cloned().collect()
}
