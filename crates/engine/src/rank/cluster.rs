// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diversity clustering of primary values.
//!
//! Entries whose normalized primaries are similar get grouped through a
//! union-find, so similarity is transitively closed: if A~B and B~C then
//! A, B, C share one cluster.

use std::collections::BTreeMap;

/// Minimum shared-prefix length for the prefix rule.
const MIN_PREFIX: usize = 4;
/// Fraction of the shorter string a shared prefix must cover.
const PREFIX_RATIO: f64 = 0.70;

/// Normalize a primary value for similarity comparison:
/// lowercase, strip a parenthetical suffix, strip everything after the
/// first ` via ` / ` - ` / ` -- ` separator, keep only letters, digits
/// and spaces, collapse whitespace.
pub(crate) fn normalize_primary(raw: &str) -> String {
    let mut s = raw.to_lowercase();
    if let Some(idx) = s.find('(') {
        s.truncate(idx);
    }
    let sep_idx = [" via ", " -- ", " - "]
        .iter()
        .filter_map(|sep| s.find(sep))
        .min();
    if let Some(idx) = sep_idx {
        s.truncate(idx);
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Two normalized primaries are similar when they are equal, one contains
/// the other, or they share a common prefix covering at least 70 % of the
/// shorter one (minimum 4 chars).
pub(crate) fn similar(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b || a.contains(b) || b.contains(a) {
        return true;
    }
    let prefix = common_prefix_chars(a, b);
    let shorter = a.chars().count().min(b.chars().count());
    prefix >= MIN_PREFIX && prefix as f64 >= PREFIX_RATIO * shorter as f64
}

fn common_prefix_chars(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Union-find with path compression over entry indices.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Cluster normalized primaries over all pairs. Returns index groups in
/// deterministic order (singletons included; callers usually care about
/// groups of size > 1).
pub(crate) fn clusters(normed: &[String]) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(normed.len());
    for i in 0..normed.len() {
        for j in (i + 1)..normed.len() {
            if similar(&normed[i], &normed[j]) {
                uf.union(i, j);
            }
        }
    }
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..normed.len() {
        groups.entry(uf.find(i)).or_default().push(i);
    }
    groups.into_values().collect()
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
