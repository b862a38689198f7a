// src/duplicates.rs

//! Duplicate resolution
//!
//! Linking a package never removes older builds of the same name, so after
//! an environment is populated it may hold several records per name. This
//! module decides which of them to retire so that one build per name remains.

use crate::dist::Dist;
use std::collections::{BTreeMap, BTreeSet};

/// Dists to remove so that only one build per package name remains
///
/// Builds listed in `keep` are never removed. For a name with several builds
/// and at least one of them in `keep`, every build not in `keep` goes. For a
/// name with several builds and none in `keep`, only the greatest
/// (lexicographically) stays. The result is sorted.
pub fn duplicates_to_remove<'a, I, K>(linked: I, keep: K) -> Vec<Dist>
where
    I: IntoIterator<Item = &'a Dist>,
    K: IntoIterator<Item = &'a Dist>,
{
    let keep: BTreeSet<&Dist> = keep.into_iter().collect();

    let mut by_name: BTreeMap<&str, BTreeSet<&Dist>> = BTreeMap::new();
    for dist in linked {
        by_name.entry(dist.name()).or_default().insert(dist);
    }

    let mut remove: BTreeSet<&Dist> = BTreeSet::new();
    for dists in by_name.values() {
        if dists.len() == 1 {
            continue;
        }
        if dists.iter().any(|d| keep.contains(d)) {
            remove.extend(dists.iter().copied().filter(|d| !keep.contains(d)));
        } else {
            // Sorted set: everything but the last
            remove.extend(dists.iter().copied().take(dists.len() - 1));
        }
    }

    remove.into_iter().cloned().collect()
}
