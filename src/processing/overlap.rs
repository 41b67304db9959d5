//! Overlapping route detection and pruning.
//!
//! A route that is fully covered by a broader route adds nothing; it is dropped
//! so the installed route table stays minimal.

use crate::models::{contains, Ipv4Cidr};
use itertools::Itertools;

/// Remove every subnet already covered by a broader subnet in the list.
///
/// Input is expected canonical and de-duplicated. Subnets are ordered broadest
/// first, then each pair is checked once; the narrower member of a containing
/// pair is marked removed. Equal-length prefixes never prune each other.
///
/// # Returns
/// Surviving subnets, broadest first.
pub fn prune_overlapping(subnets: Vec<Ipv4Cidr>) -> Vec<Ipv4Cidr> {
    let sorted: Vec<Ipv4Cidr> = subnets
        .into_iter()
        .sorted_by_key(|s| (s.mask, s.addr))
        .collect();
    let mut removed = vec![false; sorted.len()];

    for i in 0..sorted.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..sorted.len() {
            if removed[j] || sorted[i].mask == sorted[j].mask {
                continue;
            }
            if contains(&sorted[i], &sorted[j]) {
                log::debug!("Pruning route {} - covered by {}", sorted[j], sorted[i]);
                removed[j] = true;
            }
        }
    }

    sorted
        .into_iter()
        .zip(removed)
        .filter_map(|(s, r)| (!r).then_some(s))
        .collect()
}

/// True when no element of `routes` covers another.
pub fn is_minimal(routes: &[Ipv4Cidr]) -> bool {
    routes
        .iter()
        .tuple_combinations()
        .all(|(a, b)| a == b || !contains(a, b))
}
