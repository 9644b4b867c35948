use std::collections::{BTreeSet, HashSet};

use mergedag_core::Ident;

/// Choose the rejection option minimizing, lexicographically: total
/// cost, then cardinality, then the elements themselves in ascending
/// order (the last key exists purely for determinism). Empty input
/// yields the empty rejection.
pub fn compute_optimal_rejection<D, C>(options: &HashSet<BTreeSet<D>>, mut cost: C) -> BTreeSet<D>
where
    D: Ident,
    C: FnMut(&D) -> u64,
{
    options
        .iter()
        .map(|option| {
            let total: u128 = option.iter().map(|deploy| cost(deploy) as u128).sum();
            (total, option.len(), option)
        })
        .min()
        .map(|(_, _, option)| option.clone())
        .unwrap_or_default()
}
