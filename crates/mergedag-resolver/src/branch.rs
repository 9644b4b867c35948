use std::collections::HashSet;

use mergedag_core::{Ident, MergeError, RelationMap, Result};

use crate::closure::with_dependencies;
use crate::relation::compute_relation_map;

/// Group `target` into dependency branches: a map from each branch root
/// (a deploy depending on nothing in `target`) to all of its transitive
/// dependents. Deploys untouched by the relation become roots with an
/// empty branch. `depends(a, b)` reads "a depends on b".
pub fn compute_branches<D, P>(target: &HashSet<D>, depends: P) -> Result<RelationMap<D>>
where
    D: Ident,
    P: FnMut(&D, &D) -> bool,
{
    // dep_map[s] = deploys in `target` directly depending on s.
    let dep_map = compute_relation_map(true, target, target, depends);
    let mut dependents: HashSet<D> = HashSet::new();
    for related in dep_map.values() {
        dependents.extend(related.iter().cloned());
    }

    let mut branches = RelationMap::new();
    let mut covered: HashSet<D> = HashSet::new();
    for root in dep_map.keys() {
        if dependents.contains(root) {
            // Interior node: folded into the branch of its own root.
            continue;
        }
        let seed: HashSet<D> = std::iter::once(root.clone()).collect();
        let mut branch = with_dependencies(&seed, &dep_map)?;
        branch.remove(root);
        covered.extend(branch.iter().cloned());
        covered.insert(root.clone());
        branches.insert(root.clone(), branch);
    }

    // A dependent unreachable from every root can only sit on a cycle.
    if let Some(stranded) = dependents.iter().filter(|d| !covered.contains(*d)).min() {
        return Err(MergeError::DependencyCycle(format!("{stranded:?}")));
    }

    for item in target {
        if !dep_map.contains_key(item) && !dependents.contains(item) {
            branches.insert(item.clone(), HashSet::new());
        }
    }
    Ok(branches)
}

/// Walk the bucket list in order, keeping each bucket's not-yet-taken
/// elements and claiming them, so later buckets shrink. Buckets left
/// empty are dropped.
pub fn partition_scope<D>(buckets: Vec<HashSet<D>>) -> Vec<HashSet<D>>
where
    D: Ident,
{
    let mut taken: HashSet<D> = HashSet::new();
    let mut partitions = Vec::new();
    for mut bucket in buckets {
        bucket.retain(|d| !taken.contains(d));
        if bucket.is_empty() {
            continue;
        }
        for item in &bucket {
            taken.insert(item.clone());
        }
        partitions.push(bucket);
    }
    partitions
}

/// Disjoint dependency branches, biggest first. Buckets (root included)
/// are ordered by descending size, then ascending root id, and fed to
/// [`partition_scope`].
pub fn compute_greedy_non_intersecting_branches<D, P>(
    target: &HashSet<D>,
    depends: P,
) -> Result<Vec<HashSet<D>>>
where
    D: Ident,
    P: FnMut(&D, &D) -> bool,
{
    let branches = compute_branches(target, depends)?;
    let mut ordered: Vec<(D, HashSet<D>)> = branches.into_iter().collect();
    ordered.sort_by(|(root_a, branch_a), (root_b, branch_b)| {
        branch_b
            .len()
            .cmp(&branch_a.len())
            .then_with(|| root_a.cmp(root_b))
    });

    let buckets = ordered
        .into_iter()
        .map(|(root, mut branch)| {
            branch.insert(root);
            branch
        })
        .collect();
    Ok(partition_scope(buckets))
}
