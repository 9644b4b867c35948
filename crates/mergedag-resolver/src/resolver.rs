use std::collections::{HashMap, HashSet};

use tracing::debug;

use mergedag_core::{ChannelDiffs, Ident, RelationMap, Resolution, ResolverConfig, Result};

use crate::closure::with_dependencies;
use crate::mergeable::add_overflow_rejections_with;
use crate::optimal::compute_optimal_rejection;
use crate::rejection::{approximate_rejection_option, compute_rejection_options};
use crate::relation::compute_relation_map;
use crate::scope::conflict_scope;

/// Deploys already settled by finalization.
#[derive(Debug, Clone, Copy)]
pub struct FinalizedSet<'a, D: Ident> {
    pub accepted: &'a HashSet<D>,
    pub rejected: &'a HashSet<D>,
}

/// Channel balances at the fringe plus the per-deploy diffs against them.
#[derive(Debug, Clone, Copy)]
pub struct MergeableState<'a, D: Ident, Ch: Ident> {
    pub init_values: &'a HashMap<Ch, i64>,
    pub diffs: &'a HashMap<D, ChannelDiffs<Ch>>,
}

/// Deploys that cannot stand together with the finalized state: anything
/// conflicting with a finally-accepted deploy, plus anything depending
/// on a finally-rejected one.
pub fn incompatible_with_final<D>(
    accepted_finally: &HashSet<D>,
    rejected_finally: &HashSet<D>,
    conflicts_map: &RelationMap<D>,
    dependency_map: &RelationMap<D>,
) -> HashSet<D>
where
    D: Ident,
{
    let mut incompatible = HashSet::new();
    for accepted in accepted_finally {
        if let Some(conflicting) = conflicts_map.get(accepted) {
            incompatible.extend(conflicting.iter().cloned());
        }
    }
    for rejected in rejected_finally {
        if let Some(dependents) = dependency_map.get(rejected) {
            incompatible.extend(dependents.iter().cloned());
        }
    }
    incompatible
}

/// Resolve a conflict set whose enforced rejections are already known.
///
/// Builds the dependency-expanded conflict map over the compatible
/// deploys, enumerates rejection options per the configured strategy,
/// augments them with channel-arithmetic rejections and picks the
/// lexicographic optimum. The result partitions `conflict_set`.
#[allow(clippy::too_many_arguments)]
pub fn resolve_conflict_set<D, Ch, CF, DF, C>(
    conflict_set: &HashSet<D>,
    enforce_rejected: &HashSet<D>,
    mut conflicts: CF,
    mut depends: DF,
    cost: C,
    mergeable: &MergeableState<'_, D, Ch>,
    config: &ResolverConfig,
) -> Result<Resolution<D>>
where
    D: Ident + Send + Sync,
    Ch: Ident,
    CF: FnMut(&D, &D) -> bool,
    DF: FnMut(&D, &D) -> bool,
    C: FnMut(&D) -> u64,
{
    let deps_within = compute_relation_map(true, conflict_set, conflict_set, &mut depends);
    let conflicts_within = compute_relation_map(false, conflict_set, conflict_set, &mut conflicts);

    let compatible: HashSet<D> = conflict_set
        .iter()
        .filter(|d| !enforce_rejected.contains(*d))
        .cloned()
        .collect();

    // Conflict edges among compatible deploys, with every value set
    // widened to drag in its transitive dependents.
    let mut full_conflicts_map = RelationMap::new();
    for (key, related) in &conflicts_within {
        if !compatible.contains(key) {
            continue;
        }
        let live: HashSet<D> = related
            .iter()
            .filter(|d| compatible.contains(*d))
            .cloned()
            .collect();
        if live.is_empty() {
            continue;
        }
        full_conflicts_map.insert(key.clone(), with_dependencies(&live, &deps_within)?);
    }

    let options = if config.use_exact(full_conflicts_map.len()) {
        compute_rejection_options(&full_conflicts_map)
    } else {
        std::iter::once(approximate_rejection_option(&full_conflicts_map)).collect()
    };
    debug!(
        conflicting = full_conflicts_map.len(),
        options = options.len(),
        "enumerated rejection options"
    );

    let options = add_overflow_rejections_with(
        &compatible,
        &options,
        mergeable.init_values,
        mergeable.diffs,
        &deps_within,
        config.overflow,
    )?;

    let best = compute_optimal_rejection(&options, cost);
    debug!(rejected = best.len(), "chose optimal rejection");

    let accepted: HashSet<D> = compatible
        .iter()
        .filter(|d| !best.contains(*d))
        .cloned()
        .collect();
    let mut rejected: HashSet<D> = best.into_iter().collect();
    rejected.extend(enforce_rejected.iter().cloned());
    Ok(Resolution::new(accepted, rejected))
}

/// Resolve the unfinalized region of the DAG against the latest fringe.
///
/// `seen` is the reflexive ancestor function; `deploys_index` yields the
/// deploys a block carries; `conflicts`/`depends` are the caller's
/// relation predicates (`depends(a, b)` reads "a depends on b"). The
/// returned acceptance is conflict-free, dependency-closed with respect
/// to the rejections, compatible with the finalized sets and safe
/// against the mergeable channel balances.
#[allow(clippy::too_many_arguments)]
pub fn resolve_dag<B, D, Ch, S, I, CF, DF, C>(
    latest: &HashSet<B>,
    fringe: &HashSet<B>,
    seen: S,
    mut deploys_index: I,
    finalized: &FinalizedSet<'_, D>,
    mut conflicts: CF,
    mut depends: DF,
    cost: C,
    mergeable: &MergeableState<'_, D, Ch>,
    config: &ResolverConfig,
) -> Result<Resolution<D>>
where
    B: Ident,
    D: Ident + Send + Sync,
    Ch: Ident,
    S: FnMut(&B) -> HashSet<B>,
    I: FnMut(&B) -> HashSet<D>,
    CF: FnMut(&D, &D) -> bool,
    DF: FnMut(&D, &D) -> bool,
    C: FnMut(&D) -> u64,
{
    let scope = conflict_scope(latest, fringe, seen);
    let mut conflict_set: HashSet<D> = HashSet::new();
    for block in &scope {
        conflict_set.extend(deploys_index(block));
    }
    debug!(
        blocks = scope.len(),
        deploys = conflict_set.len(),
        "computed conflict scope"
    );

    let conflicts_with_final =
        compute_relation_map(true, &conflict_set, finalized.accepted, &mut conflicts);
    let depends_on_final =
        compute_relation_map(true, &conflict_set, finalized.rejected, &mut depends);
    let incompatible = incompatible_with_final(
        finalized.accepted,
        finalized.rejected,
        &conflicts_with_final,
        &depends_on_final,
    );

    let deps_within = compute_relation_map(true, &conflict_set, &conflict_set, &mut depends);
    let enforce_rejected = with_dependencies(&incompatible, &deps_within)?;
    debug!(enforced = enforce_rejected.len(), "closed enforced rejections");

    resolve_conflict_set(
        &conflict_set,
        &enforce_rejected,
        conflicts,
        depends,
        cost,
        mergeable,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergedag_core::RelationMap;

    fn set(items: &[u32]) -> HashSet<u32> {
        items.iter().copied().collect()
    }

    #[test]
    fn incompatible_collects_conflicts_and_dependents() {
        let conflicts_map: RelationMap<u32> = [(100, set(&[1, 2]))].into_iter().collect();
        let dependency_map: RelationMap<u32> = [(200, set(&[3]))].into_iter().collect();

        let incompatible = incompatible_with_final(
            &set(&[100]),
            &set(&[200]),
            &conflicts_map,
            &dependency_map,
        );
        assert_eq!(incompatible, set(&[1, 2, 3]));
    }

    #[test]
    fn incompatible_of_empty_finalized_sets_is_empty() {
        let incompatible = incompatible_with_final(
            &set(&[]),
            &set(&[]),
            &RelationMap::new(),
            &RelationMap::new(),
        );
        assert!(incompatible.is_empty());
    }

    #[test]
    fn resolve_conflict_set_partitions_its_input() {
        let conflict_set = set(&[1, 2, 3]);
        let enforce = set(&[3]);
        let init: HashMap<&'static str, i64> = HashMap::new();
        let diffs: HashMap<u32, mergedag_core::ChannelDiffs<&'static str>> = HashMap::new();
        let resolution = resolve_conflict_set(
            &conflict_set,
            &enforce,
            |a, b| (*a, *b) == (1, 2) || (*a, *b) == (2, 1),
            |_, _| false,
            |_| 1,
            &MergeableState { init_values: &init, diffs: &diffs },
            &ResolverConfig::default(),
        )
        .unwrap();

        assert!(resolution.accepted.is_disjoint(&resolution.rejected));
        let mut union = resolution.accepted.clone();
        union.extend(resolution.rejected.iter().copied());
        assert_eq!(union, conflict_set);
        assert!(resolution.rejected.contains(&3));
    }
}
