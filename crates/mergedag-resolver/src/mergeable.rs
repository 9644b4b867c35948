use std::collections::{BTreeSet, HashMap, HashSet};

use mergedag_core::{ChannelDiffs, Ident, OverflowPolicy, RelationMap, Result};

use crate::closure::with_dependencies;

/// Augment every rejection option with the deploys whose acceptance
/// would overflow a channel balance or drive it negative.
///
/// Candidates (`conflict_set` minus the option) fold onto the initial
/// balances in ascending order of total absolute delta; a deploy with
/// no diffs entry sorts first (its key is `i64::MIN`, a quirk kept for
/// reproducibility), ties break by deploy id. The fold is greedy and
/// order-dependent: a rejected deploy leaves the balances untouched and
/// later deploys never revisit it. Zero input options still produce one
/// option by folding the entire conflict set.
pub fn add_mergeable_overflow_rejections<D, Ch>(
    conflict_set: &HashSet<D>,
    options: &HashSet<BTreeSet<D>>,
    init_values: &HashMap<Ch, i64>,
    diffs: &HashMap<D, ChannelDiffs<Ch>>,
) -> HashSet<BTreeSet<D>>
where
    D: Ident,
    Ch: Ident,
{
    // Greedy folding with an empty dependency relation cannot fail.
    add_overflow_rejections_with(
        conflict_set,
        options,
        init_values,
        diffs,
        &RelationMap::new(),
        OverflowPolicy::Greedy,
    )
    .expect("empty dependency map cannot contain a cycle")
}

/// Full-featured variant used by the orchestrator: arithmetic rejects
/// are closed under the dependency map, and the fold restarts until no
/// rejection drags in new dependents, so dependency closure and channel
/// safety hold simultaneously on the final acceptance.
pub(crate) fn add_overflow_rejections_with<D, Ch>(
    conflict_set: &HashSet<D>,
    options: &HashSet<BTreeSet<D>>,
    init_values: &HashMap<Ch, i64>,
    diffs: &HashMap<D, ChannelDiffs<Ch>>,
    dependency_map: &RelationMap<D>,
    policy: OverflowPolicy,
) -> Result<HashSet<BTreeSet<D>>>
where
    D: Ident,
    Ch: Ident,
{
    let seed_options: Vec<BTreeSet<D>> = if options.is_empty() {
        vec![BTreeSet::new()]
    } else {
        options.iter().cloned().collect()
    };

    let mut augmented = HashSet::new();
    for mut option in seed_options {
        loop {
            let newly = fold_candidates(conflict_set, &option, init_values, diffs, policy);
            if newly.is_empty() {
                break;
            }
            let closed = with_dependencies(&newly, dependency_map)?;
            option.extend(closed);
        }
        augmented.insert(option);
    }
    Ok(augmented)
}

/// One greedy pass over `conflict_set - rejected`; returns the deploys
/// newly rejected by channel arithmetic (not yet in `rejected`).
fn fold_candidates<D, Ch>(
    conflict_set: &HashSet<D>,
    rejected: &BTreeSet<D>,
    init_values: &HashMap<Ch, i64>,
    diffs: &HashMap<D, ChannelDiffs<Ch>>,
    policy: OverflowPolicy,
) -> HashSet<D>
where
    D: Ident,
    Ch: Ident,
{
    let mut candidates: Vec<D> = conflict_set
        .iter()
        .filter(|d| !rejected.contains(*d))
        .cloned()
        .collect();
    candidates.sort_by_key(|d| (impact_key(d, diffs), d.clone()));

    let mut balances: HashMap<Ch, i64> = init_values.clone();
    let mut failed: Vec<D> = Vec::new();
    for deploy in candidates {
        if !try_apply(&deploy, diffs, &mut balances) {
            failed.push(deploy);
        }
    }

    if policy == OverflowPolicy::GreedyRetry {
        // One second chance against the settled balances, same order.
        failed.retain(|deploy| !try_apply(deploy, diffs, &mut balances));
    }

    failed.into_iter().collect()
}

/// Sort key: total absolute delta across channels, with deploys absent
/// from `diffs` keyed at `i64::MIN` so they fold first.
fn impact_key<D, Ch>(deploy: &D, diffs: &HashMap<D, ChannelDiffs<Ch>>) -> i128
where
    D: Ident,
    Ch: Ident,
{
    match diffs.get(deploy) {
        None => i64::MIN as i128,
        Some(channel_diffs) => channel_diffs
            .values()
            .map(|delta| delta.unsigned_abs() as i128)
            .sum(),
    }
}

/// Apply one deploy's diffs with checked arithmetic. All channels are
/// staged first so a failing deploy leaves the balances untouched.
fn try_apply<D, Ch>(
    deploy: &D,
    diffs: &HashMap<D, ChannelDiffs<Ch>>,
    balances: &mut HashMap<Ch, i64>,
) -> bool
where
    D: Ident,
    Ch: Ident,
{
    let Some(channel_diffs) = diffs.get(deploy) else {
        return true;
    };

    let mut staged: Vec<(Ch, i64)> = Vec::with_capacity(channel_diffs.len());
    for (channel, delta) in channel_diffs {
        let current = balances.get(channel).copied().unwrap_or(0);
        match current.checked_add(*delta) {
            Some(updated) if updated >= 0 => staged.push((channel.clone(), updated)),
            _ => return false,
        }
    }
    for (channel, updated) in staged {
        balances.insert(channel, updated);
    }
    true
}
