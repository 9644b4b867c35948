use std::collections::{BTreeMap, BTreeSet, HashSet};

use rayon::prelude::*;

use mergedag_core::{Ident, RelationMap};

/// Frontier size above which a layer is expanded on the rayon pool.
const PARALLEL_FRONTIER_THRESHOLD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SearchState<D: Ident> {
    candidate: D,
    rejected: BTreeSet<D>,
    accepted: BTreeSet<D>,
}

enum Step<D: Ident> {
    Done(BTreeSet<D>),
    Expand(Vec<SearchState<D>>),
}

/// Enumerate every rejection option of the conflict graph: the
/// complements of its maximal conflict-free subsets, restricted to the
/// key set.
///
/// The map's values are expected to already incorporate transitive
/// dependency closure, so a value element may lie outside the key set;
/// such dependents are carried into the emitted options. Exponential in
/// the number of keys. An input with any keys yields at least one
/// option; an empty input yields none.
pub fn compute_rejection_options<D>(conflicts_map: &RelationMap<D>) -> HashSet<BTreeSet<D>>
where
    D: Ident + Send + Sync,
{
    let keys: BTreeSet<D> = conflicts_map.keys().cloned().collect();
    if keys.is_empty() {
        return HashSet::new();
    }

    let mut options: HashSet<BTreeSet<D>> = HashSet::new();
    let mut frontier: HashSet<SearchState<D>> = keys
        .iter()
        .map(|deploy| SearchState {
            candidate: deploy.clone(),
            rejected: BTreeSet::new(),
            accepted: BTreeSet::new(),
        })
        .collect();

    // Breadth-first layers; states merging to the same (rejected,
    // accepted) pair are deduplicated per layer.
    while !frontier.is_empty() {
        let steps: Vec<Step<D>> = if frontier.len() >= PARALLEL_FRONTIER_THRESHOLD {
            frontier
                .par_iter()
                .map(|state| advance(state, conflicts_map, &keys))
                .collect()
        } else {
            frontier
                .iter()
                .map(|state| advance(state, conflicts_map, &keys))
                .collect()
        };

        let mut next: HashSet<SearchState<D>> = HashSet::new();
        for step in steps {
            match step {
                Step::Done(rejected) => {
                    options.insert(rejected);
                }
                Step::Expand(children) => next.extend(children),
            }
        }
        frontier = next;
    }

    options
}

fn advance<D>(state: &SearchState<D>, conflicts_map: &RelationMap<D>, keys: &BTreeSet<D>) -> Step<D>
where
    D: Ident,
{
    let mut rejected = state.rejected.clone();
    if let Some(conflicting) = conflicts_map.get(&state.candidate) {
        rejected.extend(conflicting.iter().cloned());
    }
    let mut accepted = state.accepted.clone();
    accepted.insert(state.candidate.clone());

    let next_candidates: Vec<D> = keys
        .iter()
        .filter(|k| !rejected.contains(*k) && !accepted.contains(*k))
        .cloned()
        .collect();

    if next_candidates.is_empty() {
        Step::Done(rejected)
    } else {
        Step::Expand(
            next_candidates
                .into_iter()
                .map(|candidate| SearchState {
                    candidate,
                    rejected: rejected.clone(),
                    accepted: accepted.clone(),
                })
                .collect(),
        )
    }
}

/// Greedy single-option approximation for conflict graphs too large to
/// enumerate: repeatedly accept the minimum-degree key (ties by id) and
/// reject its whole related set. The complementary acceptance is
/// conflict-free by construction; neither maximality nor optimality is
/// guaranteed.
pub fn approximate_rejection_option<D>(conflicts_map: &RelationMap<D>) -> BTreeSet<D>
where
    D: Ident,
{
    let keys: BTreeSet<D> = conflicts_map.keys().cloned().collect();

    // Undirected adjacency restricted to keys, used only to steer the
    // greedy pick; rejection always takes the full (dependency-expanded)
    // value set.
    let mut adjacency: BTreeMap<D, BTreeSet<D>> = BTreeMap::new();
    for (key, related) in conflicts_map {
        for other in related {
            if keys.contains(other) {
                adjacency.entry(key.clone()).or_default().insert(other.clone());
                adjacency.entry(other.clone()).or_default().insert(key.clone());
            }
        }
    }

    let mut remaining = keys;
    let mut rejected: BTreeSet<D> = BTreeSet::new();
    while let Some(pick) = remaining
        .iter()
        .min_by_key(|d| {
            let degree = adjacency
                .get(*d)
                .map_or(0, |n| n.iter().filter(|x| remaining.contains(*x)).count());
            (degree, (*d).clone())
        })
        .cloned()
    {
        remaining.remove(&pick);
        if let Some(related) = conflicts_map.get(&pick) {
            for other in related {
                rejected.insert(other.clone());
                remaining.remove(other);
            }
        }
    }
    rejected
}
