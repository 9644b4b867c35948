use std::collections::HashSet;

use mergedag_core::{Ident, MergeError, Result};

/// Unfinalized region of the DAG: every block reachable from the tips
/// that is neither part of the finalization fringe nor reachable from it.
///
/// `seen` is the reflexive ancestor function: `seen(b)` contains `b`
/// itself along with everything reachable through parent edges.
pub fn conflict_scope<B, S>(latest: &HashSet<B>, fringe: &HashSet<B>, mut seen: S) -> HashSet<B>
where
    B: Ident,
    S: FnMut(&B) -> HashSet<B>,
{
    let mut scope: HashSet<B> = latest.clone();
    for tip in latest {
        scope.extend(seen(tip));
    }
    for block in fringe {
        scope.remove(block);
        for ancestor in seen(block) {
            scope.remove(&ancestor);
        }
    }
    scope
}

/// Newly finalized "ring": blocks between the lowest and the latest
/// fringe, the latest fringe itself included.
pub fn final_scope<B, S>(
    latest_fringe: &HashSet<B>,
    lowest_fringe: &HashSet<B>,
    mut seen: S,
) -> HashSet<B>
where
    B: Ident,
    S: FnMut(&B) -> HashSet<B>,
{
    let mut scope: HashSet<B> = HashSet::new();
    for block in latest_fringe {
        scope.extend(seen(block));
    }
    for block in lowest_fringe {
        for ancestor in seen(block) {
            scope.remove(&ancestor);
        }
    }
    scope.extend(latest_fringe.iter().cloned());
    scope
}

/// Pick the fringe whose minimum block by `(height, id)` is globally
/// minimum. A single fringe is returned as-is, empty or not. With
/// several fringes, those with no blocks are skipped; an input with no
/// selectable fringe is a programmer error.
pub fn lowest_fringe<'a, B, H>(fringes: &'a [HashSet<B>], mut height: H) -> Result<&'a HashSet<B>>
where
    B: Ident,
    H: FnMut(&B) -> i64,
{
    if fringes.len() == 1 {
        return Ok(&fringes[0]);
    }

    let mut lowest: Option<((i64, B), &HashSet<B>)> = None;
    for fringe in fringes {
        let Some(min_block) = fringe.iter().map(|b| (height(b), b.clone())).min() else {
            continue;
        };
        match &lowest {
            Some((best, _)) if *best <= min_block => {}
            _ => lowest = Some((min_block, fringe)),
        }
    }
    lowest.map(|(_, fringe)| fringe).ok_or(MergeError::EmptyFringe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn set(items: &[u32]) -> HashSet<u32> {
        items.iter().copied().collect()
    }

    /// Reflexive ancestor function over an explicit parent table.
    fn seen_fn<'a>(parents: &'a [(u32, &'a [u32])]) -> impl FnMut(&u32) -> HashSet<u32> + 'a {
        let table: HashMap<u32, Vec<u32>> = parents
            .iter()
            .map(|(b, ps)| (*b, ps.to_vec()))
            .collect();
        move |block: &u32| {
            let mut out = HashSet::new();
            let mut frontier = vec![*block];
            while let Some(b) = frontier.pop() {
                if out.insert(b) {
                    if let Some(ps) = table.get(&b) {
                        frontier.extend(ps.iter().copied());
                    }
                }
            }
            out
        }
    }

    // DAG used below:  1 <- 2 <- 3 <- 4  (4 is the tip)
    //                        ^-- 5      (5 is a second tip on a fork)
    const PARENTS: &[(u32, &[u32])] = &[(2, &[1]), (3, &[2]), (4, &[3]), (5, &[2])];

    #[test]
    fn conflict_scope_excludes_fringe_and_its_history() {
        let scope = conflict_scope(&set(&[4, 5]), &set(&[2]), seen_fn(PARENTS));
        assert_eq!(scope, set(&[3, 4, 5]));
    }

    #[test]
    fn conflict_scope_of_empty_dag_is_empty() {
        let scope = conflict_scope(&set(&[]), &set(&[]), seen_fn(&[]));
        assert!(scope.is_empty());
    }

    #[test]
    fn final_scope_is_the_ring_between_fringes() {
        // latest fringe {3}, lowest fringe {1}: ring is {2, 3}.
        let scope = final_scope(&set(&[3]), &set(&[1]), seen_fn(PARENTS));
        assert_eq!(scope, set(&[2, 3]));
    }

    #[test]
    fn final_scope_always_contains_the_latest_fringe() {
        let scope = final_scope(&set(&[2]), &set(&[2]), seen_fn(PARENTS));
        assert_eq!(scope, set(&[2]));
    }

    #[test]
    fn lowest_fringe_picks_minimal_height_then_id() {
        let fringes = vec![set(&[4]), set(&[5, 3])];
        let heights: HashMap<u32, i64> =
            [(3, 3), (4, 4), (5, 3)].into_iter().collect();
        let chosen = lowest_fringe(&fringes, |b| heights[b]).unwrap();
        assert_eq!(*chosen, set(&[5, 3]));
    }

    #[test]
    fn lowest_fringe_breaks_height_ties_by_id() {
        let fringes = vec![set(&[10]), set(&[9])];
        let chosen = lowest_fringe(&fringes, |_| 0).unwrap();
        assert_eq!(*chosen, set(&[9]));
    }

    #[test]
    fn single_fringe_is_returned_as_is() {
        let fringes = vec![set(&[])];
        let chosen = lowest_fringe(&fringes, |_| 0).unwrap();
        assert!(chosen.is_empty());
    }

    #[test]
    fn empty_input_is_a_programmer_error() {
        let fringes: Vec<HashSet<u32>> = Vec::new();
        assert_eq!(lowest_fringe(&fringes, |_| 0).unwrap_err(), MergeError::EmptyFringe);
    }

    #[test]
    fn all_empty_fringes_are_a_programmer_error() {
        let fringes = vec![set(&[]), set(&[])];
        assert_eq!(lowest_fringe(&fringes, |_| 0).unwrap_err(), MergeError::EmptyFringe);
    }
}
