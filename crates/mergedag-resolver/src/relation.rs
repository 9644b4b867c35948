use std::collections::HashSet;

use mergedag_core::{Ident, RelationMap};

/// Build a relation map from `source` keys to related members of `target`.
///
/// An entry `s -> {t, ..}` means `relates(t, s)` held for each `t` in the
/// value set. Self-relations are never recorded. In undirected mode the
/// symmetric edge is mirrored into the same map, so
/// `t in map[s] <=> s in map[t]`. Keys whose relation is empty are
/// omitted; cost is `O(|target| * |source|)` predicate evaluations.
pub fn compute_relation_map<D, P>(
    directed: bool,
    target: &HashSet<D>,
    source: &HashSet<D>,
    mut relates: P,
) -> RelationMap<D>
where
    D: Ident,
    P: FnMut(&D, &D) -> bool,
{
    let mut map = RelationMap::new();
    for s in source {
        for t in target {
            if t == s || !relates(t, s) {
                continue;
            }
            map.entry(s.clone()).or_default().insert(t.clone());
            if !directed {
                map.entry(t.clone()).or_default().insert(s.clone());
            }
        }
    }
    map
}
