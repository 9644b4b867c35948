use std::collections::HashSet;

use mergedag_core::{Ident, MergeError, RelationMap, Result};

/// Transitive closure of `of` under the directed dependency map.
///
/// The seed set itself is included in the result. The frontier walk is
/// bounded by the visited set, so sharing (diamond shapes) is fine; an
/// actual cycle in the reachable subgraph is an invariant violation and
/// surfaces as [`MergeError::DependencyCycle`].
pub fn with_dependencies<D>(of: &HashSet<D>, dep_map: &RelationMap<D>) -> Result<HashSet<D>>
where
    D: Ident,
{
    let mut visited: HashSet<D> = of.clone();
    let mut frontier: Vec<D> = of.iter().cloned().collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for node in frontier {
            if let Some(deps) = dep_map.get(&node) {
                for dep in deps {
                    if visited.insert(dep.clone()) {
                        next.push(dep.clone());
                    }
                }
            }
        }
        frontier = next;
    }

    detect_cycle(&visited, dep_map)?;
    Ok(visited)
}

/// Three-color DFS over the reachable subgraph. A back edge means the
/// "dependency graph is acyclic" prerequisite was violated by the caller.
fn detect_cycle<D>(reachable: &HashSet<D>, dep_map: &RelationMap<D>) -> Result<()>
where
    D: Ident,
{
    let mut done: HashSet<D> = HashSet::new();
    let mut in_progress: HashSet<D> = HashSet::new();

    for start in reachable {
        if done.contains(start) {
            continue;
        }
        // Iterative DFS: (node, entered) frames, marking on first entry.
        let mut stack = vec![(start.clone(), false)];
        while let Some((node, entered)) = stack.pop() {
            if entered {
                in_progress.remove(&node);
                done.insert(node);
                continue;
            }
            if done.contains(&node) {
                continue;
            }
            if !in_progress.insert(node.clone()) {
                return Err(MergeError::DependencyCycle(format!("{node:?}")));
            }
            stack.push((node.clone(), true));
            if let Some(deps) = dep_map.get(&node) {
                for dep in deps {
                    if in_progress.contains(dep) {
                        return Err(MergeError::DependencyCycle(format!("{dep:?}")));
                    }
                    if !done.contains(dep) {
                        stack.push((dep.clone(), false));
                    }
                }
            }
        }
    }
    Ok(())
}
