use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Capability bundle required of block and deploy identifiers.
///
/// The resolver never inspects identifiers beyond equality, hashing and
/// a stable total order (used for deterministic tie-breaking), so any
/// caller-supplied id type qualifies via the blanket impl.
pub trait Ident: Clone + Eq + Ord + Hash + Debug {}

impl<T> Ident for T where T: Clone + Eq + Ord + Hash + Debug {}

/// Relation over deploys: key maps to the set of related deploys.
/// Keys with an empty relation are omitted entirely.
pub type RelationMap<D> = HashMap<D, HashSet<D>>;

/// Per-deploy signed deltas against mergeable channels.
pub type ChannelDiffs<Ch> = HashMap<Ch, i64>;

/// Outcome of a resolver invocation.
///
/// `accepted` and `rejected` partition the conflict set: their union is
/// the full set of unfinalized deploys in scope and their intersection
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution<D: Ident> {
    pub accepted: HashSet<D>,
    pub rejected: HashSet<D>,
}

impl<D: Ident> Resolution<D> {
    pub fn new(accepted: HashSet<D>, rejected: HashSet<D>) -> Self {
        Self { accepted, rejected }
    }

    /// The empty resolution, returned for an empty scope.
    pub fn empty() -> Self {
        Self {
            accepted: HashSet::new(),
            rejected: HashSet::new(),
        }
    }
}

impl<D: Ident> Default for Resolution<D> {
    fn default() -> Self {
        Self::empty()
    }
}
