use serde::{Deserialize, Serialize};

/// Strategy used to enumerate rejection options over the conflict graph.
///
/// Exact enumeration visits every maximal conflict-free subset and is
/// exponential in the number of conflicting deploys; it is the only
/// strategy for which the chosen rejection is guaranteed optimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumerationStrategy {
    /// Enumerate all maximal conflict-free subsets.
    Exact,
    /// Single greedy independent-set approximation. Always produces a
    /// valid (conflict-free) acceptance, with no optimality guarantee.
    Heuristic,
    /// Exact up to `ResolverConfig::exact_limit` conflict-graph keys,
    /// heuristic beyond it.
    Auto,
}

/// Policy for folding candidate deploys onto the channel balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Single greedy pass in ascending total-absolute-delta order. A
    /// deploy rejected mid-pass stays rejected even if later balances
    /// would have admitted it.
    Greedy,
    /// Greedy pass followed by one retry of the arithmetic rejects
    /// against the settled balances. Accepts a superset of `Greedy`.
    GreedyRetry,
}

/// Tuning knobs for a resolver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub enumeration: EnumerationStrategy,
    /// Conflict-graph key count above which `Auto` switches to the
    /// heuristic enumerator.
    pub exact_limit: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enumeration: EnumerationStrategy::Exact,
            exact_limit: 20,
            overflow: OverflowPolicy::Greedy,
        }
    }
}

impl ResolverConfig {
    /// Whether exact enumeration applies to a conflict graph with
    /// `keys` conflicting deploys.
    pub fn use_exact(&self, keys: usize) -> bool {
        match self.enumeration {
            EnumerationStrategy::Exact => true,
            EnumerationStrategy::Heuristic => false,
            EnumerationStrategy::Auto => keys <= self.exact_limit,
        }
    }
}
