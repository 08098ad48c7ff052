//! The projection cache (§4.4, §9): every relationship-label-set projection
//! the anomaly interpreter will need is computed once, up front, in
//! parallel, rather than memoized lazily behind a runtime lock. This gives
//! single-flight semantics for free — each label set is computed exactly
//! once, by construction.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::graph::label::RelSet;
use crate::graph::multigraph::Graph;

/// An immutable, pre-warmed map from relationship set to its projection of
/// the unified graph. Read-only after construction (§5: "the graph and
/// projection cache are read-only after build").
pub struct ProjectionCache<N: Ord + Clone> {
    projections: BTreeMap<RelSet, Graph<N>>,
}

impl<N: Ord + Clone + Send + Sync> ProjectionCache<N> {
    /// Builds every projection named in `rel_sets` in parallel. Duplicate
    /// requests are deduplicated before computing.
    #[must_use]
    pub fn prewarm(graph: &Graph<N>, rel_sets: impl IntoIterator<Item = RelSet>) -> Self {
        let mut wanted: Vec<RelSet> = rel_sets.into_iter().collect();
        wanted.sort_unstable();
        wanted.dedup();

        let projections: BTreeMap<RelSet, Graph<N>> = wanted
            .into_par_iter()
            .map(|rels| (rels, graph.project(rels)))
            .collect();

        Self { projections }
    }

    /// Returns the cached projection for `rels`, panicking if it was not
    /// requested at `prewarm` time — the interpreter is expected to
    /// enumerate every label set it needs before searching (§4.4).
    #[must_use]
    pub fn get(&self, rels: RelSet) -> &Graph<N> {
        self.projections
            .get(&rels)
            .expect("projection requested without being pre-warmed")
    }
}
