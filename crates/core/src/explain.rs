//! The pair explainer (C10): for any edge in the graph, reconstruct which
//! mop(s) on which key justify it. A pure function of the per-key indices
//! the analyzers already built while inferring edges — no additional graph
//! traversal happens here.

use std::collections::BTreeMap;

use crate::anomaly::AnomalyTag;
use crate::graph::{CyclePath, Rel, RelSet};
use crate::model::TxnId;

/// One justification for an edge: which relation, on which key, and a
/// human-readable detail rendered by the analyzer that inferred it (e.g.
/// `"k: appended 2 after 1"` or `"k: T3 read v=2 written here"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeWitness<K> {
    pub rel: Rel,
    pub key: K,
    pub detail: String,
}

/// The accumulated `(src, dst) -> [why]` index built by the analyzers
/// during edge inference (§4.10: "a pure function of the analyzer's
/// per-key indices; it performs no additional graph traversal").
#[derive(Debug, Clone)]
pub struct ExplainIndex<K: Ord + Clone> {
    witnesses: BTreeMap<(TxnId, TxnId), Vec<EdgeWitness<K>>>,
}

impl<K: Ord + Clone> Default for ExplainIndex<K> {
    fn default() -> Self {
        Self {
            witnesses: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> ExplainIndex<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, src: TxnId, dst: TxnId, witness: EdgeWitness<K>) {
        self.witnesses.entry((src, dst)).or_default().push(witness);
    }

    pub fn merge(&mut self, other: Self) {
        for (pair, witnesses) in other.witnesses {
            self.witnesses.entry(pair).or_default().extend(witnesses);
        }
    }

    #[must_use]
    pub fn explain_pair(&self, src: TxnId, dst: TxnId) -> &[EdgeWitness<K>] {
        self.witnesses
            .get(&(src, dst))
            .map_or(&[][..], Vec::as_slice)
    }
}

/// One edge of a classified cycle, paired with every witness that
/// justifies it.
#[derive(Debug, Clone)]
pub struct CycleStep<K> {
    pub from: TxnId,
    pub to: TxnId,
    pub rel: RelSet,
    pub witnesses: Vec<EdgeWitness<K>>,
}

/// The structured explanation rendered (externally) into a human-readable
/// narrative: the classified anomaly type, the cycle itself, and a
/// per-edge justification (§6, "Analysis result").
#[derive(Debug, Clone)]
pub struct CycleExplanation<K> {
    pub tag: AnomalyTag,
    pub cycle: Vec<TxnId>,
    pub steps: Vec<CycleStep<K>>,
}

#[must_use]
pub fn explain_cycle<K: Ord + Clone>(
    tag: AnomalyTag,
    cycle: CyclePath<TxnId>,
    index: &ExplainIndex<K>,
) -> CycleExplanation<K> {
    let n = cycle.nodes.len();
    let mut steps = Vec::with_capacity(n);
    for i in 0..n {
        let from = cycle.nodes[i];
        let to = cycle.nodes[(i + 1) % n];
        let rel = cycle.edges[i];
        let witnesses = index.explain_pair(from, to).to_vec();
        steps.push(CycleStep {
            from,
            to,
            rel,
            witnesses,
        });
    }
    CycleExplanation {
        tag,
        cycle: cycle.nodes,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{CycleBase, CycleTag, Suffix};
    use crate::graph::RelSet;

    #[test]
    fn explain_pair_returns_recorded_witnesses() {
        let mut idx: ExplainIndex<&str> = ExplainIndex::new();
        idx.record(
            TxnId(1),
            TxnId(2),
            EdgeWitness {
                rel: Rel::Ww,
                key: "x",
                detail: "x: 1 before 2".into(),
            },
        );
        let got = idx.explain_pair(TxnId(1), TxnId(2));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].key, "x");
    }

    #[test]
    fn explain_cycle_walks_every_edge() {
        let mut idx: ExplainIndex<&str> = ExplainIndex::new();
        idx.record(
            TxnId(1),
            TxnId(2),
            EdgeWitness {
                rel: Rel::Ww,
                key: "x",
                detail: "w".into(),
            },
        );
        idx.record(
            TxnId(2),
            TxnId(1),
            EdgeWitness {
                rel: Rel::Ww,
                key: "x",
                detail: "w".into(),
            },
        );
        let cycle = CyclePath {
            nodes: vec![TxnId(1), TxnId(2)],
            edges: vec![RelSet::of(Rel::Ww), RelSet::of(Rel::Ww)],
        };
        let tag = AnomalyTag::from(CycleTag {
            base: CycleBase::G0,
            suffix: Suffix::None,
        });
        let explanation = explain_cycle(tag, cycle, &idx);
        assert_eq!(explanation.steps.len(), 2);
        assert_eq!(explanation.steps[1].to, TxnId(1));
    }
}
