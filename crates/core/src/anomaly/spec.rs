//! The anomaly specification interpreter (C6): a declarative, priority
//! ordered catalogue of what to search for per SCC, and the per-SCC search
//! protocol that drives [`crate::graph`]'s cycle primitives with it.
//!
//! The catalogue is data, not code (§9 design notes: "keep it that way").
//! The only behavior living outside plain data is `SearchKind`'s dispatch to
//! the matching primitive and the closed `PathPredicate` enum the stateful
//! searches use — there is no open-ended callback surface.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::anomaly::classify::{self, base_of};
use crate::anomaly::{AnomalyTag, CycleBase, CycleTag, Suffix};
use crate::explain::{explain_cycle, CycleExplanation, ExplainIndex};
use crate::graph::{
    fallback_cycle, find_cycle, find_cycle_starting_with, find_cycle_with, Deadline,
    PathPredicate, ProjectionCache, Rel, RelSet, TimedOut,
};
use crate::model::TxnId;

/// Which cycle-search primitive a spec dispatches to, and the relationship
/// set(s) it runs over.
#[derive(Debug, Clone, Copy)]
pub enum SearchKind {
    /// `find_cycle` over the single projection `rels`.
    Rels(RelSet),
    /// `find_cycle_starting_with`: first edge drawn from `first`, the rest
    /// from `rest`.
    FirstRest(RelSet, RelSet),
    /// `find_cycle_with`: a stateful path predicate over the projection
    /// `rels`.
    With(RelSet, PathPredicate),
}

impl SearchKind {
    /// Every relationship set this search kind needs pre-warmed.
    fn rel_sets(self) -> Vec<RelSet> {
        match self {
            Self::Rels(r) => vec![r],
            Self::FirstRest(a, b) => vec![a, b],
            Self::With(r, _) => vec![r],
        }
    }
}

/// The closed predicate kind for §4.6's `filter-ex` gate: once a primitive
/// returns a candidate path, `filter_ex` decides whether it actually
/// qualifies for the spec that asked for it, since a search over a coarser
/// relation set (e.g. `{ww, wr, rw}` for `G-single`) can return a cycle that
/// classifies as a different, stronger base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEx {
    RequireBase(CycleBase),
}

impl FilterEx {
    fn accepts(self, cycle: &crate::graph::CyclePath<TxnId>) -> bool {
        match self {
            Self::RequireBase(base) => base_of(cycle) == base,
        }
    }
}

/// One catalogue entry: a fully-qualified tag, the search to run for it, and
/// the `filter_ex` gate a candidate match must pass to be accepted.
#[derive(Debug, Clone, Copy)]
pub struct AnomalySpec {
    pub tag: CycleTag,
    pub search: SearchKind,
    pub filter_ex: FilterEx,
}

const SUFFIXES: [(Suffix, Rel); 2] = [(Suffix::Process, Rel::Process), (Suffix::Realtime, Rel::Realtime)];

fn with_suffix(base: RelSet, suffix: Suffix) -> RelSet {
    match suffix {
        Suffix::None => base,
        Suffix::Process => {
            let mut r = base;
            r.insert(Rel::Process);
            r
        }
        Suffix::Realtime => {
            let mut r = base;
            r.insert(Rel::Realtime);
            r
        }
    }
}

fn specs_for_suffix(suffix: Suffix) -> [AnomalySpec; 5] {
    let ww = RelSet::of(Rel::Ww);
    let ww_wr = RelSet::from_iter([Rel::Ww, Rel::Wr]);
    let ww_wr_rw = RelSet::from_iter([Rel::Ww, Rel::Wr, Rel::Rw]);
    let rw_only = RelSet::of(Rel::Rw);

    [
        AnomalySpec {
            tag: CycleTag { base: CycleBase::G0, suffix },
            search: SearchKind::Rels(with_suffix(ww, suffix)),
            filter_ex: FilterEx::RequireBase(CycleBase::G0),
        },
        AnomalySpec {
            tag: CycleTag { base: CycleBase::G1c, suffix },
            search: SearchKind::Rels(with_suffix(ww_wr, suffix)),
            filter_ex: FilterEx::RequireBase(CycleBase::G1c),
        },
        AnomalySpec {
            tag: CycleTag { base: CycleBase::GSingle, suffix },
            search: SearchKind::FirstRest(rw_only, with_suffix(ww_wr, suffix)),
            filter_ex: FilterEx::RequireBase(CycleBase::GSingle),
        },
        AnomalySpec {
            tag: CycleTag { base: CycleBase::GNonadjacent, suffix },
            search: SearchKind::With(with_suffix(ww_wr_rw, suffix), PathPredicate::NonAdjacentRw),
            filter_ex: FilterEx::RequireBase(CycleBase::GNonadjacent),
        },
        AnomalySpec {
            tag: CycleTag { base: CycleBase::G2Item, suffix },
            search: SearchKind::With(with_suffix(ww_wr_rw, suffix), PathPredicate::AdjacentRwPair),
            filter_ex: FilterEx::RequireBase(CycleBase::G2Item),
        },
    ]
}

/// The full catalogue, in the priority order §4.6 mandates: the
/// unsuffixed family first, then every `-process` variant, then every
/// `-realtime` variant.
#[must_use]
pub fn specs() -> Vec<AnomalySpec> {
    let mut out = Vec::with_capacity(15);
    out.extend(specs_for_suffix(Suffix::None));
    for (suffix, _) in SUFFIXES {
        out.extend(specs_for_suffix(suffix));
    }
    out
}

/// Every relationship set the given specs will query — used to pre-warm the
/// [`ProjectionCache`] before SCC search begins (§4.4, §5).
#[must_use]
pub fn required_rel_sets(specs: &[AnomalySpec]) -> Vec<RelSet> {
    let mut sets: Vec<RelSet> = specs.iter().flat_map(|s| s.search.rel_sets()).collect();
    sets.push(RelSet::from_iter([Rel::Ww, Rel::Wr, Rel::Rw]));
    sets
}

/// The outcome of running the full spec catalogue against one SCC.
pub struct SccSearchResult<K> {
    pub cycles: Vec<CycleExplanation<K>>,
    pub timed_out_on: Option<CycleTag>,
    pub fallback: Option<CycleExplanation<K>>,
}

/// Runs every spec in priority order against one SCC, classifying and
/// recording each accepted match (§4.6, "per-SCC search protocol"). Stops at
/// the first timeout, preserving everything already found and attaching a
/// `fallback_cycle` explanation so the SCC is never silently unreported.
pub fn search_scc<K: Ord + Clone>(
    cache: &ProjectionCache<TxnId>,
    scc: &BTreeSet<TxnId>,
    specs: &[AnomalySpec],
    explain_index: &ExplainIndex<K>,
    timeout: Duration,
) -> SccSearchResult<K> {
    let deadline = Deadline::after(timeout);
    let mut cycles = Vec::new();

    for spec in specs {
        let found = match spec.search {
            SearchKind::Rels(rels) => find_cycle(cache.get(rels), scc, &deadline),
            SearchKind::FirstRest(first, rest) => {
                find_cycle_starting_with(cache.get(first), cache.get(rest), scc, &deadline)
            }
            SearchKind::With(rels, predicate) => {
                find_cycle_with(predicate, cache.get(rels), scc, &deadline)
            }
        };

        match found {
            Ok(Some(path)) => {
                let canon = path.canonicalize();
                if spec.filter_ex.accepts(&canon) {
                    cycles.push(explain_cycle(AnomalyTag::from(spec.tag), canon, explain_index));
                }
            }
            Ok(None) => {}
            Err(TimedOut) => {
                let fallback_rels = RelSet::from_iter([Rel::Ww, Rel::Wr, Rel::Rw]);
                let path = fallback_cycle(cache.get(fallback_rels), scc).canonicalize();
                let tag = classify::classify(&path);
                let fallback = explain_cycle(AnomalyTag::from(tag), path, explain_index);
                return SccSearchResult {
                    cycles,
                    timed_out_on: Some(spec.tag),
                    fallback: Some(fallback),
                };
            }
        }
    }

    SccSearchResult { cycles, timed_out_on: None, fallback: None }
}
