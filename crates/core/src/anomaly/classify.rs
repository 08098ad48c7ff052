//! The cycle explainer (C7): turns a closed edge sequence into a classified
//! anomaly tag, per the priority rule in §4.7 — rw edges dominate wr, which
//! dominates ww.

use crate::anomaly::{CycleBase, CycleTag, Suffix};
use crate::graph::{CyclePath, Rel, RelSet};
use crate::model::TxnId;

/// Classifies a closed cycle by the labels actually present on its edges.
///
/// Panics only on a structurally impossible input: a non-empty cycle none of
/// whose edges carry any of `ww`/`wr`/`rw` (every edge in this engine's
/// graph always carries at least one of those three, since `process`- and
/// `realtime`-only edges are never searched standalone — see
/// [`crate::anomaly::spec::specs`]).
#[must_use]
pub fn classify(cycle: &CyclePath<TxnId>) -> CycleTag {
    let mut rw_count = 0u32;
    let mut wr_count = 0u32;
    let mut ww_count = 0u32;
    let mut has_process = false;
    let mut has_realtime = false;
    let mut adjacent_rw = false;
    let mut last_was_rw = false;
    let mut first_was_rw = false;

    for (i, rel) in cycle.edges.iter().enumerate() {
        if rel.contains(Rel::Rw) {
            rw_count += 1;
            if last_was_rw {
                adjacent_rw = true;
            }
            if i == 0 {
                first_was_rw = true;
            }
            last_was_rw = true;
        } else {
            last_was_rw = false;
        }
        if rel.contains(Rel::Wr) {
            wr_count += 1;
        }
        if rel.contains(Rel::Ww) {
            ww_count += 1;
        }
        if rel.contains(Rel::Process) {
            has_process = true;
        }
        if rel.contains(Rel::Realtime) {
            has_realtime = true;
        }
    }
    if last_was_rw && first_was_rw && cycle.edges.len() > 1 {
        adjacent_rw = true;
    }

    let base = if rw_count == 1 {
        CycleBase::GSingle
    } else if rw_count > 1 {
        if adjacent_rw {
            CycleBase::G2Item
        } else {
            CycleBase::GNonadjacent
        }
    } else if wr_count > 0 {
        CycleBase::G1c
    } else if ww_count > 0 {
        CycleBase::G0
    } else {
        unreachable!("cycle classified with no ww/wr/rw edge: {cycle:?}")
    };

    let suffix = if has_realtime {
        Suffix::Realtime
    } else if has_process {
        Suffix::Process
    } else {
        Suffix::None
    };

    CycleTag { base, suffix }
}

/// Convenience: classify and render as a [`RelSet`]-free fact, used by
/// `filter_ex` to reject a primitive's match when it over- or
/// under-qualifies for the spec that requested it.
#[must_use]
pub fn base_of(cycle: &CyclePath<TxnId>) -> CycleBase {
    classify(cycle).base
}
