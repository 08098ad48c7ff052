//! The process-order graph: each process's own completions, totally
//! ordered by submission.

use std::collections::BTreeMap;

use crate::graph::{Graph, Rel, RelSet};
use crate::model::{History, ProcessId, TxnId};

/// Adds a `process` edge between every consecutive pair of completions
/// (`ok` or `info`) submitted by the same process (§4.3).
#[must_use]
pub fn build<M>(history: &History<M>) -> Graph<TxnId> {
    let mut by_process: BTreeMap<ProcessId, Vec<TxnId>> = BTreeMap::new();
    for txn in history.completed() {
        by_process.entry(txn.process).or_default().push(txn.id);
    }

    let mut g = Graph::new();
    for ids in by_process.values() {
        for id in ids {
            g.add_node(*id);
        }
        for pair in ids.windows(2) {
            g.add_edge(pair[0], pair[1], RelSet::of(Rel::Process));
        }
    }
    g
}
