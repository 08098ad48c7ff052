//! The real-time-order graph: `A` precedes `B` when `A`'s completion
//! happens before `B`'s invocation, reduced to its transitive reduction (a
//! Hasse diagram) so the search primitives don't pay for redundant edges.

use crate::graph::{Graph, Rel, RelSet};
use crate::model::{History, Txn, TxnId};

/// Builds the realtime-order graph over every completed (`ok`/`info`)
/// transaction (§4.3).
///
/// Computed in two passes: first every precedence pair `A.complete <
/// B.invoke` (quadratic in the number of completed transactions), then a
/// transitive-reduction pass dropping any edge implied by a two-hop path.
/// Both passes are simple rather than asymptotically optimal — acceptable
/// here since real-time edges are only consulted within an SCC, which is
/// already bounded by the concurrency of the recorded history.
#[must_use]
pub fn build<M>(history: &History<M>) -> Graph<TxnId> {
    let ops: Vec<&Txn<M>> = history.completed().collect();

    let mut full: Graph<TxnId> = Graph::new();
    for t in &ops {
        full.add_node(t.id);
    }
    for a in &ops {
        for b in &ops {
            if a.id != b.id && a.complete_time_ns < b.invoke_time_ns {
                full.add_edge(a.id, b.id, RelSet::of(Rel::Realtime));
            }
        }
    }

    reduce(&full)
}

/// Drops every edge `a -> b` for which some other node `c` gives a path
/// `a -> c -> b` — the standard transitive-reduction filter.
fn reduce(g: &Graph<TxnId>) -> Graph<TxnId> {
    let edges: Vec<(TxnId, TxnId)> = g.edges().map(|(s, d, _)| (*s, *d)).collect();
    let mut out: Graph<TxnId> = Graph::new();
    for n in g.nodes() {
        out.add_node(*n);
    }

    'edges: for (a, b) in edges {
        for (c, _) in g.out_edges(&a) {
            if *c != b && g.edge(c, &b).is_some() {
                continue 'edges;
            }
        }
        out.add_edge(a, b, RelSet::of(Rel::Realtime));
    }
    out
}
