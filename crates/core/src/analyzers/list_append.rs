//! The list-append analyzer (§4.2.1): infers `ww`/`wr`/`rw` edges on a
//! per-key basis from the total append order each key's reads reveal.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use super::{AnalyzerOutput, InlineAnomaly};
use crate::explain::{EdgeWitness, ExplainIndex};
use crate::graph::{strongly_connected_components, Graph, Rel, RelSet};
use crate::model::{History, ListMop, TxnId};

/// Runs the list-append analyzer over every key touched by the history.
#[must_use]
pub fn analyze<K, E>(history: &History<ListMop<K, E>>) -> AnalyzerOutput<K>
where
    K: Ord + Clone + Display,
    E: Ord + Clone + Display,
{
    let mut graph: Graph<TxnId> = Graph::new();
    let mut explain_index: ExplainIndex<K> = ExplainIndex::new();
    let mut inline: Vec<InlineAnomaly<K>> = Vec::new();

    let mut keys: BTreeSet<K> = BTreeSet::new();
    for (_, mop) in history.op_mops() {
        keys.insert(mop.key().clone());
    }

    for key in &keys {
        analyze_key(key, history, &mut graph, &mut explain_index, &mut inline);
    }

    for txn in history.completed() {
        graph.add_node(txn.id);
    }

    AnalyzerOutput {
        graph,
        explain_index,
        inline_anomalies: inline,
    }
}

fn analyze_key<K, E>(
    key: &K,
    history: &History<ListMop<K, E>>,
    graph: &mut Graph<TxnId>,
    explain_index: &mut ExplainIndex<K>,
    inline: &mut Vec<InlineAnomaly<K>>,
) where
    K: Ord + Clone + Display,
    E: Ord + Clone + Display,
{
    // Every append observed by the ok transactions, first writer wins (two
    // ok transactions can't append the same element without one of them
    // being an invalid client, which is outside this engine's remit).
    let mut appends_ok: BTreeMap<E, TxnId> = BTreeMap::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let ListMop::Append { elem, .. } = mop {
                appends_ok.entry(elem.clone()).or_insert(txn.id);
            }
        }
    }
    let mut appends_info: BTreeMap<E, TxnId> = BTreeMap::new();
    for txn in history.infos() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let ListMop::Append { elem, .. } = mop {
                appends_info.entry(elem.clone()).or_insert(txn.id);
            }
        }
    }

    // The order every ok read's prefix implies, over every element it
    // mentions (regardless of whether that element has a known appender —
    // a dangling element is instead flagged as a dirty read below).
    let mut order_graph: Graph<E> = Graph::new();
    let mut witnessed: BTreeSet<E> = BTreeSet::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let ListMop::Read {
                value: Some(list), ..
            } = mop
            {
                for e in list {
                    order_graph.add_node(e.clone());
                    witnessed.insert(e.clone());
                }
                for pair in list.windows(2) {
                    order_graph.add_edge(pair[0].clone(), pair[1].clone(), RelSet::of(Rel::Ww));
                }
            }
        }
    }

    if !strongly_connected_components(&order_graph).is_empty() {
        inline.push(InlineAnomaly::IncompatibleOrder { key: key.clone() });
        return;
    }

    let mut appends: BTreeMap<E, TxnId> = appends_ok;
    for (elem, txn_id) in appends_info {
        if witnessed.contains(&elem) {
            appends.entry(elem).or_insert(txn_id);
        }
    }

    // Kahn's algorithm restricted to known appenders, ties broken by
    // element order — `order_graph` is already acyclic, so restricting it
    // to a node subset stays acyclic and every node is reachable.
    let mut indeg: BTreeMap<E, u32> = appends.keys().cloned().map(|e| (e, 0)).collect();
    for (src, dst, _) in order_graph.edges() {
        if appends.contains_key(src) && appends.contains_key(dst) {
            *indeg.get_mut(dst).expect("dst present by construction") += 1;
        }
    }
    let mut ready: BTreeSet<E> = indeg
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(e, _)| e.clone())
        .collect();
    let mut topo: Vec<E> = Vec::with_capacity(appends.len());
    while let Some(next) = ready.iter().next().cloned() {
        ready.remove(&next);
        topo.push(next.clone());
        for (nbr, _) in order_graph.out_edges(&next) {
            if !appends.contains_key(nbr) {
                continue;
            }
            let d = indeg.get_mut(nbr).expect("neighbor present by construction");
            *d -= 1;
            if *d == 0 {
                ready.insert(nbr.clone());
            }
        }
    }
    let position: BTreeMap<E, usize> = topo.iter().cloned().enumerate().map(|(i, e)| (e, i)).collect();

    for pair in topo.windows(2) {
        let src = appends[&pair[0]];
        let dst = appends[&pair[1]];
        graph.add_edge(src, dst, RelSet::of(Rel::Ww));
        explain_index.record(
            src,
            dst,
            EdgeWitness {
                rel: Rel::Ww,
                key: key.clone(),
                detail: format!("{key}: appended {} before {}", pair[0], pair[1]),
            },
        );
    }

    for txn in history.oks() {
        let mut self_appended: BTreeSet<E> = BTreeSet::new();
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            match mop {
                ListMop::Append { elem, .. } => {
                    self_appended.insert(elem.clone());
                }
                ListMop::Read { value: Some(list), .. } => {
                    if list.is_empty() {
                        if !self_appended.is_empty() {
                            inline.push(InlineAnomaly::InternalInconsistency {
                                key: key.clone(),
                                txn: txn.id,
                            });
                        }
                        if let Some(first) = topo.first() {
                            let target = appends[first];
                            graph.add_edge(txn.id, target, RelSet::of(Rel::Rw));
                            explain_index.record(
                                txn.id,
                                target,
                                EdgeWitness {
                                    rel: Rel::Rw,
                                    key: key.clone(),
                                    detail: format!("{key}: read empty, anti-dependency on first append {first}"),
                                },
                            );
                        }
                        continue;
                    }

                    if self_appended.iter().any(|e| !list.contains(e)) {
                        inline.push(InlineAnomaly::InternalInconsistency {
                            key: key.clone(),
                            txn: txn.id,
                        });
                    }

                    let last = list.last().expect("checked non-empty above");
                    match appends.get(last) {
                        None => {
                            inline.push(InlineAnomaly::DirtyRead {
                                key: key.clone(),
                                reading_txn: txn.id,
                            });
                        }
                        Some(&writer) => {
                            graph.add_edge(writer, txn.id, RelSet::of(Rel::Wr));
                            explain_index.record(
                                writer,
                                txn.id,
                                EdgeWitness {
                                    rel: Rel::Wr,
                                    key: key.clone(),
                                    detail: format!("{key}: read prefix ending in {last}"),
                                },
                            );
                            if let Some(&pos) = position.get(last) {
                                if let Some(next_elem) = topo.get(pos + 1) {
                                    let target = appends[next_elem];
                                    graph.add_edge(txn.id, target, RelSet::of(Rel::Rw));
                                    explain_index.record(
                                        txn.id,
                                        target,
                                        EdgeWitness {
                                            rel: Rel::Rw,
                                            key: key.clone(),
                                            detail: format!(
                                                "{key}: read up to {last}, anti-dependency on next append {next_elem}"
                                            ),
                                        },
                                    );
                                }
                            }
                        }
                    }
                }
                ListMop::Read { value: None, .. } | ListMop::Append { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Txn, TxnId, TxnStatus};

    fn history(mops: Vec<(u64, u64, Vec<ListMop<&'static str, u64>>)>) -> History<ListMop<&'static str, u64>> {
        let txns = mops
            .into_iter()
            .enumerate()
            .map(|(i, (process, _, mops))| {
                Txn::new(TxnId(i as u64 + 1), process, TxnStatus::Ok, mops, i as i64, i as i64 + 1)
            })
            .collect();
        History::new(txns).unwrap()
    }

    #[test]
    fn infers_ww_and_wr_from_a_shared_prefix_read() {
        let h = history(vec![
            (1, 0, vec![ListMop::Append { key: "x", elem: 1 }]),
            (1, 0, vec![ListMop::Append { key: "x", elem: 2 }]),
            (
                2,
                0,
                vec![ListMop::Read {
                    key: "x",
                    value: Some(vec![1, 2]),
                }],
            ),
        ]);
        let out = analyze(&h);
        assert!(out.graph.edge(&TxnId(1), &TxnId(2)).unwrap().contains(Rel::Ww));
        assert!(out.graph.edge(&TxnId(2), &TxnId(3)).unwrap().contains(Rel::Wr));
        assert!(out.inline_anomalies.is_empty());
    }

    #[test]
    fn rw_anti_dependency_on_the_next_append() {
        let h = history(vec![
            (1, 0, vec![ListMop::Append { key: "x", elem: 1 }]),
            (1, 0, vec![ListMop::Append { key: "x", elem: 2 }]),
            (
                2,
                0,
                vec![ListMop::Read {
                    key: "x",
                    value: Some(vec![1]),
                }],
            ),
        ]);
        let out = analyze(&h);
        assert!(out.graph.edge(&TxnId(3), &TxnId(2)).unwrap().contains(Rel::Rw));
    }

    #[test]
    fn contradictory_prefixes_are_flagged_incompatible() {
        let h = history(vec![
            (1, 0, vec![ListMop::Append { key: "x", elem: 1 }]),
            (1, 0, vec![ListMop::Append { key: "x", elem: 2 }]),
            (
                2,
                0,
                vec![ListMop::Read {
                    key: "x",
                    value: Some(vec![1, 2]),
                }],
            ),
            (
                3,
                0,
                vec![ListMop::Read {
                    key: "x",
                    value: Some(vec![2, 1]),
                }],
            ),
        ]);
        let out = analyze(&h);
        assert_eq!(out.inline_anomalies.len(), 1);
        assert!(matches!(
            out.inline_anomalies[0],
            InlineAnomaly::IncompatibleOrder { key: "x" }
        ));
    }

    #[test]
    fn reading_an_unknown_element_is_a_dirty_read() {
        let h = history(vec![(
            1,
            0,
            vec![ListMop::Read {
                key: "x",
                value: Some(vec![99]),
            }],
        )]);
        let out = analyze(&h);
        assert_eq!(out.inline_anomalies.len(), 1);
        assert!(matches!(
            out.inline_anomalies[0],
            InlineAnomaly::DirtyRead {
                key: "x",
                reading_txn: TxnId(1)
            }
        ));
    }

    #[test]
    fn own_write_missing_from_own_read_is_internally_inconsistent() {
        let h = history(vec![(
            1,
            0,
            vec![
                ListMop::Append { key: "x", elem: 1 },
                ListMop::Read {
                    key: "x",
                    value: Some(vec![]),
                },
            ],
        )]);
        let out = analyze(&h);
        assert!(out
            .inline_anomalies
            .iter()
            .any(|a| matches!(a, InlineAnomaly::InternalInconsistency { key: "x", txn: TxnId(1) })));
    }
}
