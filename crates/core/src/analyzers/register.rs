//! The read-write register analyzer (§4.2.2): weaker than the list-append
//! analyzer by construction — a register read only reveals a single value,
//! not a prefix, so `ww` order is only recovered where a transaction's own
//! read-then-write on the same key witnesses it directly, or where two
//! writes to the same key have no real-time overlap at all. Anything else
//! stays unordered. The lost-update detector (C8.3) exists precisely to
//! compensate for the anomalies this conservatism leaves unreported.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use super::{AnalyzerOutput, InlineAnomaly};
use crate::explain::{EdgeWitness, ExplainIndex};
use crate::graph::{Graph, Rel, RelSet};
use crate::model::{History, RegisterMop, TxnId};

/// Runs the register analyzer over every key touched by the history.
#[must_use]
pub fn analyze<K, V>(history: &History<RegisterMop<K, V>>) -> AnalyzerOutput<K>
where
    K: Ord + Clone + Display,
    V: Ord + Clone + Display,
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

fn analyze_key<K, V>(
    key: &K,
    history: &History<RegisterMop<K, V>>,
    graph: &mut Graph<TxnId>,
    explain_index: &mut ExplainIndex<K>,
    inline: &mut Vec<InlineAnomaly<K>>,
) where
    K: Ord + Clone + Display,
    V: Ord + Clone + Display,
{
    let mut writes_ok: BTreeMap<V, Vec<TxnId>> = BTreeMap::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let RegisterMop::Write { value, .. } = mop {
                writes_ok.entry(value.clone()).or_default().push(txn.id);
            }
        }
    }
    let mut writes_info: BTreeMap<V, Vec<TxnId>> = BTreeMap::new();
    for txn in history.infos() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let RegisterMop::Write { value, .. } = mop {
                writes_info.entry(value.clone()).or_default().push(txn.id);
            }
        }
    }

    let mut witnessed: BTreeSet<V> = BTreeSet::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let RegisterMop::Read { value: Some(v), .. } = mop {
                witnessed.insert(v.clone());
            }
        }
    }

    // The writer of a value: the earliest-indexed transaction that wrote
    // it, picked deterministically when more than one did (§4.2.2 rule 1).
    let mut writer_of: BTreeMap<V, TxnId> = BTreeMap::new();
    for (value, txns) in &writes_ok {
        let chosen = *txns.iter().min().expect("non-empty by construction");
        writer_of.insert(value.clone(), chosen);
        if txns.len() > 1 {
            inline.push(InlineAnomaly::AmbiguousVersionOrder {
                key: key.clone(),
                chosen,
            });
        }
    }
    for (value, txns) in &writes_info {
        if witnessed.contains(value) {
            let chosen = *txns.iter().min().expect("non-empty by construction");
            writer_of.entry(value.clone()).or_insert(chosen);
        }
    }

    // `ww` edges: only where a transaction itself read one value on this key
    // and then wrote another, directly witnessing that the value it read
    // preceded the one it installed.
    let mut ww_out: BTreeMap<TxnId, BTreeSet<TxnId>> = BTreeMap::new();
    for txn in history.oks() {
        let mut last_read: Option<&V> = None;
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            match mop {
                RegisterMop::Read { value: Some(v), .. } => last_read = Some(v),
                RegisterMop::Read { value: None, .. } => {}
                RegisterMop::Write { value, .. } => {
                    if let Some(prev) = last_read {
                        if let Some(&writer) = writer_of.get(prev) {
                            if writer != txn.id {
                                graph.add_edge(writer, txn.id, RelSet::of(Rel::Ww));
                                ww_out.entry(writer).or_default().insert(txn.id);
                                explain_index.record(
                                    writer,
                                    txn.id,
                                    EdgeWitness {
                                        rel: Rel::Ww,
                                        key: key.clone(),
                                        detail: format!("{key}: read {prev}, then wrote {value}"),
                                    },
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    // `ww` edges, fallback: two writes to the same key with no real-time
    // overlap can be ordered even without a read witnessing them directly —
    // a write that completes before another invokes cannot have installed
    // the later version (§4.2.2 rule 2's "read-observed version graph" is
    // silent here, but the history's own wall-clock order is still
    // evidence, not a guess). Only fills gaps the witness pass above left
    // open; RMW-witnessed order always wins when the two disagree.
    let mut key_writes: Vec<(TxnId, &V, i64, i64)> = Vec::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            if let RegisterMop::Write { value, .. } = mop {
                key_writes.push((txn.id, value, txn.invoke_time_ns, txn.complete_time_ns));
            }
        }
    }
    for &(a, a_value, _, a_complete) in &key_writes {
        for &(b, b_value, b_invoke, _) in &key_writes {
            if a == b || a_value == b_value || a_complete >= b_invoke {
                continue;
            }
            let already_ordered = ww_out.get(&a).is_some_and(|s| s.contains(&b))
                || ww_out.get(&b).is_some_and(|s| s.contains(&a));
            if already_ordered {
                continue;
            }
            graph.add_edge(a, b, RelSet::from_iter([Rel::Ww, Rel::Realtime]));
            ww_out.entry(a).or_default().insert(b);
            explain_index.record(
                a,
                b,
                EdgeWitness {
                    rel: Rel::Ww,
                    key: key.clone(),
                    detail: format!("{key}: wrote {a_value}, completed before {b} invoked (no read witnesses the order, but they never overlapped)"),
                },
            );
        }
    }

    // `wr`/`rw` edges: every ok read links back to its resolved writer, and
    // forward (anti-dependency) to whichever transaction's write the `ww`
    // chain places immediately after it.
    for txn in history.oks() {
        for mop in &txn.mops {
            if mop.key() != key {
                continue;
            }
            let RegisterMop::Read { value: Some(v), .. } = mop else {
                continue;
            };
            let Some(&writer) = writer_of.get(v) else {
                continue;
            };
            graph.add_edge(writer, txn.id, RelSet::of(Rel::Wr));
            explain_index.record(
                writer,
                txn.id,
                EdgeWitness {
                    rel: Rel::Wr,
                    key: key.clone(),
                    detail: format!("{key}: read {v}"),
                },
            );
            if let Some(successors) = ww_out.get(&writer) {
                for &successor in successors {
                    if successor == txn.id {
                        continue;
                    }
                    graph.add_edge(txn.id, successor, RelSet::of(Rel::Rw));
                    explain_index.record(
                        txn.id,
                        successor,
                        EdgeWitness {
                            rel: Rel::Rw,
                            key: key.clone(),
                            detail: format!("{key}: read {v}, anti-dependency on its next writer"),
                        },
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Txn, TxnId, TxnStatus};

    fn history(mops: Vec<(u64, Vec<RegisterMop<&'static str, u64>>)>) -> History<RegisterMop<&'static str, u64>> {
        let txns = mops
            .into_iter()
            .enumerate()
            .map(|(i, (process, mops))| {
                Txn::new(TxnId(i as u64 + 1), process, TxnStatus::Ok, mops, i as i64, i as i64 + 1)
            })
            .collect();
        History::new(txns).unwrap()
    }

    #[test]
    fn wr_edge_links_writer_to_reader() {
        let h = history(vec![
            (0, vec![RegisterMop::Write { key: "x", value: 1 }]),
            (
                1,
                vec![RegisterMop::Read {
                    key: "x",
                    value: Some(1),
                }],
            ),
        ]);
        let out = analyze(&h);
        assert!(out.graph.edge(&TxnId(1), &TxnId(2)).unwrap().contains(Rel::Wr));
    }

    #[test]
    fn read_modify_write_infers_ww_and_rw() {
        let h = history(vec![
            (0, vec![RegisterMop::Write { key: "x", value: 1 }]),
            (
                1,
                vec![
                    RegisterMop::Read {
                        key: "x",
                        value: Some(1),
                    },
                    RegisterMop::Write { key: "x", value: 2 },
                ],
            ),
            (
                2,
                vec![RegisterMop::Read {
                    key: "x",
                    value: Some(1),
                }],
            ),
        ]);
        let out = analyze(&h);
        assert!(out.graph.edge(&TxnId(1), &TxnId(2)).unwrap().contains(Rel::Ww));
        assert!(out.graph.edge(&TxnId(3), &TxnId(2)).unwrap().contains(Rel::Rw));
    }

    #[test]
    fn concurrent_blind_writes_are_flagged_ambiguous() {
        let h = history(vec![
            (0, vec![RegisterMop::Write { key: "x", value: 1 }]),
            (1, vec![RegisterMop::Write { key: "x", value: 1 }]),
        ]);
        let out = analyze(&h);
        assert_eq!(out.inline_anomalies.len(), 1);
        assert!(matches!(
            out.inline_anomalies[0],
            InlineAnomaly::AmbiguousVersionOrder {
                key: "x",
                chosen: TxnId(1)
            }
        ));
    }

    #[test]
    fn reading_an_unwritten_value_infers_no_edge() {
        let h = history(vec![(
            0,
            vec![RegisterMop::Read {
                key: "x",
                value: Some(7),
            }],
        )]);
        let out = analyze(&h);
        assert_eq!(out.graph.edges().count(), 0);
        assert!(out.inline_anomalies.is_empty());
    }
}
