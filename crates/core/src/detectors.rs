//! Non-cycle anomaly detectors (C8): aborted reads, intermediate reads, and
//! lost updates. All three are workload-agnostic, expressed purely in terms
//! of [`MopView`] so one implementation serves both the list-append and
//! register dialects.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use crate::model::{History, MopView, TxnId};

/// An `ok` read that observed a value written only by a transaction that is
/// known to have failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortedReadCase<K, V> {
    pub key: K,
    pub value: V,
    pub failed_txn: TxnId,
    pub reading_txn: TxnId,
}

/// An `ok` read that observed a value written by another transaction's
/// non-final (overwritten) write to that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateReadCase<K, V> {
    pub key: K,
    pub value: V,
    pub writing_txn: TxnId,
    pub reading_txn: TxnId,
}

/// Two or more transactions that both read the same first-observed value of
/// a key and both went on to write that key, without anything establishing
/// an order between their writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LostUpdateCase<K, V> {
    pub key: K,
    pub value: V,
    pub txns: Vec<TxnId>,
}

/// Builds `key -> value -> txn` from every write performed by a failed
/// transaction, then flags any `ok` read observing one of those values
/// (§4.8: "Aborted read").
#[must_use]
pub fn aborted_read<M: MopView>(history: &History<M>) -> Vec<AbortedReadCase<M::Key, M::Value>> {
    let mut failed_writes: BTreeMap<M::Key, HashMap<M::Value, TxnId>> = BTreeMap::new();
    for txn in history.fails() {
        for mop in &txn.mops {
            if let Some(v) = mop.written_value() {
                failed_writes
                    .entry(mop.key().clone())
                    .or_default()
                    .entry(v.clone())
                    .or_insert(txn.id);
            }
        }
    }

    let mut out = Vec::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            let Some(by_value) = failed_writes.get(mop.key()) else {
                continue;
            };
            for v in mop.observed_values() {
                if let Some(&failed_txn) = by_value.get(v) {
                    out.push(AbortedReadCase {
                        key: mop.key().clone(),
                        value: v.clone(),
                        failed_txn,
                        reading_txn: txn.id,
                    });
                }
            }
        }
    }
    out.sort_by_key(|c| (c.reading_txn, c.failed_txn));
    out
}

/// Builds `key -> value -> txn` from every non-final write performed by an
/// `ok` transaction (a write later overwritten within the same transaction),
/// then flags any `ok` read *by a different transaction* observing one of
/// those values (§4.8: "Intermediate read").
#[must_use]
pub fn intermediate_read<M: MopView>(
    history: &History<M>,
) -> Vec<IntermediateReadCase<M::Key, M::Value>> {
    let mut intermediate_writes: BTreeMap<M::Key, HashMap<M::Value, TxnId>> = BTreeMap::new();
    for txn in history.oks() {
        let mut last_write_at: BTreeMap<&M::Key, usize> = BTreeMap::new();
        for (i, mop) in txn.mops.iter().enumerate() {
            if mop.written_value().is_some() {
                last_write_at.insert(mop.key(), i);
            }
        }
        for (i, mop) in txn.mops.iter().enumerate() {
            if let Some(v) = mop.written_value() {
                if last_write_at.get(mop.key()) != Some(&i) {
                    intermediate_writes
                        .entry(mop.key().clone())
                        .or_default()
                        .entry(v.clone())
                        .or_insert(txn.id);
                }
            }
        }
    }

    let mut out = Vec::new();
    for txn in history.oks() {
        for mop in &txn.mops {
            let Some(by_value) = intermediate_writes.get(mop.key()) else {
                continue;
            };
            for v in mop.observed_values() {
                if let Some(&writing_txn) = by_value.get(v) {
                    if writing_txn != txn.id {
                        out.push(IntermediateReadCase {
                            key: mop.key().clone(),
                            value: v.clone(),
                            writing_txn,
                            reading_txn: txn.id,
                        });
                    }
                }
            }
        }
    }
    out.sort_by_key(|c| (c.reading_txn, c.writing_txn));
    out
}

/// For each `ok` transaction, records its first read of each key and
/// whether it went on to write that key; groups by `(key, first-read
/// value)`, and flags any group reached by two or more distinct
/// transactions (§4.8: "Lost update").
#[must_use]
pub fn lost_update<M: MopView>(history: &History<M>) -> Vec<LostUpdateCase<M::Key, M::Value>> {
    let mut groups: BTreeMap<M::Key, HashMap<M::Value, Vec<TxnId>>> = BTreeMap::new();

    for txn in history.oks() {
        let mut first_read: BTreeMap<&M::Key, &M::Value> = BTreeMap::new();
        let mut wrote: BTreeSet<&M::Key> = BTreeSet::new();
        for mop in &txn.mops {
            if mop.written_value().is_some() {
                wrote.insert(mop.key());
            } else {
                for v in mop.observed_values() {
                    first_read.entry(mop.key()).or_insert(v);
                }
            }
        }
        for (key, value) in first_read {
            if wrote.contains(key) {
                groups
                    .entry(key.clone())
                    .or_default()
                    .entry(value.clone())
                    .or_default()
                    .push(txn.id);
            }
        }
    }

    let mut out = Vec::new();
    for (key, by_value) in groups {
        for (value, mut txns) in by_value {
            if txns.len() >= 2 {
                txns.sort_unstable();
                out.push(LostUpdateCase { key: key.clone(), value, txns });
            }
        }
    }
    out.sort_by(|a, b| (a.key.clone(), a.txns.clone()).cmp(&(b.key.clone(), b.txns.clone())));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RegisterMop, TxnStatus};

    fn register_history(
        entries: &[(u64, TxnStatus, Vec<RegisterMop<&'static str, u64>>)],
    ) -> History<RegisterMop<&'static str, u64>> {
        let txns = entries
            .iter()
            .map(|(id, status, mops)| {
                crate::model::Txn::new(TxnId(*id), *id, *status, mops.clone(), 0, 1)
            })
            .collect();
        History::new(txns).unwrap()
    }

    #[test]
    fn aborted_read_cites_the_failed_writer() {
        let history = register_history(&[
            (1, TxnStatus::Fail, vec![RegisterMop::Write { key: "x", value: 7 }]),
            (2, TxnStatus::Ok, vec![RegisterMop::Read { key: "x", value: Some(7) }]),
        ]);
        let found = aborted_read(&history);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].failed_txn, TxnId(1));
        assert_eq!(found[0].reading_txn, TxnId(2));
    }

    #[test]
    fn intermediate_read_flags_overwritten_value_seen_by_another_txn() {
        let history = register_history(&[
            (
                1,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Write { key: "x", value: 1 },
                    RegisterMop::Write { key: "x", value: 2 },
                ],
            ),
            (2, TxnStatus::Ok, vec![RegisterMop::Read { key: "x", value: Some(1) }]),
        ]);
        let found = intermediate_read(&history);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].writing_txn, TxnId(1));
        assert_eq!(found[0].reading_txn, TxnId(2));
    }

    #[test]
    fn lost_update_groups_concurrent_writers_of_the_same_base_value() {
        let history = register_history(&[
            (1, TxnStatus::Ok, vec![RegisterMop::Write { key: "x", value: 0 }]),
            (
                2,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "x", value: Some(0) },
                    RegisterMop::Write { key: "x", value: 1 },
                ],
            ),
            (
                3,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "x", value: Some(0) },
                    RegisterMop::Write { key: "x", value: 2 },
                ],
            ),
        ]);
        let found = lost_update(&history);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].txns, vec![TxnId(2), TxnId(3)]);
    }

    #[test]
    fn no_lost_update_when_only_one_txn_writes_after_reading() {
        let history = register_history(&[
            (1, TxnStatus::Ok, vec![RegisterMop::Write { key: "x", value: 0 }]),
            (
                2,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "x", value: Some(0) },
                    RegisterMop::Write { key: "x", value: 1 },
                ],
            ),
        ]);
        assert!(lost_update(&history).is_empty());
    }
}
