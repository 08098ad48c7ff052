//! The history model (component C1): a normalized, validated view over the
//! recorded transactions that every downstream component reads from.

pub mod mop;
pub mod txn;

use std::collections::BTreeMap;

pub use mop::{ListMop, MopView, RegisterMop};
pub use txn::{ProcessId, TxnId, TxnStatus};

use crate::error::Error;
pub use txn::Txn;

/// A validated, immutable recorded history: a flat, index-ordered sequence
/// of transactions of mop-type `M`.
///
/// Ingestion happens once; after [`History::new`] returns `Ok`, the history
/// is never mutated (per the lifecycle described in the data model).
#[derive(Debug, Clone)]
pub struct History<M> {
    txns: Vec<Txn<M>>,
}

impl<M> History<M> {
    /// Build a history from transactions, asserting the structural
    /// preconditions: strictly increasing, unique ids, and
    /// `invoke_time_ns <= complete_time_ns` for every transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedOp`] if the ids are not strictly
    /// increasing (which also catches duplicates), or if any transaction's
    /// invocation is timestamped after its own completion.
    pub fn new(mut txns: Vec<Txn<M>>) -> Result<Self, Error> {
        txns.sort_by_key(|t| t.id);

        let mut prev: Option<TxnId> = None;
        for txn in &txns {
            if let Some(p) = prev {
                if txn.id <= p {
                    return Err(Error::MalformedOp {
                        detail: format!("duplicate or non-increasing id {} after {p}", txn.id),
                    });
                }
            }
            if txn.invoke_time_ns > txn.complete_time_ns {
                return Err(Error::MalformedOp {
                    detail: format!(
                        "txn {} completes ({}) before it invokes ({})",
                        txn.id, txn.complete_time_ns, txn.invoke_time_ns
                    ),
                });
            }
            prev = Some(txn.id);
        }

        Ok(Self { txns })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.txns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    #[must_use]
    pub fn all(&self) -> &[Txn<M>] {
        &self.txns
    }

    #[must_use]
    pub fn get(&self, id: TxnId) -> Option<&Txn<M>> {
        // Ids are dense-ish and sorted; binary search is safe since `new`
        // establishes strictly-increasing order.
        self.txns
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.txns[i])
    }

    /// Committed transactions, in ascending id order.
    pub fn oks(&self) -> impl Iterator<Item = &Txn<M>> {
        self.txns.iter().filter(|t| matches!(t.status, TxnStatus::Ok))
    }

    /// Definitely-aborted transactions, in ascending id order.
    pub fn fails(&self) -> impl Iterator<Item = &Txn<M>> {
        self.txns.iter().filter(|t| matches!(t.status, TxnStatus::Fail))
    }

    /// Indeterminate-outcome transactions, in ascending id order.
    pub fn infos(&self) -> impl Iterator<Item = &Txn<M>> {
        self.txns.iter().filter(|t| matches!(t.status, TxnStatus::Info))
    }

    /// Ok and info transactions: everything that is a legitimate graph node
    /// candidate (per the data model, only `fail`-status transactions are
    /// categorically excluded from the dependency graph).
    pub fn completed(&self) -> impl Iterator<Item = &Txn<M>> {
        self.txns
            .iter()
            .filter(|t| !matches!(t.status, TxnStatus::Fail))
    }

    /// Each process's transactions, in submission (ascending id) order.
    #[must_use]
    pub fn by_process(&self) -> BTreeMap<ProcessId, Vec<TxnId>> {
        let mut map: BTreeMap<ProcessId, Vec<TxnId>> = BTreeMap::new();
        for txn in &self.txns {
            map.entry(txn.process).or_default().push(txn.id);
        }
        map
    }

    /// Stream of `(TxnId, &M)` pairs, preserving per-transaction mop order.
    pub fn op_mops(&self) -> impl Iterator<Item = (TxnId, &M)> {
        self.txns.iter().flat_map(|t| t.mops.iter().map(move |m| (t.id, m)))
    }
}
