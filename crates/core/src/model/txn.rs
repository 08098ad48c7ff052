//! Transaction (completion) records: the nodes of the dependency graph.
//!
//! The source history format distinguishes an `invoke` event from its
//! matching terminal (`ok`/`fail`/`info`) event. This implementation folds
//! the two into a single [`Txn`], since nothing downstream of edge inference
//! needs them apart: the terminal event's `index` is the graph node
//! identity, and the invoke's wall-clock time survives as `invoke_time_ns`
//! for realtime-order inference.

use core::fmt::{self, Debug, Display, Formatter};

/// Uniquely identifies a transaction by the index of its terminal record.
///
/// Indices are dense enough to totally order events (per the history
/// invariant); `TxnId` ordering is therefore also the history's submission
/// order for completions.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxnId(pub u64);

impl Display for TxnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// The process (client/session) that submitted a transaction.
pub type ProcessId = u64;

/// The terminal status of a transaction.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnStatus {
    /// The transaction committed; its writes are visible and its reads are trustworthy.
    Ok,
    /// The transaction is known to have aborted; its writes never became visible.
    Fail,
    /// The transaction's outcome is unknown (the client stopped waiting).
    Info,
}

impl TxnStatus {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A single transaction: a sequence of mops of type `M`, submitted by one
/// process, with its terminal status and the wall-clock span of its
/// invocation and completion.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Txn<M> {
    pub id: TxnId,
    pub process: ProcessId,
    pub status: TxnStatus,
    pub mops: Vec<M>,
    pub invoke_time_ns: i64,
    pub complete_time_ns: i64,
}

impl<M> Txn<M> {
    #[must_use]
    pub fn new(
        id: TxnId,
        process: ProcessId,
        status: TxnStatus,
        mops: Vec<M>,
        invoke_time_ns: i64,
        complete_time_ns: i64,
    ) -> Self {
        Self {
            id,
            process,
            status,
            mops,
            invoke_time_ns,
            complete_time_ns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txn_id_display() {
        assert_eq!(format!("{}", TxnId(7)), "T7");
    }

    #[test]
    fn txn_status_is_ok() {
        assert!(TxnStatus::Ok.is_ok());
        assert!(!TxnStatus::Fail.is_ok());
        assert!(!TxnStatus::Info.is_ok());
    }
}
