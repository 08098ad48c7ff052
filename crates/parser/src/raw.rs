//! The decoded-but-not-yet-validated op record (§6, "History input"): the
//! common landing zone for both on-disk encodings before a workload-specific
//! conversion lifts them into a [`knotcheck_core::model::History`].
//!
//! Parsing itself is an external collaborator to the core (§1: "parsing of
//! history files (EDN/JSON) into op records" is out of scope for the
//! engine). This module is the seam: it owns the decoding, the core only
//! ever sees the typed [`knotcheck_core::model`] records built from it.

use std::collections::BTreeMap;

use knotcheck_core::model::{History, ListMop, RegisterMop, Txn, TxnId, TxnStatus};

/// The terminal/invocation tag of one op record (§3: "a `type` ∈ {`invoke`,
/// `ok`, `fail`, `info`}").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Invoke,
    Ok,
    Fail,
    Info,
}

/// A scalar or list value observed or written by a mop (§3: "for `:r`, `v`
/// is the observed value (a scalar for rw-register; a sequence for
/// list-append)").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Int(i64),
    List(Vec<i64>),
}

impl RawValue {
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[i64]> {
        match self {
            Self::List(v) => Some(v),
            Self::Int(_) => None,
        }
    }
}

/// One `(f, k, v)` mop triple, still undecided between the list-append and
/// register dialects (§3, "Mop").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMop {
    Read { key: String, value: Option<RawValue> },
    Write { key: String, value: RawValue },
    Append { key: String, value: RawValue },
}

/// One decoded op record (§3, "Operation (Op)").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOp {
    pub index: u64,
    pub process: u64,
    pub kind: OpKind,
    pub time_ns: i64,
    pub mops: Vec<RawMop>,
}

/// A defect found while lifting decoded op records into a validated
/// history: an invoke without a matching terminal, a terminal with no
/// matching invoke, or a mop shape inconsistent with the chosen workload
/// dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub detail: String,
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for BuildError {}

fn err(detail: impl Into<String>) -> BuildError {
    BuildError { detail: detail.into() }
}

/// Pairs each terminal op with the invocation it completes, by process,
/// assuming (per §3) at most one outstanding invocation per process at a
/// time. Returns `(invoke, terminal)` pairs in terminal-index order.
fn pair_invocations(ops: Vec<RawOp>) -> Result<Vec<(RawOp, RawOp)>, BuildError> {
    let mut pending: BTreeMap<u64, Vec<RawOp>> = BTreeMap::new();
    let mut pairs = Vec::new();

    for op in ops {
        match op.kind {
            OpKind::Invoke => {
                pending.entry(op.process).or_default().push(op);
            }
            OpKind::Ok | OpKind::Fail | OpKind::Info => {
                let queue = pending.entry(op.process).or_default();
                let invoke = queue.pop().ok_or_else(|| {
                    err(format!(
                        "terminal op at index {} (process {}) has no matching invoke",
                        op.index, op.process
                    ))
                })?;
                pairs.push((invoke, op));
            }
        }
    }

    for (process, left) in &pending {
        if !left.is_empty() {
            return Err(err(format!(
                "process {process} has {} unmatched invocation(s)",
                left.len()
            )));
        }
    }

    pairs.sort_by_key(|(_, terminal)| terminal.index);
    Ok(pairs)
}

fn status_of(kind: OpKind) -> TxnStatus {
    match kind {
        OpKind::Ok => TxnStatus::Ok,
        OpKind::Fail => TxnStatus::Fail,
        OpKind::Invoke | OpKind::Info => TxnStatus::Info,
    }
}

/// Lifts decoded op records into a [`History`] of [`ListMop`]s, interpreting
/// `:r` values as observed prefixes and `:append` values as the single
/// appended element.
///
/// # Errors
///
/// Returns a [`BuildError`] if invocations and terminals cannot be paired,
/// or if a mop's shape doesn't fit the list-append dialect (e.g. a `:w`
/// mop, or an `:r` carrying a scalar rather than a list).
pub fn into_list_append_history(ops: Vec<RawOp>) -> Result<History<ListMop<String, i64>>, BuildError> {
    let pairs = pair_invocations(ops)?;
    let mut txns = Vec::with_capacity(pairs.len());

    for (invoke, terminal) in pairs {
        let mut mops = Vec::with_capacity(terminal.mops.len());
        for mop in terminal.mops {
            let converted = match mop {
                RawMop::Read { key, value: None } => ListMop::Read { key, value: None },
                RawMop::Read { key, value: Some(RawValue::List(elems)) } => {
                    ListMop::Read { key, value: Some(elems) }
                }
                RawMop::Read { key, value: Some(RawValue::Int(_)) } => {
                    return Err(err(format!(
                        "list-append read of {key} carries a scalar value, expected a list"
                    )));
                }
                RawMop::Append { key, value } => {
                    let elem = value
                        .as_int()
                        .ok_or_else(|| err(format!("list-append append to {key} carries a list, expected a scalar")))?;
                    ListMop::Append { key, elem }
                }
                RawMop::Write { key, .. } => {
                    return Err(err(format!("list-append history contains a `:w` mop on {key}, expected `:append`")));
                }
            };
            mops.push(converted);
        }
        txns.push(Txn::new(
            TxnId(terminal.index),
            terminal.process,
            status_of(terminal.kind),
            mops,
            invoke.time_ns,
            terminal.time_ns,
        ));
    }

    History::new(txns).map_err(|e| err(e.to_string()))
}

/// Lifts decoded op records into a [`History`] of [`RegisterMop`]s.
///
/// # Errors
///
/// Returns a [`BuildError`] under the same conditions as
/// [`into_list_append_history`], adapted to the register dialect (`:append`
/// is rejected; `:r`/`:w` must carry scalars).
pub fn into_register_history(ops: Vec<RawOp>) -> Result<History<RegisterMop<String, i64>>, BuildError> {
    let pairs = pair_invocations(ops)?;
    let mut txns = Vec::with_capacity(pairs.len());

    for (invoke, terminal) in pairs {
        let mut mops = Vec::with_capacity(terminal.mops.len());
        for mop in terminal.mops {
            let converted = match mop {
                RawMop::Read { key, value: None } => RegisterMop::Read { key, value: None },
                RawMop::Read { key, value: Some(RawValue::Int(v)) } => RegisterMop::Read { key, value: Some(v) },
                RawMop::Read { key, value: Some(RawValue::List(_)) } => {
                    return Err(err(format!("register read of {key} carries a list, expected a scalar")));
                }
                RawMop::Write { key, value } => {
                    let v = value
                        .as_int()
                        .ok_or_else(|| err(format!("register write to {key} carries a list, expected a scalar")))?;
                    RegisterMop::Write { key, value: v }
                }
                RawMop::Append { key, .. } => {
                    return Err(err(format!("register history contains an `:append` mop on {key}, expected `:w`")));
                }
            };
            mops.push(converted);
        }
        txns.push(Txn::new(
            TxnId(terminal.index),
            terminal.process,
            status_of(terminal.kind),
            mops,
            invoke.time_ns,
            terminal.time_ns,
        ));
    }

    History::new(txns).map_err(|e| err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(index: u64, process: u64, kind: OpKind, time_ns: i64, mops: Vec<RawMop>) -> RawOp {
        RawOp { index, process, kind, time_ns, mops }
    }

    #[test]
    fn pairs_invoke_with_its_terminal_and_keeps_invoke_time() {
        let ops = vec![
            op(0, 0, OpKind::Invoke, 10, vec![RawMop::Append { key: "x".into(), value: RawValue::Int(1) }]),
            op(1, 0, OpKind::Ok, 20, vec![RawMop::Append { key: "x".into(), value: RawValue::Int(1) }]),
        ];
        let history = into_list_append_history(ops).unwrap();
        assert_eq!(history.len(), 1);
        let txn = history.get(TxnId(1)).unwrap();
        assert_eq!(txn.invoke_time_ns, 10);
        assert_eq!(txn.complete_time_ns, 20);
        assert_eq!(txn.status, TxnStatus::Ok);
    }

    #[test]
    fn terminal_without_invoke_is_an_error() {
        let ops = vec![op(0, 0, OpKind::Ok, 10, vec![])];
        assert!(into_list_append_history(ops).is_err());
    }

    #[test]
    fn unmatched_invoke_is_an_error() {
        let ops = vec![op(0, 0, OpKind::Invoke, 10, vec![])];
        assert!(into_list_append_history(ops).is_err());
    }

    #[test]
    fn register_write_with_list_value_is_rejected() {
        let ops = vec![
            op(0, 0, OpKind::Invoke, 0, vec![]),
            op(
                1,
                0,
                OpKind::Ok,
                1,
                vec![RawMop::Write { key: "x".into(), value: RawValue::List(vec![1]) }],
            ),
        ];
        assert!(into_register_history(ops).is_err());
    }

    #[test]
    fn list_append_read_returns_observed_prefix() {
        let ops = vec![
            op(0, 0, OpKind::Invoke, 0, vec![]),
            op(
                1,
                0,
                OpKind::Ok,
                1,
                vec![RawMop::Read { key: "x".into(), value: Some(RawValue::List(vec![1, 2])) }],
            ),
        ];
        let history = into_list_append_history(ops).unwrap();
        let txn = history.get(TxnId(1)).unwrap();
        assert_eq!(txn.mops, vec![ListMop::Read { key: "x".into(), value: Some(vec![1, 2]) }]);
    }
}
