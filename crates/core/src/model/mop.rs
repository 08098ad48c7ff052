//! Micro-operations: the reads/writes/appends inside a single transaction.
//!
//! The engine supports two workload dialects (see [`crate::analyzers`]), each
//! with its own mop shape. They are kept as distinct types rather than one
//! enum with dead variants, mirroring the teacher's `Event<Variable, Version>`
//! split by role rather than by a single do-everything sum type.

use core::fmt::{self, Debug, Display, Formatter};

/// A read or write on a scalar register, keyed by `K` with value type `V`.
///
/// `Read { value: None }` represents a read whose result is unknown, which
/// occurs on non-`ok` transactions (the client never learned what, if
/// anything, was observed).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub enum RegisterMop<K, V> {
    Read { key: K, value: Option<V> },
    Write { key: K, value: V },
}

impl<K, V> RegisterMop<K, V> {
    #[must_use]
    pub const fn key(&self) -> &K {
        match self {
            Self::Read { key, .. } | Self::Write { key, .. } => key,
        }
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

impl<K: Debug, V: Debug> Debug for RegisterMop<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { key, value: Some(v) } => write!(f, "r({key:?}, {v:?})"),
            Self::Read { key, value: None } => write!(f, "r({key:?}, nil)"),
            Self::Write { key, value } => write!(f, "w({key:?}, {value:?})"),
        }
    }
}

impl<K: Display, V: Display> Display for RegisterMop<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { key, value: Some(v) } => write!(f, "r({key}, {v})"),
            Self::Read { key, value: None } => write!(f, "r({key}, nil)"),
            Self::Write { key, value } => write!(f, "w({key}, {value})"),
        }
    }
}

/// A read-of-a-prefix or append on a list-valued key, keyed by `K` with
/// element type `E`.
///
/// `Read { value: None }` is a read whose result is unknown (non-`ok` txn).
/// `Read { value: Some(elems) }` holds the observed prefix in append order.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub enum ListMop<K, E> {
    Read { key: K, value: Option<Vec<E>> },
    Append { key: K, elem: E },
}

impl<K, E> ListMop<K, E> {
    #[must_use]
    pub const fn key(&self) -> &K {
        match self {
            Self::Read { key, .. } | Self::Append { key, .. } => key,
        }
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    #[must_use]
    pub const fn is_append(&self) -> bool {
        matches!(self, Self::Append { .. })
    }
}

impl<K: Debug, E: Debug> Debug for ListMop<K, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { key, value: Some(v) } => write!(f, "r({key:?}, {v:?})"),
            Self::Read { key, value: None } => write!(f, "r({key:?}, nil)"),
            Self::Append { key, elem } => write!(f, "append({key:?}, {elem:?})"),
        }
    }
}

impl<K: Display, E: Display> Display for ListMop<K, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { key, value: Some(v) } => {
                write!(f, "r({key}, [")?;
                for (i, e) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "])")
            }
            Self::Read { key, value: None } => write!(f, "r({key}, nil)"),
            Self::Append { key, elem } => write!(f, "append({key}, {elem})"),
        }
    }
}

/// A uniform view over a mop's key and the value(s) it writes or observes,
/// used by the non-cycle detectors (C8) which don't care whether a
/// transaction ran the list-append or register dialect.
///
/// For a register mop the "observed values" of a read is at most the one
/// value it saw; for a list mop it is every element of the observed prefix
/// (an aborted or intermediate write can appear anywhere in that prefix,
/// not only at its tail).
pub trait MopView {
    type Key: Ord + Clone;
    type Value: Eq + Clone + core::hash::Hash;

    fn key(&self) -> &Self::Key;
    /// The single value this mop installs, if it is a write/append.
    fn written_value(&self) -> Option<&Self::Value>;
    /// Every value this mop's read demonstrates as visible, if it is a read.
    fn observed_values(&self) -> Vec<&Self::Value>;
}

impl<K: Ord + Clone, V: Eq + Clone + core::hash::Hash> MopView for RegisterMop<K, V> {
    type Key = K;
    type Value = V;

    fn key(&self) -> &K {
        RegisterMop::key(self)
    }

    fn written_value(&self) -> Option<&V> {
        match self {
            Self::Write { value, .. } => Some(value),
            Self::Read { .. } => None,
        }
    }

    fn observed_values(&self) -> Vec<&V> {
        match self {
            Self::Read { value: Some(v), .. } => vec![v],
            Self::Read { value: None, .. } | Self::Write { .. } => Vec::new(),
        }
    }
}

impl<K: Ord + Clone, E: Eq + Clone + core::hash::Hash> MopView for ListMop<K, E> {
    type Key = K;
    type Value = E;

    fn key(&self) -> &K {
        ListMop::key(self)
    }

    fn written_value(&self) -> Option<&E> {
        match self {
            Self::Append { elem, .. } => Some(elem),
            Self::Read { .. } => None,
        }
    }

    fn observed_values(&self) -> Vec<&E> {
        match self {
            Self::Read { value: Some(v), .. } => v.iter().collect(),
            Self::Read { value: None, .. } | Self::Append { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_mop_key_and_kind() {
        let read: RegisterMop<&str, u64> = RegisterMop::Read {
            key: "x",
            value: Some(1),
        };
        assert_eq!(*read.key(), "x");
        assert!(read.is_read());
        assert!(!read.is_write());

        let write: RegisterMop<&str, u64> = RegisterMop::Write { key: "x", value: 2 };
        assert!(write.is_write());
    }

    #[test]
    fn list_mop_display() {
        let read: ListMop<&str, u64> = ListMop::Read {
            key: "x",
            value: Some(vec![1, 2, 3]),
        };
        assert_eq!(format!("{read}"), "r(x, [1, 2, 3])");

        let append: ListMop<&str, u64> = ListMop::Append { key: "x", elem: 4 };
        assert_eq!(format!("{append}"), "append(x, 4)");
    }

    #[test]
    fn register_mop_debug_nil_read() {
        let read: RegisterMop<&str, u64> = RegisterMop::Read { key: "x", value: None };
        assert_eq!(format!("{read:?}"), "r(\"x\", nil)");
    }
}
