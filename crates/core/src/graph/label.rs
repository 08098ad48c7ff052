//! Edge labels (§3: "each edge has a non-empty label set drawn from
//! `{ww, wr, rw, process, realtime}`"), and the small bitset that
//! represents a set of them.

use core::fmt::{self, Display, Formatter};

/// A single edge relation.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rel {
    /// Write-write: direct version-order edge between consecutive writers.
    Ww,
    /// Write-read: from the writer of a version to a transaction that read it.
    Wr,
    /// Read-write (anti-dependency): from a reader of version `v_i` to the
    /// writer of a strictly later version `v_j`.
    Rw,
    /// Between consecutive completions submitted by the same process.
    Process,
    /// From a transaction whose completion precedes another's invocation.
    Realtime,
}

impl Rel {
    const fn bit(self) -> u8 {
        match self {
            Self::Ww => 1 << 0,
            Self::Wr => 1 << 1,
            Self::Rw => 1 << 2,
            Self::Process => 1 << 3,
            Self::Realtime => 1 << 4,
        }
    }
}

impl Display for Rel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ww => "ww",
            Self::Wr => "wr",
            Self::Rw => "rw",
            Self::Process => "process",
            Self::Realtime => "realtime",
        };
        f.write_str(s)
    }
}

/// A non-empty (once constructed from at least one [`Rel`]) set of
/// relations labeling one arc. Parallel edges with distinct label sets are
/// merged by set union (§3) — [`RelSet::insert`] implements that merge.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelSet(u8);

impl RelSet {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn of(rel: Rel) -> Self {
        Self(rel.bit())
    }

    #[must_use]
    pub fn from_iter(rels: impl IntoIterator<Item = Rel>) -> Self {
        let mut set = Self::EMPTY;
        for rel in rels {
            set.insert(rel);
        }
        set
    }

    pub fn insert(&mut self, rel: Rel) {
        self.0 |= rel.bit();
    }

    pub fn insert_all(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[must_use]
    pub const fn contains(self, rel: Rel) -> bool {
        self.0 & rel.bit() != 0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn iter(self) -> impl Iterator<Item = Rel> {
        [Rel::Ww, Rel::Wr, Rel::Rw, Rel::Process, Rel::Realtime]
            .into_iter()
            .filter(move |r| self.contains(*r))
    }
}

impl FromIterator<Rel> for RelSet {
    fn from_iter<T: IntoIterator<Item = Rel>>(iter: T) -> Self {
        Self::from_iter(iter)
    }
}

impl Display for RelSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, rel) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{rel}")?;
        }
        write!(f, "}}")
    }
}
