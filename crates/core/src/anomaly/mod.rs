//! Anomaly tags (the Adya-style cycle catalogue plus the non-cycle and
//! unknown-class tags), the priority-ordered search specification (C6), and
//! the cycle classifier (C7).

pub mod classify;
pub mod spec;

use core::fmt::{self, Display, Formatter};

pub use classify::classify;
pub use spec::{specs, AnomalySpec, FilterEx, SearchKind};

/// The five Adya-style cycle families, independent of suffix.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CycleBase {
    G0,
    G1c,
    GSingle,
    GNonadjacent,
    G2Item,
}

impl Display for CycleBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::G0 => "G0",
            Self::G1c => "G1c",
            Self::GSingle => "G-single",
            Self::GNonadjacent => "G-nonadjacent",
            Self::G2Item => "G2-item",
        };
        f.write_str(s)
    }
}

/// Which order-graph relation, if any, a cycle's edges additionally carry.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suffix {
    None,
    Process,
    Realtime,
}

impl Display for Suffix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Process => f.write_str("-process"),
            Self::Realtime => f.write_str("-realtime"),
        }
    }
}

/// A fully-qualified cycle anomaly tag, e.g. `G-single-realtime`.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleTag {
    pub base: CycleBase,
    pub suffix: Suffix,
}

impl Display for CycleTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.suffix)
    }
}

/// Non-cycle anomalies (C8) and the unknown-class analysis anomalies (§7).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonCycleTag {
    AbortedRead,
    IntermediateRead,
    DirtyRead,
    InternalInconsistency,
    LostUpdate,
    EmptyTransactionGraph,
    CycleSearchTimeout,
    IncompatibleOrder,
    AmbiguousVersionOrder,
}

impl Display for NonCycleTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AbortedRead => "AbortedRead",
            Self::IntermediateRead => "IntermediateRead",
            Self::DirtyRead => "DirtyRead",
            Self::InternalInconsistency => "InternalInconsistency",
            Self::LostUpdate => "LostUpdate",
            Self::EmptyTransactionGraph => "EmptyTransactionGraph",
            Self::CycleSearchTimeout => "CycleSearchTimeout",
            Self::IncompatibleOrder => "IncompatibleOrder",
            Self::AmbiguousVersionOrder => "AmbiguousVersionOrder",
        };
        f.write_str(s)
    }
}

/// Every anomaly tag the engine can report, cycle or otherwise.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnomalyTag {
    Cycle(CycleTag),
    NonCycle(NonCycleTag),
}

impl Display for AnomalyTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle(tag) => Display::fmt(tag, f),
            Self::NonCycle(tag) => Display::fmt(tag, f),
        }
    }
}

impl From<CycleTag> for AnomalyTag {
    fn from(tag: CycleTag) -> Self {
        Self::Cycle(tag)
    }
}

impl From<NonCycleTag> for AnomalyTag {
    fn from(tag: NonCycleTag) -> Self {
        Self::NonCycle(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_tag_display_matches_glossary_spelling() {
        let tag = CycleTag {
            base: CycleBase::GSingle,
            suffix: Suffix::Realtime,
        };
        assert_eq!(tag.to_string(), "G-single-realtime");

        let tag = CycleTag {
            base: CycleBase::G0,
            suffix: Suffix::None,
        };
        assert_eq!(tag.to_string(), "G0");
    }

    #[test]
    fn non_cycle_tag_display() {
        assert_eq!(NonCycleTag::LostUpdate.to_string(), "LostUpdate");
    }
}
