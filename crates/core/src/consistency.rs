//! The consistency-model catalogue and the result aggregator (C9): maps a
//! requested set of consistency models to the anomalies they prohibit, and
//! reduces a set of findings to a tri-state verdict.

use std::collections::BTreeSet;
use core::fmt::{self, Display, Formatter};

use crate::anomaly::{AnomalyTag, CycleBase, CycleTag, NonCycleTag, Suffix};

/// A named consistency model, ordered weakest-to-strongest by declaration
/// order (so `derive(Ord)` gives exactly the hierarchy §4.9.1 describes).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsistencyModel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    SnapshotIsolation,
    Serializable,
    StrictSerializable,
}

/// Declaration order, weakest to strongest — also the iteration order used
/// to accumulate prohibitions.
pub const ALL_MODELS: [ConsistencyModel; 6] = [
    ConsistencyModel::ReadUncommitted,
    ConsistencyModel::ReadCommitted,
    ConsistencyModel::RepeatableRead,
    ConsistencyModel::SnapshotIsolation,
    ConsistencyModel::Serializable,
    ConsistencyModel::StrictSerializable,
];

impl Default for ConsistencyModel {
    /// `strict-serializable` is the default per §6.
    fn default() -> Self {
        Self::StrictSerializable
    }
}

impl Display for ConsistencyModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReadUncommitted => "read-uncommitted",
            Self::ReadCommitted => "read-committed",
            Self::RepeatableRead => "repeatable-read",
            Self::SnapshotIsolation => "snapshot-isolation",
            Self::Serializable => "serializable",
            Self::StrictSerializable => "strict-serializable",
        };
        f.write_str(s)
    }
}

fn cycle(base: CycleBase, suffix: Suffix) -> AnomalyTag {
    AnomalyTag::Cycle(CycleTag { base, suffix })
}

fn non_cycle(tag: NonCycleTag) -> AnomalyTag {
    AnomalyTag::NonCycle(tag)
}

/// The anomalies a model prohibits *in addition to* every weaker model's
/// prohibitions (§4.9.1's table, read row by row).
fn additions(model: ConsistencyModel) -> Vec<AnomalyTag> {
    match model {
        ConsistencyModel::ReadUncommitted => vec![],
        ConsistencyModel::ReadCommitted => vec![
            cycle(CycleBase::G0, Suffix::None),
            non_cycle(NonCycleTag::AbortedRead),
            non_cycle(NonCycleTag::IntermediateRead),
        ],
        ConsistencyModel::RepeatableRead => vec![
            cycle(CycleBase::G1c, Suffix::None),
            non_cycle(NonCycleTag::LostUpdate),
        ],
        ConsistencyModel::SnapshotIsolation => vec![
            cycle(CycleBase::GSingle, Suffix::None),
            cycle(CycleBase::GSingle, Suffix::Realtime),
        ],
        ConsistencyModel::Serializable => vec![
            cycle(CycleBase::GNonadjacent, Suffix::None),
            cycle(CycleBase::G2Item, Suffix::None),
        ],
        ConsistencyModel::StrictSerializable => vec![
            cycle(CycleBase::G0, Suffix::Realtime),
            cycle(CycleBase::G1c, Suffix::Realtime),
            cycle(CycleBase::GNonadjacent, Suffix::Realtime),
            cycle(CycleBase::G2Item, Suffix::Realtime),
        ],
    }
}

/// Every anomaly `model` prohibits, including everything prohibited by every
/// weaker model.
#[must_use]
pub fn prohibited_by(model: ConsistencyModel) -> BTreeSet<AnomalyTag> {
    ALL_MODELS
        .into_iter()
        .take_while(|m| *m <= model)
        .flat_map(additions)
        .collect()
}

/// Union of `prohibited_by` across every requested model, plus any
/// explicitly requested extra anomaly tags (§4.9 step 1).
#[must_use]
pub fn prohibited_anomalies(
    models: &[ConsistencyModel],
    extra: &[AnomalyTag],
) -> BTreeSet<AnomalyTag> {
    let mut set: BTreeSet<AnomalyTag> = models.iter().flat_map(|m| prohibited_by(*m)).collect();
    set.extend(extra.iter().copied());
    set
}

/// `prohibited` plus the two unknown-class markers that are always worth
/// surfacing even when not explicitly prohibited (§4.9 step 2).
#[must_use]
pub fn reportable_anomalies(prohibited: &BTreeSet<AnomalyTag>) -> BTreeSet<AnomalyTag> {
    let mut set = prohibited.clone();
    set.insert(non_cycle(NonCycleTag::EmptyTransactionGraph));
    set.insert(non_cycle(NonCycleTag::CycleSearchTimeout));
    set
}

/// Which order graphs (§C3) need to be built, derived from which suffix
/// families are reportable (§4.9 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequiredOrderGraphs {
    pub process: bool,
    pub realtime: bool,
}

#[must_use]
pub fn required_order_graphs(reportable: &BTreeSet<AnomalyTag>) -> RequiredOrderGraphs {
    let mut graphs = RequiredOrderGraphs::default();
    for tag in reportable {
        if let AnomalyTag::Cycle(c) = tag {
            match c.suffix {
                Suffix::Realtime => graphs.realtime = true,
                Suffix::Process => graphs.process = true,
                Suffix::None => {}
            }
        }
    }
    if graphs.realtime {
        graphs.process = true;
    }
    graphs
}

/// The tri-state verdict (§4.9 step 4).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
    Unknown,
}

/// The outcome of reducing `found` against `prohibited`/`reportable`.
pub struct Verdict {
    pub validity: Validity,
    pub reportable_found: BTreeSet<AnomalyTag>,
    pub impossible_models: BTreeSet<ConsistencyModel>,
}

/// Reduces the set of anomalies actually found to a verdict, given the
/// options' requested models (§4.9 steps 4-5).
#[must_use]
pub fn aggregate(
    found: &BTreeSet<AnomalyTag>,
    models: &[ConsistencyModel],
    extra: &[AnomalyTag],
) -> Verdict {
    let prohibited = prohibited_anomalies(models, extra);
    let reportable = reportable_anomalies(&prohibited);
    let reportable_found: BTreeSet<AnomalyTag> = found.intersection(&reportable).copied().collect();
    let prohibited_found: BTreeSet<AnomalyTag> =
        reportable_found.intersection(&prohibited).copied().collect();

    let validity = if reportable_found.is_empty() {
        Validity::Valid
    } else if !prohibited_found.is_empty() {
        Validity::Invalid
    } else {
        Validity::Unknown
    };

    let impossible_models = ALL_MODELS
        .into_iter()
        .filter(|m| !prohibited_by(*m).is_disjoint(&reportable_found))
        .collect();

    Verdict { validity, reportable_found, impossible_models }
}
