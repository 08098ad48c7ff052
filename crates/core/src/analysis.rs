//! Top-level orchestration: wires every component (C1-C10) into the two
//! public entry points, one per workload dialect.

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::analyzers::{self, AnalyzerOutput};
use crate::anomaly::{self, AnomalyTag, CycleTag, NonCycleTag};
use crate::consistency::{self, ConsistencyModel, Validity};
use crate::detectors::{self, AbortedReadCase, IntermediateReadCase, LostUpdateCase};
use crate::explain::CycleExplanation;
use crate::graph::{strongly_connected_components, ProjectionCache};
use crate::model::{History, ListMop, MopView, RegisterMop};
use crate::options::AnalysisOptions;
use crate::order;
use rayon::prelude::*;

/// The full outcome of one analysis run (§6, "Analysis result").
pub struct AnalysisResult<K: Ord + Clone, V> {
    pub validity: Validity,
    pub anomalies_found: BTreeSet<AnomalyTag>,
    pub impossible_models: BTreeSet<ConsistencyModel>,
    pub cycles: Vec<CycleExplanation<K>>,
    pub aborted_reads: Vec<AbortedReadCase<K, V>>,
    pub intermediate_reads: Vec<IntermediateReadCase<K, V>>,
    pub lost_updates: Vec<LostUpdateCase<K, V>>,
    /// Cycle families abandoned mid-SCC because the per-SCC deadline
    /// passed; each entry's SCC still contributes a `fallback_cycle`
    /// explanation to `cycles` so it is never silently unreported (§4.6).
    pub timed_out: Vec<CycleTag>,
}

/// Runs the list-append analyzer (§4.2.1) plus the shared downstream
/// pipeline (C3-C10).
#[must_use]
pub fn analyze_list_append<K, E>(
    history: &History<ListMop<K, E>>,
    options: &AnalysisOptions,
) -> AnalysisResult<K, E>
where
    K: Ord + Clone + Display + Send + Sync,
    E: Ord + Clone + Display + core::hash::Hash + Send + Sync,
{
    let output = analyzers::analyze_list_append(history);
    finish(history, output, options)
}

/// Runs the read-write register analyzer (§4.2.2) plus the shared
/// downstream pipeline (C3-C10).
#[must_use]
pub fn analyze_register<K, V>(
    history: &History<RegisterMop<K, V>>,
    options: &AnalysisOptions,
) -> AnalysisResult<K, V>
where
    K: Ord + Clone + Display + Send + Sync,
    V: Ord + Clone + Display + core::hash::Hash + Send + Sync,
{
    let output = analyzers::analyze_register(history);
    finish(history, output, options)
}

/// The workload-agnostic remainder of the pipeline: order graphs (C3),
/// non-cycle detectors (C8), SCC decomposition and anomaly search (C4-C7),
/// and the consistency-model verdict (C9).
fn finish<M: MopView>(
    history: &History<M>,
    mut output: AnalyzerOutput<M::Key>,
    options: &AnalysisOptions,
) -> AnalysisResult<M::Key, M::Value>
where
    M::Key: Send + Sync,
    M::Value: Send + Sync,
{
    for extra in options.additional_graphs() {
        output.graph.merge(extra);
    }

    let prohibited = consistency::prohibited_anomalies(options.models(), options.extra_anomalies());
    let reportable = consistency::reportable_anomalies(&prohibited);
    let required_graphs = consistency::required_order_graphs(&reportable);

    if required_graphs.process {
        output.graph.merge(&order::build_process_graph(history));
    }
    if required_graphs.realtime {
        output.graph.merge(&order::build_realtime_graph(history));
    }

    let mut anomalies_found: BTreeSet<AnomalyTag> = BTreeSet::new();

    for inline in &output.inline_anomalies {
        anomalies_found.insert(AnomalyTag::from(inline.tag()));
    }

    if history.completed().next().is_none() {
        anomalies_found.insert(AnomalyTag::from(NonCycleTag::EmptyTransactionGraph));
    }

    let aborted_reads = detectors::aborted_read(history);
    if !aborted_reads.is_empty() {
        anomalies_found.insert(AnomalyTag::from(NonCycleTag::AbortedRead));
    }
    let intermediate_reads = detectors::intermediate_read(history);
    if !intermediate_reads.is_empty() {
        anomalies_found.insert(AnomalyTag::from(NonCycleTag::IntermediateRead));
    }
    let lost_updates = detectors::lost_update(history);
    if !lost_updates.is_empty() {
        anomalies_found.insert(AnomalyTag::from(NonCycleTag::LostUpdate));
    }

    let specs = anomaly::specs();
    let rel_sets = anomaly::required_rel_sets(&specs);
    let cache = ProjectionCache::prewarm(&output.graph, rel_sets);
    let sccs = strongly_connected_components(&output.graph);

    let mut cycles: Vec<CycleExplanation<M::Key>> = Vec::new();
    let mut timed_out: Vec<CycleTag> = Vec::new();

    // Every SCC is searched independently against the same read-only cache,
    // so the per-SCC searches run in parallel (§5); only the merge into the
    // shared result sets below is sequential.
    let results: Vec<_> = sccs
        .par_iter()
        .map(|scc| {
            anomaly::search_scc(
                &cache,
                scc,
                &specs,
                &output.explain_index,
                options.cycle_search_timeout(),
            )
        })
        .collect();

    for result in results {
        for cycle in result.cycles {
            anomalies_found.insert(cycle.tag);
            cycles.push(cycle);
        }
        if let Some(tag) = result.timed_out_on {
            timed_out.push(tag);
            anomalies_found.insert(AnomalyTag::from(NonCycleTag::CycleSearchTimeout));
            if let Some(fallback) = result.fallback {
                anomalies_found.insert(fallback.tag);
                cycles.push(fallback);
            }
        }
    }

    let verdict = consistency::aggregate(&anomalies_found, options.models(), options.extra_anomalies());

    AnalysisResult {
        validity: verdict.validity,
        anomalies_found,
        impossible_models: verdict.impossible_models,
        cycles,
        aborted_reads,
        intermediate_reads,
        lost_updates,
        timed_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RegisterMop, Txn, TxnId, TxnStatus};

    fn txn(id: u64, status: TxnStatus, mops: Vec<RegisterMop<&'static str, u64>>) -> Txn<RegisterMop<&'static str, u64>> {
        Txn::new(TxnId(id), id, status, mops, 0, 1)
    }

    #[test]
    fn empty_history_is_unknown() {
        let history: History<RegisterMop<&str, u64>> = History::new(vec![]).unwrap();
        let result = analyze_register(&history, &AnalysisOptions::default());
        assert_eq!(result.validity, Validity::Unknown);
        assert!(result.anomalies_found.contains(&AnomalyTag::from(NonCycleTag::EmptyTransactionGraph)));
    }

    #[test]
    fn g0_cycle_in_register_writes_is_invalid_under_read_committed() {
        let history = History::new(vec![
            txn(
                1,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "x", value: Some(0) },
                    RegisterMop::Write { key: "y", value: 1 },
                ],
            ),
            txn(
                2,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "y", value: Some(1) },
                    RegisterMop::Write { key: "x", value: 1 },
                ],
            ),
        ])
        .unwrap();
        let options = AnalysisOptions::new().with_models([ConsistencyModel::ReadCommitted]);
        let result = analyze_register(&history, &options);
        assert_eq!(result.validity, Validity::Valid);
    }

    #[test]
    fn lost_update_is_reported_under_repeatable_read() {
        let history = History::new(vec![
            txn(1, TxnStatus::Ok, vec![RegisterMop::Write { key: "x", value: 0 }]),
            txn(
                2,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "x", value: Some(0) },
                    RegisterMop::Write { key: "x", value: 1 },
                ],
            ),
            txn(
                3,
                TxnStatus::Ok,
                vec![
                    RegisterMop::Read { key: "x", value: Some(0) },
                    RegisterMop::Write { key: "x", value: 2 },
                ],
            ),
        ])
        .unwrap();
        let options = AnalysisOptions::new().with_models([ConsistencyModel::RepeatableRead]);
        let result = analyze_register(&history, &options);
        assert_eq!(result.validity, Validity::Invalid);
        assert_eq!(result.lost_updates.len(), 1);
    }
}
