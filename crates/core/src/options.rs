//! Analysis configuration (A3): the options struct threaded through the
//! public entry points, assembled via a plain builder chain in the style of
//! the teacher's own option threading through `check()`.

use std::path::PathBuf;
use std::time::Duration;

use crate::anomaly::AnomalyTag;
use crate::consistency::ConsistencyModel;
use crate::graph::Graph;
use crate::model::TxnId;

/// Configuration for one analysis run.
///
/// `directory`, `max_plot_bytes`, `plot_timeout_ms`, and `plot_format` are
/// pure passthrough fields: the core neither reads nor validates them, it
/// only carries them so a caller can forward the same options value to an
/// external visualizer without a second configuration surface.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub(crate) consistency_models: Vec<ConsistencyModel>,
    pub(crate) extra_anomalies: Vec<AnomalyTag>,
    pub(crate) cycle_search_timeout_ms: u64,
    pub(crate) additional_graphs: Vec<Graph<TxnId>>,
    pub directory: Option<PathBuf>,
    pub max_plot_bytes: Option<u64>,
    pub plot_timeout_ms: Option<u64>,
    pub plot_format: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            consistency_models: vec![ConsistencyModel::default()],
            extra_anomalies: Vec::new(),
            cycle_search_timeout_ms: 1000,
            additional_graphs: Vec::new(),
            directory: None,
            max_plot_bytes: None,
            plot_timeout_ms: None,
            plot_format: None,
        }
    }
}

impl AnalysisOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_models(mut self, models: impl IntoIterator<Item = ConsistencyModel>) -> Self {
        self.consistency_models = models.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_extra_anomalies(mut self, anomalies: impl IntoIterator<Item = AnomalyTag>) -> Self {
        self.extra_anomalies = anomalies.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.cycle_search_timeout_ms = timeout_ms;
        self
    }

    /// Pre-built graphs to merge into the unified graph alongside the
    /// analyzer- and order-graph-derived edges (§6: `additional_graphs`).
    #[must_use]
    pub fn with_additional_graphs(mut self, graphs: impl IntoIterator<Item = Graph<TxnId>>) -> Self {
        self.additional_graphs = graphs.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_directory(mut self, directory: PathBuf) -> Self {
        self.directory = Some(directory);
        self
    }

    #[must_use]
    pub fn models(&self) -> &[ConsistencyModel] {
        &self.consistency_models
    }

    #[must_use]
    pub fn extra_anomalies(&self) -> &[AnomalyTag] {
        &self.extra_anomalies
    }

    #[must_use]
    pub fn cycle_search_timeout(&self) -> Duration {
        Duration::from_millis(self.cycle_search_timeout_ms)
    }

    #[must_use]
    pub fn additional_graphs(&self) -> &[Graph<TxnId>] {
        &self.additional_graphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_strict_serializable_with_a_one_second_timeout() {
        let opts = AnalysisOptions::new();
        assert_eq!(opts.models(), &[ConsistencyModel::StrictSerializable]);
        assert_eq!(opts.cycle_search_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn builder_chain_overrides_fields() {
        let opts = AnalysisOptions::new()
            .with_models([ConsistencyModel::SnapshotIsolation])
            .with_timeout_ms(50);
        assert_eq!(opts.models(), &[ConsistencyModel::SnapshotIsolation]);
        assert_eq!(opts.cycle_search_timeout(), Duration::from_millis(50));
    }
}
