//! Black-box transactional consistency checking.
//!
//! `knotcheck_core` decides whether a recorded history of transactions —
//! each a sequence of read/write/append micro-operations on keyed values —
//! could have been produced by a given consistency model. When it could
//! not, the checker produces a catalogue of concrete anomalies: cycles in
//! the transaction dependency graph (Adya-style `G0`, `G1c`, `G-single`,
//! `G-nonadjacent`, `G2-item`, each with optional `-process`/`-realtime`
//! suffixes), plus non-cycle anomalies (`AbortedRead`, `IntermediateRead`,
//! `LostUpdate`).
//!
//! # Pipeline
//!
//! 1. [`model`] — normalize the recorded history into [`model::Txn`]s of
//!    mops (component C1).
//! 2. [`analyzers`] — per-workload edge inference: list-append or
//!    read-write register, producing `ww`/`wr`/`rw` edges (C2).
//! 3. [`order`] — process-order and real-time-order edges (C3).
//! 4. [`graph`] — the unified labeled multigraph, relationship projection,
//!    SCC decomposition, and cycle-search primitives (C4, C5).
//! 5. [`anomaly`] — the declarative, priority-ordered anomaly search and
//!    cycle classifier (C6, C7).
//! 6. [`detectors`] — non-cycle anomaly detectors (C8).
//! 7. [`consistency`] — the consistency-model → prohibited-anomaly table
//!    and final verdict aggregation (C9).
//! 8. [`explain`] — pair explanations justifying individual edges (C10).
//!
//! The public entry points are [`analysis::analyze_list_append`] and
//! [`analysis::analyze_register`], one per workload dialect; both return an
//! [`analysis::AnalysisResult`].
//!
//! # Crate features
//!
//! - **`serde`** — enables `Serialize`/`Deserialize` derives on result types.
//! - **`schemars`** — enables `JsonSchema` derives for the CLI's `schema` command.

pub mod analysis;
pub mod analyzers;
pub mod anomaly;
pub mod consistency;
pub mod detectors;
pub mod error;
pub mod explain;
pub mod graph;
pub mod model;
pub mod options;
pub mod order;

pub use analysis::{analyze_list_append, analyze_register, AnalysisResult};
pub use consistency::ConsistencyModel;
pub use error::Error;
pub use options::AnalysisOptions;
