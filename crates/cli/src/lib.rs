//! knotcheck CLI -- flag parsing for the command-line wrapper around
//! `knotcheck_core`'s anomaly-detection engine.
//!
//! History parsing, consistency-model selection, and the exit-code mapping
//! all live here, outside the core crate: per the engine's scope (§1), the
//! command-line entry point and its flag parsing are external collaborators
//! that merely drive the core through its public interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use knotcheck_core::ConsistencyModel;

#[derive(Debug, Parser)]
#[command(name = "knotcheck", about = "Black-box transactional consistency checker")]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a recorded history for consistency anomalies
    Check(CheckArgs),
    /// Print the JSON Schema for the recorded-history input format
    Schema,
}

/// Which workload dialect the history was recorded under (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Workload {
    ListAppend,
    Register,
}

/// Which on-disk encoding to decode the input as (§6, "History input").
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Text,
    Json,
}

/// The consistency models a history can be checked against (§4.9.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Model {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    SnapshotIsolation,
    Serializable,
    StrictSerializable,
}

impl From<Model> for ConsistencyModel {
    fn from(model: Model) -> Self {
        match model {
            Model::ReadUncommitted => Self::ReadUncommitted,
            Model::ReadCommitted => Self::ReadCommitted,
            Model::RepeatableRead => Self::RepeatableRead,
            Model::SnapshotIsolation => Self::SnapshotIsolation,
            Model::Serializable => Self::Serializable,
            Model::StrictSerializable => Self::StrictSerializable,
        }
    }
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Path to the recorded history file
    pub input: PathBuf,

    /// Workload dialect the history was recorded under
    #[arg(long, value_enum, default_value = "list-append")]
    pub workload: Workload,

    /// Input encoding; inferred from the file extension (`.json` vs
    /// anything else) when omitted
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Consistency model to check against; may be repeated. Defaults to
    /// `strict-serializable` alone when omitted
    #[arg(long = "model", value_enum)]
    pub models: Vec<Model>,

    /// Per-SCC cycle search timeout, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Emit the analysis result as JSON instead of a human-readable report
    #[arg(long)]
    pub json: bool,
}
