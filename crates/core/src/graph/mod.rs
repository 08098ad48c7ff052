//! The unified directed multigraph over transactions (C4), its SCC
//! decomposition, and the cycle-search primitives built on top of it (C5).

pub mod cycle;
pub mod label;
pub mod multigraph;
pub mod projection;
pub mod scc;

pub use cycle::{
    fallback_cycle, find_cycle, find_cycle_starting_with, find_cycle_with, CyclePath, Deadline,
    PathPredicate, TimedOut,
};
pub use label::{Rel, RelSet};
pub use multigraph::Graph;
pub use projection::ProjectionCache;
pub use scc::strongly_connected_components;
