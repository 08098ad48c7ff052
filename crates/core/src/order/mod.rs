//! Order-graph builders (C3): process order and real-time order, the two
//! relations inferred from transaction metadata rather than mop values.

pub mod process;
pub mod realtime;

pub use process::build as build_process_graph;
pub use realtime::build as build_realtime_graph;
