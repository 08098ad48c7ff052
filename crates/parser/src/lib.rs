//! Decoders for the two on-disk history encodings the engine accepts (§6,
//! "History input"), plus the lift from decoded op records into the typed
//! histories [`knotcheck_core::model`] consumes.
//!
//! This crate is deliberately thin: per §1 ("deliberately out of scope
//! (external collaborators): ... parsing of history files (EDN/JSON) into
//! op records"), the anomaly-detection engine itself never parses text or
//! JSON. It only ever sees [`knotcheck_core::model::History`] values; this
//! crate is the seam that builds them.
//!
//! - [`lexer`] tokenizes the line-structured textual form.
//! - [`parser`] parses that surface grammar directly into [`raw::RawOp`]s.
//! - [`json`] decodes the structured JSON-like form into the same [`raw::RawOp`]s.
//! - [`raw`] lifts either decoding into a validated
//!   [`knotcheck_core::model::History`] of the chosen workload dialect.

pub mod json;
pub mod lexer;
pub mod parser;
pub mod raw;

pub use json::{parse_history_json, JsonParseError};
pub use lexer::{tokenize, tokenize_with_text, Token, TokenKind};
pub use parser::{parse_history, ParseError};
pub use raw::{into_list_append_history, into_register_history, BuildError, OpKind, RawMop, RawOp, RawValue};
