//! Winnow-based parser for the line-structured textual history form (§6,
//! "Line- or collection-structured textual form").
///
/// Grammar:
/// ```text
/// history    = record+
/// record     = ":" kind WS process WS index WS time WS mop_list NEWLINE
/// kind       = "invoke" | "ok" | "fail" | "info"
/// mop_list   = "[" (mop (WS mop)*)? "]"
/// mop        = "[" ":" mop_tag WS key WS value "]"
/// mop_tag    = "r" | "w" | "append"
/// value      = "nil" | INTEGER | "[" (INTEGER (WS INTEGER)*)? "]"
/// key        = IDENT
/// process    = INTEGER
/// index      = INTEGER
/// time       = INTEGER
/// ```
///
/// Comment lines (`// ...`) and session-separator lines (one or more `-`)
/// are accepted and ignored, exactly as the lexer's doc comment describes;
/// blank lines are skipped.
use winnow::ascii::{dec_int, dec_uint, newline, till_line_ending};
use winnow::combinator::{alt, repeat, separated};
use winnow::prelude::*;
use winnow::token::{literal, take_while};
use winnow::ModalResult;

use crate::raw::{OpKind, RawMop, RawOp, RawValue};

/// A parse error with human-readable location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "parse error at line {}, column {}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse the line-structured textual history DSL into decoded op records.
///
/// # Errors
///
/// Returns a [`ParseError`] with line/column information when the input
/// does not conform to the grammar.
pub fn parse_history(input: &str) -> Result<Vec<RawOp>, ParseError> {
    let original = input;
    let mut stream: &str = input;
    match history_parser.parse_next(&mut stream) {
        Ok(ops) => Ok(ops),
        Err(e) => {
            let remaining_len = stream.len();
            let consumed = original.len().saturating_sub(remaining_len);
            let (line, column) = offset_to_line_col(original, consumed);
            Err(ParseError { message: e.to_string(), line, column })
        }
    }
}

fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let safe_offset = offset.min(input.len());
    let prefix = &input[..safe_offset];
    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let column = prefix.rfind('\n').map_or_else(|| prefix.len() + 1, |pos| prefix.len() - pos);
    (line, column)
}

fn inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c == ' ' || c == '\t').void().parse_next(input)
}

fn opt_inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c == ' ' || c == '\t').void().parse_next(input)
}

fn ident(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '-')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn kind(input: &mut &str) -> ModalResult<OpKind> {
    literal(":").parse_next(input)?;
    let tag = ident.parse_next(input)?;
    match tag.as_str() {
        "invoke" => Ok(OpKind::Invoke),
        "ok" => Ok(OpKind::Ok),
        "fail" => Ok(OpKind::Fail),
        "info" => Ok(OpKind::Info),
        _ => Err(winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new())),
    }
}

fn int_value(input: &mut &str) -> ModalResult<i64> {
    dec_int.parse_next(input)
}

fn list_value(input: &mut &str) -> ModalResult<Vec<i64>> {
    literal("[").parse_next(input)?;
    let elems: Vec<i64> = separated(0.., int_value, inline_ws).parse_next(input)?;
    literal("]").parse_next(input)?;
    Ok(elems)
}

fn value(input: &mut &str) -> ModalResult<Option<RawValue>> {
    alt((
        literal("nil").value(None),
        list_value.map(|v| Some(RawValue::List(v))),
        int_value.map(|v| Some(RawValue::Int(v))),
    ))
    .parse_next(input)
}

/// `"[" ":" mop_tag WS key WS value "]"`
fn mop(input: &mut &str) -> ModalResult<RawMop> {
    literal("[").parse_next(input)?;
    literal(":").parse_next(input)?;
    let tag = ident.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let key = ident.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let v = value.parse_next(input)?;
    literal("]").parse_next(input)?;

    match tag.as_str() {
        "r" => Ok(RawMop::Read { key, value: v }),
        "w" => {
            let v = v.ok_or_else(|| winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new()))?;
            Ok(RawMop::Write { key, value: v })
        }
        "append" => {
            let v = v.ok_or_else(|| winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new()))?;
            Ok(RawMop::Append { key, value: v })
        }
        _ => Err(winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new())),
    }
}

fn mop_list(input: &mut &str) -> ModalResult<Vec<RawMop>> {
    literal("[").parse_next(input)?;
    let mops: Vec<RawMop> = separated(0.., mop, inline_ws).parse_next(input)?;
    literal("]").parse_next(input)?;
    Ok(mops)
}

/// `":" kind WS process WS index WS time WS mop_list`
fn record(input: &mut &str) -> ModalResult<RawOp> {
    let kind = kind.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let process: u64 = dec_uint.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let index: u64 = dec_uint.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let time_ns: i64 = dec_int.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let mops = mop_list.parse_next(input)?;
    Ok(RawOp { index, process, kind, time_ns, mops })
}

fn comment_line(input: &mut &str) -> ModalResult<Option<RawOp>> {
    literal("//").parse_next(input)?;
    till_line_ending.parse_next(input)?;
    newline.parse_next(input)?;
    Ok(None)
}

fn separator_line(input: &mut &str) -> ModalResult<Option<RawOp>> {
    opt_inline_ws.parse_next(input)?;
    take_while(1.., '-').parse_next(input)?;
    opt_inline_ws.parse_next(input)?;
    newline.parse_next(input)?;
    Ok(None)
}

fn blank_line(input: &mut &str) -> ModalResult<Option<RawOp>> {
    opt_inline_ws.parse_next(input)?;
    newline.parse_next(input)?;
    Ok(None)
}

fn record_line(input: &mut &str) -> ModalResult<Option<RawOp>> {
    opt_inline_ws.parse_next(input)?;
    let op = record.parse_next(input)?;
    opt_inline_ws.parse_next(input)?;
    newline.parse_next(input)?;
    Ok(Some(op))
}

fn history_item(input: &mut &str) -> ModalResult<Option<RawOp>> {
    alt((comment_line, separator_line, blank_line, record_line)).parse_next(input)
}

fn history_parser(input: &mut &str) -> ModalResult<Vec<RawOp>> {
    let items: Vec<Option<RawOp>> = repeat(0.., history_item).parse_next(input)?;

    if !input.is_empty() {
        return Err(winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new()));
    }

    Ok(items.into_iter().flatten().collect())
}
