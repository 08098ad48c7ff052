//! Decoder for the structured (JSON-like) history form (§6, "Structured
//! object form"): a top-level JSON array of op objects, with string-valued
//! `type`/`f` fields and mops given as `[f_mop, k, v]` triples.
//!
//! ```json
//! [
//!   {"type": "invoke", "f": "txn", "process": 0, "index": 0, "time": 0,
//!    "value": [["append", "x", 1]]},
//!   {"type": "ok", "f": "txn", "process": 0, "index": 1, "time": 50,
//!    "value": [["append", "x", 1]]}
//! ]
//! ```

use serde_json::Value;

use crate::raw::{OpKind, RawMop, RawOp, RawValue};

/// A defect in the JSON op-record shape.
#[derive(Debug, Clone)]
pub struct JsonParseError {
    pub message: String,
}

impl core::fmt::Display for JsonParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JsonParseError {}

fn err(message: impl Into<String>) -> JsonParseError {
    JsonParseError { message: message.into() }
}

/// Parse the structured JSON history form into decoded op records.
///
/// # Errors
///
/// Returns a [`JsonParseError`] when the input is not valid JSON, is not a
/// top-level array, or any op/mop object is missing a required field or
/// has a field of the wrong shape.
pub fn parse_history_json(input: &str) -> Result<Vec<RawOp>, JsonParseError> {
    let value: Value = serde_json::from_str(input).map_err(|e| err(e.to_string()))?;
    let array = value.as_array().ok_or_else(|| err("top-level JSON value must be an array of op records"))?;
    array.iter().map(decode_op).collect()
}

fn decode_op(value: &Value) -> Result<RawOp, JsonParseError> {
    let obj = value.as_object().ok_or_else(|| err("op record must be a JSON object"))?;

    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("invoke") => OpKind::Invoke,
        Some("ok") => OpKind::Ok,
        Some("fail") => OpKind::Fail,
        Some("info") => OpKind::Info,
        Some(other) => return Err(err(format!("unrecognized op type {other:?}"))),
        None => return Err(err("op record missing string field `type`")),
    };

    let process = obj
        .get("process")
        .and_then(Value::as_u64)
        .ok_or_else(|| err("op record missing integer field `process`"))?;
    let index = obj
        .get("index")
        .and_then(Value::as_u64)
        .ok_or_else(|| err("op record missing integer field `index`"))?;
    let time_ns = obj.get("time").and_then(Value::as_i64).unwrap_or(0);

    let mops = obj
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| err("op record missing array field `value`"))?
        .iter()
        .map(decode_mop)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawOp { index, process, kind, time_ns, mops })
}

fn decode_mop(value: &Value) -> Result<RawMop, JsonParseError> {
    let triple = value.as_array().ok_or_else(|| err("mop must be a 3-element array"))?;
    let [f, k, v] = triple else {
        return Err(err(format!("mop must have exactly 3 elements, got {}", triple.len())));
    };

    let tag = f.as_str().ok_or_else(|| err("mop's first element must be a string tag"))?;
    let key = k.as_str().ok_or_else(|| err("mop's key must be a string"))?.to_string();

    match tag {
        "r" => Ok(RawMop::Read { key, value: decode_value(v)? }),
        "w" => {
            let v = decode_value(v)?.ok_or_else(|| err(format!("write to {key} must carry a value, not null")))?;
            Ok(RawMop::Write { key, value: v })
        }
        "append" => {
            let v =
                decode_value(v)?.ok_or_else(|| err(format!("append to {key} must carry a value, not null")))?;
            Ok(RawMop::Append { key, value: v })
        }
        other => Err(err(format!("unrecognized mop tag {other:?}"))),
    }
}

fn decode_value(value: &Value) -> Result<Option<RawValue>, JsonParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let i = n.as_i64().ok_or_else(|| err(format!("mop value {n} is not a 64-bit integer")))?;
            Ok(Some(RawValue::Int(i)))
        }
        Value::Array(elems) => {
            let ints = elems
                .iter()
                .map(|e| e.as_i64().ok_or_else(|| err(format!("list element {e} is not a 64-bit integer"))))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(RawValue::List(ints)))
        }
        other => Err(err(format!("mop value {other} is neither null, an integer, nor a list"))),
    }
}
