// SPDX-License-Identifier: GPL-3.0-only

//! Wire encoding and decoding of option sets
//!
//! The wire form is a flat JSON object keyed by each option's canonical wire
//! name. Decoding is forgiving in two specific ways and strict otherwise:
//!
//! - keys this crate does not know are dropped,
//! - integer options accept floating point literals with no fractional part.
//!
//! Any other type mismatch is a [`ThetaError::Decode`] naming the key.

use super::enums::{WireEnum, WlanFrequency};
use super::keys::{OptionKey, ScalarKind, ValueShape};
use super::records::{decode_record, encode_record};
use super::set::OptionSet;
use super::value::{EnumKind, EnumValue, OptionValue};
use crate::errors::{ThetaError, ThetaResult};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Flat wire mapping of option names to values
pub type WireRecord = Map<String, Value>;

/// Largest magnitude below which every integer is exactly representable as f64
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Encode an option set to its wire record
pub fn encode(options: &OptionSet) -> WireRecord {
    options
        .iter()
        .map(|(key, value)| (key.wire_name().to_string(), encode_value(value)))
        .collect()
}

/// Decode a wire record
///
/// Unknown keys are skipped. The first value that cannot be coerced to its
/// key's type aborts the decode.
pub fn decode(record: &WireRecord) -> ThetaResult<OptionSet> {
    let mut entries = BTreeMap::new();
    for (name, value) in record {
        let Some(key) = OptionKey::from_wire(name) else {
            debug!(key = %name, "Dropping unknown option key");
            continue;
        };
        entries.insert(key, decode_value(key, value)?);
    }
    Ok(OptionSet::from_entries(entries))
}

/// Wire names for a `camera.getOptions` request
pub fn encode_names(keys: &[OptionKey]) -> Vec<Value> {
    keys.iter().map(|key| Value::from(key.wire_name())).collect()
}

/// Encode a single value
pub fn encode_value(value: &OptionValue) -> Value {
    match value {
        OptionValue::Null => Value::Null,
        OptionValue::Int(v) => Value::from(*v),
        OptionValue::Float(v) => narrow_number(*v),
        OptionValue::Text(v) => Value::from(v.as_str()),
        OptionValue::Enum(EnumValue::WlanFrequency(freq)) => narrow_number(freq.gigahertz()),
        OptionValue::Enum(e) => Value::from(e.literal().unwrap_or_default()),
        OptionValue::Record(record) => encode_record(record),
        OptionValue::List(items) => Value::Array(items.iter().map(encode_value).collect()),
    }
}

/// Decode the wire value of one key
pub fn decode_value(key: OptionKey, value: &Value) -> ThetaResult<OptionValue> {
    let path = key.wire_name();
    if value.is_null() {
        return Ok(OptionValue::Null);
    }
    match key.shape() {
        ValueShape::Single(kind) => decode_scalar(path, kind, value),
        ValueShape::SupportList(kind) => {
            let Value::Array(items) = value else {
                return Err(ThetaError::decode(
                    path,
                    format!("expected array, found {}", json_type(value)),
                ));
            };
            items
                .iter()
                .enumerate()
                .map(|(index, item)| decode_scalar(&format!("{}[{}]", path, index), kind, item))
                .collect::<ThetaResult<Vec<_>>>()
                .map(OptionValue::List)
        }
    }
}

fn decode_scalar(path: &str, kind: ScalarKind, value: &Value) -> ThetaResult<OptionValue> {
    match kind {
        ScalarKind::Int => decode_int(path, value).map(OptionValue::Int),
        ScalarKind::Float => decode_float(path, value).map(OptionValue::Float),
        ScalarKind::Text => decode_text(path, value).map(OptionValue::Text),
        ScalarKind::Enum(EnumKind::WlanFrequency) => decode_float(path, value)
            .map(|ghz| OptionValue::Enum(EnumValue::WlanFrequency(WlanFrequency::bucket(ghz)))),
        ScalarKind::Enum(enum_kind) => {
            let literal = value.as_str().ok_or_else(|| {
                ThetaError::decode(path, format!("expected string, found {}", json_type(value)))
            })?;
            enum_kind
                .parse_literal(literal)
                .map(OptionValue::Enum)
                .ok_or_else(|| {
                    ThetaError::decode(
                        path,
                        format!("unknown {} literal '{}'", enum_kind.name(), literal),
                    )
                })
        }
        ScalarKind::Record(record_kind) => {
            decode_record(path, record_kind, value).map(OptionValue::Record)
        }
    }
}

/// Integer, accepting floats whose fractional part is zero
pub(crate) fn decode_int(path: &str, value: &Value) -> ThetaResult<i64> {
    let Value::Number(number) = value else {
        return Err(ThetaError::decode(
            path,
            format!("expected integer, found {}", json_type(value)),
        ));
    };
    if let Some(int) = number.as_i64() {
        return Ok(int);
    }
    if number.is_u64() {
        return Err(ThetaError::decode(path, format!("{} out of range", number)));
    }
    let float = number.as_f64().unwrap_or(f64::NAN);
    if !float.is_finite() || float.fract() != 0.0 {
        return Err(ThetaError::decode(
            path,
            format!("{} is not an integral value", number),
        ));
    }
    if float.abs() > MAX_EXACT_FLOAT_INT {
        return Err(ThetaError::decode(path, format!("{} out of range", number)));
    }
    Ok(float as i64)
}

pub(crate) fn decode_float(path: &str, value: &Value) -> ThetaResult<f64> {
    value.as_f64().ok_or_else(|| {
        ThetaError::decode(path, format!("expected number, found {}", json_type(value)))
    })
}

pub(crate) fn decode_text(path: &str, value: &Value) -> ThetaResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        ThetaError::decode(path, format!("expected string, found {}", json_type(value)))
    })
}

pub(crate) fn decode_bool(path: &str, value: &Value) -> ThetaResult<bool> {
    value.as_bool().ok_or_else(|| {
        ThetaError::decode(path, format!("expected boolean, found {}", json_type(value)))
    })
}

pub(crate) fn decode_literal<T: WireEnum>(path: &str, value: &Value) -> ThetaResult<T> {
    let literal = value.as_str().ok_or_else(|| {
        ThetaError::decode(path, format!("expected string, found {}", json_type(value)))
    })?;
    T::from_wire(literal)
        .ok_or_else(|| ThetaError::decode(path, format!("unknown literal '{}'", literal)))
}

/// Narrowest literal that decodes back to `value`
///
/// Integral floats are written without a fractional part (`5` rather than
/// `5.0`). Non-finite values have no JSON form and become `null`.
pub(crate) fn narrow_number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_FLOAT_INT {
        Value::from(value as i64)
    } else {
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
