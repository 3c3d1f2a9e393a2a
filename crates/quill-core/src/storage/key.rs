//! Primary-key and index-key encoding.
//!
//! Key format: `value1 \0\x01 value2 \0\x01 ...`, one component per key
//! column. NUL bytes inside text are escaped as `\0\xff`, so a separator can
//! never appear inside a component. Integers are offset and zero-padded so
//! byte order matches numeric order.

use serde_json::Value;

/// Component separator.
pub const SEPARATOR: &[u8] = b"\0\x01";

/// Escape sequence for a NUL byte inside a text component.
const ESCAPED_NUL: &[u8] = b"\0\xff";

/// Width of an encoded integer component.
const INT_WIDTH: usize = 20;

/// Encode one key component. Returns `None` for values that cannot be keyed.
pub fn encode_component(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => {
            let mut out = Vec::with_capacity(s.len());
            for &byte in s.as_bytes() {
                if byte == 0 {
                    out.extend_from_slice(ESCAPED_NUL);
                } else {
                    out.push(byte);
                }
            }
            Some(out)
        }
        Value::Number(n) => {
            let v = n.as_i64()?;
            let shifted = (v as i128) - (i64::MIN as i128);
            Some(format!("{:0width$}", shifted, width = INT_WIDTH).into_bytes())
        }
        _ => None,
    }
}

/// Encode a sequence of components into one key.
pub fn encode<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Vec<u8>> {
    let mut key = Vec::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            key.extend_from_slice(SEPARATOR);
        }
        key.extend(encode_component(value)?);
    }
    Some(key)
}

/// Prefix matching every key whose first component is exactly `value`.
pub fn prefix(value: &Value) -> Option<Vec<u8>> {
    let mut key = encode_component(value)?;
    key.extend_from_slice(SEPARATOR);
    Some(key)
}

/// Human-readable rendering of key values for error messages.
pub fn display<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
