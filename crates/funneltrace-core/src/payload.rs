//! Best-effort parsing of opaque payload strings.

use serde_json::Value;

/// Parse an opaque serialized-JSON field.
///
/// Absent input, an empty string, malformed JSON and a literal JSON `null`
/// all collapse to `None`. This never errors: the caller decides the
/// fallback (keep the raw string, or omit the derived field).
pub fn parse_opaque_json(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) => None,
    }
}
