//! Dotted-path lookup into JSON payloads
//!
//! Response bodies from login, refresh, and profile endpoints are arbitrary
//! JSON. The configured `data_key` and token paths locate the useful part with
//! a dotted path such as `result.data.jwt`. Numeric segments index into
//! arrays (`items.0.id`).

use serde_json::Value;

/// Returns the value at `path` inside `payload`, or `None` if any segment is
/// missing.
///
/// An empty path returns the payload itself. Lookup never fails: a missing,
/// partial, or type-mismatched path is reported as `None`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sessionward::path::extract_path;
///
/// let payload = json!({"result": {"data": {"jwt": "abc123"}}});
/// assert_eq!(extract_path(&payload, "result.data.jwt"), Some(&json!("abc123")));
/// assert_eq!(extract_path(&payload, "result.missing.jwt"), None);
/// assert_eq!(extract_path(&payload, ""), Some(&payload));
/// ```
pub fn extract_path<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(payload);
    }

    path.split('.').try_fold(payload, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Like [`extract_path`], but with an optional path; `None` returns the
/// payload unchanged.
pub fn extract_optional<'a>(payload: &'a Value, path: Option<&str>) -> Option<&'a Value> {
    match path {
        Some(p) => extract_path(payload, p),
        None => Some(payload),
    }
}

/// Returns the string at `path`, if present.
///
/// Numbers are accepted and rendered in their JSON form, since some servers
/// issue numeric opaque tokens. Empty strings, `null`, booleans, objects,
/// and arrays are treated as absent.
pub fn extract_string(payload: &Value, path: &str) -> Option<String> {
    match extract_path(payload, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
