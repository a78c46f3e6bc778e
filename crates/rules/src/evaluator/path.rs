//! Dot-path field resolution over schema-less records.

use serde_json::Value;

/// Read access to a record by dot path.
///
/// `None` means the path did not resolve; `Some(Value::Null)` means the
/// field exists and holds `null`. Operators treat the two differently only
/// for the null/empty checks.
pub trait FieldLookup {
    fn lookup(&self, path: &str) -> Option<&Value>;
}

impl FieldLookup for Value {
    fn lookup(&self, path: &str) -> Option<&Value> {
        resolve_path(self, path)
    }
}

/// Walk `path` (`a.b.0.c`) through nested objects and arrays.
///
/// A segment that parses as an unsigned integer indexes into an array;
/// anything else is an object key. Hitting `null`, a missing key, an
/// out-of-range index or a scalar before the last segment yields `None`.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        if current.is_null() {
            return None;
        }
        current = match segment.parse::<usize>() {
            Ok(index) => current.as_array()?.get(index)?,
            Err(_) => current.as_object()?.get(segment)?,
        };
    }
    Some(current)
}
