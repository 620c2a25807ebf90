//! Dot-separated node lookup into parsed JSON bodies
//!
//! `"Results.requisitionList"` walks object keys only; there is no array
//! indexing. An empty path addresses the document root.

use serde_json::Value;

/// Resolve a dot-separated node path against a JSON document.
///
/// Returns `None` if any segment is absent or a non-object is traversed.
#[must_use]
pub fn node<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(doc);
    }
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// Resolve a node path to the elements of an array node.
///
/// An absent node or a non-array node yields `None`.
#[must_use]
pub fn array<'a>(doc: &'a Value, path: &str) -> Option<&'a [Value]> {
    node(doc, path)?.as_array().map(Vec::as_slice)
}

/// Top-level `Status` text of a response body, if it is a string.
#[must_use]
pub fn status_text(doc: &Value) -> Option<String> {
    doc.get("Status").and_then(Value::as_str).map(str::to_string)
}
