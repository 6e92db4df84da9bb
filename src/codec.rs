//! URL, query-string, and body resolution.
//!
//! Pure functions with documented contracts. Query parameters are supplied
//! exclusively through the explicit parameter map: any query string embedded
//! in a path is stripped before joining. Spaces encode as `%20`, never `+`.

use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::config::Body;
use crate::request::TransportBody;

/// Everything except unreserved characters is percent-encoded.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Resolve the final request url from an optional base and a path.
///
/// An absolute `url` (matching `scheme://`) bypasses the base entirely.
/// Otherwise base and path are joined with exactly one slash at the seam.
/// Any embedded query string is stripped in both cases.
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    let path = url.split('?').next().unwrap_or_default();
    let base = base_url.unwrap_or_default();

    if base.is_empty() || has_scheme(path) {
        return path.to_string();
    }

    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

fn has_scheme(url: &str) -> bool {
    match url.find("://") {
        Some(at) if at > 0 => url[..at].chars().enumerate().all(|(i, c)| {
            if i == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
            }
        }),
        _ => false,
    }
}

/// Build a `?`-prefixed query string from the parameter map.
///
/// Array values repeat the key once per surviving element, in array order.
/// Null and empty-string values are skipped. Returns an empty string when no
/// parameters survive filtering.
pub fn resolve_params(params: &BTreeMap<String, Value>) -> String {
    let mut pairs: Vec<String> = Vec::new();

    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(scalar) = scalar_value(item) {
                        pairs.push(encode_pair(key, &scalar));
                    }
                }
            }
            other => {
                if let Some(scalar) = scalar_value(other) {
                    pairs.push(encode_pair(key, &scalar));
                }
            }
        }
    }

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!(
        "{}={}",
        utf8_percent_encode(key, QUERY_ENCODE),
        utf8_percent_encode(value, QUERY_ENCODE)
    )
}

/// Resolve a configured payload into a transport-ready body.
///
/// Absent and null payloads resolve to `None`; strings and pre-encoded form
/// payloads pass through; multipart payloads pass through with their
/// identity preserved; anything else serializes as compact JSON.
pub fn resolve_body(body: Option<&Body>) -> Option<TransportBody> {
    match body? {
        Body::Json(Value::Null) => None,
        Body::Json(value) => Some(TransportBody::Text(value.to_string())),
        Body::Text(text) => Some(TransportBody::Text(text.clone())),
        Body::Form(encoded) => Some(TransportBody::Text(encoded.clone())),
        Body::Multipart(form) => Some(TransportBody::Multipart(Arc::clone(form))),
    }
}
