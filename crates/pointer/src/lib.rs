//! JSON Pointer (RFC 6901) utilities.
//!
//! Helper functions for [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901)
//! plus the immutable [`JsonPointer`] value used for schema and instance
//! locations in validation results.
//!
//! # Example
//!
//! ```
//! use jsv_pointer::{parse_json_pointer, format_json_pointer, get, JsonPointer};
//!
//! let path = parse_json_pointer("/foo/bar");
//! assert_eq!(path, vec!["foo".to_string(), "bar".to_string()]);
//! assert_eq!(format_json_pointer(&path), "/foo/bar");
//!
//! let doc = serde_json::json!({"foo": {"bar": 42}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!(42)));
//!
//! let ptr = JsonPointer::root().with("foo").with("bar");
//! assert_eq!(ptr.evaluate(&doc), Some(&serde_json::json!(42)));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::JsonPointer;

pub mod validate;
pub use validate::{validate_json_pointer, validate_relative_json_pointer, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("INVALID_POINTER: {0}")]
    InvalidPointer(String),
    #[error("INVALID_ESCAPE: {0}")]
    InvalidEscape(String),
}

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// ```
/// use jsv_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// ```
/// use jsv_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into path components.
///
/// - Empty string returns empty vec
/// - The leading `/` is stripped
/// - Each component is unescaped
///
/// ```
/// use jsv_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/"), vec![""]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..].split('/').map(unescape_component).collect()
}

/// Format path components into a JSON Pointer string.
///
/// ```
/// use jsv_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["foo".to_string(), "bar".to_string()]), "/foo/bar");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Decode a pointer carried in a URI fragment (`#/a%20b/c`).
///
/// Percent-escapes are decoded before the RFC 6901 escapes. A leading `#`
/// is accepted and dropped.
pub fn parse_uri_fragment_pointer(fragment: &str) -> Result<Vec<String>, JsonPointerError> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let decoded = percent_decode(fragment)?;
    validate_json_pointer(&decoded)
        .map_err(|_| JsonPointerError::InvalidPointer(decoded.clone()))?;
    Ok(parse_json_pointer(&decoded))
}

fn percent_decode(input: &str) -> Result<String, JsonPointerError> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| JsonPointerError::InvalidEscape(input.to_string()))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| JsonPointerError::InvalidEscape(input.to_string()))
}

/// Check if a string represents a valid non-negative integer array index.
///
/// ```
/// use jsv_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Get a value from a JSON document by path.
///
/// Returns `None` if the path doesn't exist or is invalid.
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = val;
    for path_step in path {
        match current {
            Value::Array(arr) => {
                if !is_valid_index(path_step) {
                    return None;
                }
                let idx: usize = path_step.parse().ok()?;
                current = arr.get(idx)?;
            }
            Value::Object(map) => {
                current = map.get(path_step)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
