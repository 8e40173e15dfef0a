use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::number::number_equal;

/// How two arrays are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrayEquality {
    /// Same length, equal element by element.
    #[default]
    Sequence,
    /// Same elements with the same multiplicities, in any order.
    Contents,
}

/// How `null` members interact with absent members when comparing objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NullEquality {
    /// `{"a": null}` and `{}` differ.
    #[default]
    Strict,
    /// A member whose value is `null` equals an absent member.
    AbsentIsNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EqualityOptions {
    pub arrays: ArrayEquality,
    pub nulls: NullEquality,
}

/// Performs a deep equality check between two JSON values with default
/// options.
///
/// Numbers compare by mathematical value, so `1` equals `1.0`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use jsv_util::json_equal::deep_equal;
///
/// assert!(deep_equal(&json!({"foo": [1, 2, 3]}), &json!({"foo": [1, 2, 3.0]})));
/// assert!(!deep_equal(&json!({"foo": [1, 2, 3]}), &json!({"foo": [1, 2, 4]})));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    deep_equal_with(a, b, &EqualityOptions::default())
}

/// Performs a deep equality check under the given policies.
///
/// ```
/// use serde_json::json;
/// use jsv_util::json_equal::{deep_equal_with, ArrayEquality, EqualityOptions};
///
/// let opts = EqualityOptions { arrays: ArrayEquality::Contents, ..Default::default() };
/// assert!(deep_equal_with(&json!([1, 2, 2]), &json!([2, 1, 2]), &opts));
/// assert!(!deep_equal_with(&json!([1, 2, 2]), &json!([2, 1, 1]), &opts));
/// ```
pub fn deep_equal_with(a: &Value, b: &Value, opts: &EqualityOptions) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => number_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(arr_a), Value::Array(arr_b)) => match opts.arrays {
            ArrayEquality::Sequence => {
                arr_a.len() == arr_b.len()
                    && arr_a
                        .iter()
                        .zip(arr_b)
                        .all(|(x, y)| deep_equal_with(x, y, opts))
            }
            ArrayEquality::Contents => contents_equal(arr_a, arr_b, opts),
        },
        (Value::Object(obj_a), Value::Object(obj_b)) => match opts.nulls {
            NullEquality::Strict => {
                obj_a.len() == obj_b.len()
                    && obj_a.iter().all(|(key, val_a)| match obj_b.get(key) {
                        Some(val_b) => deep_equal_with(val_a, val_b, opts),
                        None => false,
                    })
            }
            NullEquality::AbsentIsNull => {
                members_match(obj_a, obj_b, opts) && members_match(obj_b, obj_a, opts)
            }
        },
        // Different types are never equal
        _ => false,
    }
}

fn contents_equal(a: &[Value], b: &[Value], opts: &EqualityOptions) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for x in a {
        for (i, y) in b.iter().enumerate() {
            if !used[i] && deep_equal_with(x, y, opts) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn members_match(left: &Map<String, Value>, right: &Map<String, Value>, opts: &EqualityOptions) -> bool {
    left.iter().all(|(key, val)| match right.get(key) {
        Some(other) => deep_equal_with(val, other, opts),
        None => val.is_null(),
    })
}
