//! The keyword family.
//!
//! Every keyword is a struct built from its JSON payload by a factory
//! registered in the [`KeywordCatalog`]. Each submodule exposes its entries
//! through a `keywords()` function; [`register_defaults`] collects them in
//! a fixed order, which is also the tie-break for equal sequence values.

pub mod applicator;
pub mod array;
pub mod content;
pub mod format;
pub mod generic;
pub mod identity;
pub mod meta_data;
pub mod numeric;
pub mod object;
pub mod reference;
pub mod string;

use std::fmt;

use indexmap::IndexMap;
use jsv_pointer::JsonPointer;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::catalog::{KeywordCatalog, KeywordFactory};
use crate::context::ValidationContext;
use crate::draft::{DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema};
use crate::SchemaError;

/// One constraint of a schema.
pub trait Keyword: Send + Sync + fmt::Debug {
    /// Evaluation order inside a schema; lower runs first.
    ///
    /// `0` identity keywords, `1` most keywords, `2` keywords reading the
    /// outcome of a sibling (`additionalItems`, `then`, `minContains`),
    /// `10` the `unevaluated*` keywords.
    fn sequence(&self) -> i32 {
        1
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError>;

    /// Subschemas this keyword owns, addressed relative to the keyword.
    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        Vec::new()
    }
}

/// A catalog entry: name, drafts, vocabulary and factory.
pub type KeywordEntry = (&'static str, DraftMask, Option<Vocabulary>, KeywordFactory);

pub(crate) fn entry(
    name: &'static str,
    drafts: DraftMask,
    vocabulary: Option<Vocabulary>,
    factory: KeywordFactory,
) -> KeywordEntry {
    (name, drafts, vocabulary, factory)
}

/// All built-in keywords.
pub fn all_keywords() -> Vec<KeywordEntry> {
    let mut entries = Vec::new();
    entries.extend(identity::keywords());
    entries.extend(reference::keywords());
    entries.extend(applicator::keywords());
    entries.extend(object::keywords());
    entries.extend(array::keywords());
    entries.extend(numeric::keywords());
    entries.extend(string::keywords());
    entries.extend(generic::keywords());
    entries.extend(format::keywords());
    entries.extend(content::keywords());
    entries.extend(meta_data::keywords());
    entries
}

/// Registers every built-in keyword in `catalog`.
pub fn register_defaults(catalog: &KeywordCatalog) {
    for (name, drafts, vocabulary, factory) in all_keywords() {
        if let Err(err) = catalog.register(name, drafts, vocabulary, factory) {
            tracing::warn!(keyword = name, %err, "skipping built-in keyword");
        }
    }
}

// ----------------------------------------------------------------------
// Payload helpers

pub(crate) fn expect_number<'v>(name: &str, value: &'v Value) -> Result<&'v Number, SchemaError> {
    match value {
        Value::Number(n) => Ok(n),
        _ => Err(SchemaError::invalid_keyword(name, "a number", value)),
    }
}

pub(crate) fn expect_non_negative_integer(name: &str, value: &Value) -> Result<u64, SchemaError> {
    let err = || SchemaError::invalid_keyword(name, "a non-negative integer", value);
    let Value::Number(number) = value else {
        return Err(err());
    };
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(err()),
    }
}

pub(crate) fn expect_string<'v>(name: &str, value: &'v Value) -> Result<&'v str, SchemaError> {
    value
        .as_str()
        .ok_or_else(|| SchemaError::invalid_keyword(name, "a string", value))
}

pub(crate) fn expect_bool(name: &str, value: &Value) -> Result<bool, SchemaError> {
    value
        .as_bool()
        .ok_or_else(|| SchemaError::invalid_keyword(name, "a boolean", value))
}

pub(crate) fn expect_object<'v>(name: &str, value: &'v Value) -> Result<&'v Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::invalid_keyword(name, "an object", value))
}

pub(crate) fn expect_array<'v>(name: &str, value: &'v Value) -> Result<&'v Vec<Value>, SchemaError> {
    value
        .as_array()
        .ok_or_else(|| SchemaError::invalid_keyword(name, "an array", value))
}

pub(crate) fn expect_string_array(name: &str, value: &Value) -> Result<Vec<String>, SchemaError> {
    let err = || SchemaError::invalid_keyword(name, "an array of strings", value);
    value
        .as_array()
        .ok_or_else(err)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(err))
        .collect()
}

/// `{name: schema}` payloads (`properties`, `$defs`, `dependentSchemas`).
pub(crate) fn schema_map(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
) -> Result<IndexMap<String, Schema>, SchemaError> {
    expect_object(name, value)?
        .iter()
        .map(|(key, member)| Ok((key.clone(), ctx.subschema(member, &[name, key.as_str()])?)))
        .collect()
}

/// `[schema, ...]` payloads (`allOf`, `anyOf`, `oneOf`, tuple `items`).
pub(crate) fn schema_list(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
    allow_empty: bool,
) -> Result<Vec<Schema>, SchemaError> {
    let items = expect_array(name, value)?;
    if items.is_empty() && !allow_empty {
        return Err(SchemaError::invalid_keyword(name, "a non-empty array of schemas", value));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| ctx.subschema(item, &[name, i.to_string().as_str()]))
        .collect()
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex, SchemaError> {
    Regex::new(pattern).map_err(|e| SchemaError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn pointer(tokens: &[&str]) -> JsonPointer {
    JsonPointer::from_tokens(tokens.iter().copied())
}

/// JSON type name of `value` as reported in messages; integral numbers
/// report as `integer`.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if jsv_util::is_integer(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
