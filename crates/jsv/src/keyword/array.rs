//! Array keywords.

use std::sync::Arc;

use jsv_pointer::JsonPointer;
use jsv_util::deep_equal_with;
use serde_json::{json, Value};

use super::{entry, expect_bool, expect_non_negative_integer, schema_list, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema};
use crate::SchemaError;

/// Applies `schema` to the items at `indices`, marking each as evaluated.
fn apply_to_items(
    ctx: &mut ValidationContext<'_>,
    schema: &Schema,
    path: &[&str],
    indices: impl Iterator<Item = usize>,
) -> Result<(bool, Vec<ValidationResult>), SchemaError> {
    let Some(items) = ctx.instance().as_array() else {
        return Ok((true, Vec::new()));
    };
    let mut nested = Vec::new();
    let mut valid = true;
    for index in indices {
        let Some(item) = items.get(index) else {
            break;
        };
        let outcome = if schema.as_bool() == Some(false) {
            let location = ctx.instance_location().with_index(index);
            ctx.fail_at(location, json!({"index": index, "count": 1}))
        } else {
            ctx.validate_item(schema, path, index, item)?
        };
        valid &= outcome.is_valid;
        nested.push(outcome);
        ctx.mark_item(index);
        if !valid && ctx.is_flag() {
            break;
        }
    }
    Ok((valid, nested))
}

#[derive(Debug)]
pub enum Items {
    /// One schema for every item.
    Single(Schema),
    /// One schema per position.
    Tuple(Vec<Schema>),
}

#[derive(Debug)]
pub struct ItemsKeyword {
    pub items: Items,
}

impl Keyword for ItemsKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(len) = ctx.instance().as_array().map(Vec::len) else {
            return Ok(ctx.pass());
        };
        let (valid, nested, annotation) = match &self.items {
            Items::Single(schema) => {
                let (valid, nested) = apply_to_items(ctx, schema, &[], 0..len)?;
                (valid, nested, json!(true))
            }
            Items::Tuple(schemas) => {
                let mut nested = Vec::new();
                let mut valid = true;
                for (index, schema) in schemas.iter().enumerate().take(len) {
                    let (ok, mut results) =
                        apply_to_items(ctx, schema, &[index.to_string().as_str()], std::iter::once(index))?;
                    valid &= ok;
                    nested.append(&mut results);
                    if !valid && ctx.is_flag() {
                        break;
                    }
                }
                let applied = schemas.len().min(len);
                let annotation = if applied == len {
                    json!(true)
                } else {
                    json!(applied.saturating_sub(1))
                };
                (valid, nested, annotation)
            }
        };
        let mut result = ctx.node(valid, nested);
        if valid && len > 0 {
            result.annotation = Some(annotation);
        }
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        match &self.items {
            Items::Single(schema) => vec![(JsonPointer::root(), schema.clone())],
            Items::Tuple(schemas) => schemas
                .iter()
                .enumerate()
                .map(|(i, schema)| (JsonPointer::root().with_index(i), schema.clone()))
                .collect(),
        }
    }
}

fn build_items(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let items = match value {
        Value::Array(_) => Items::Tuple(schema_list(name, value, ctx, true)?),
        _ => Items::Single(ctx.subschema(value, &[name])?),
    };
    Ok(Arc::new(ItemsKeyword { items }))
}

/// `additionalItems`: items past a tuple-form `items`. Inert when `items`
/// is absent or a single schema.
#[derive(Debug)]
pub struct AdditionalItemsKeyword {
    pub schema: Schema,
    /// Length of the sibling tuple, `None` when there is none.
    pub tuple_len: Option<usize>,
}

impl Keyword for AdditionalItemsKeyword {
    fn sequence(&self) -> i32 {
        2
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let (Some(start), Some(len)) = (self.tuple_len, ctx.instance().as_array().map(Vec::len)) else {
            return Ok(ctx.pass());
        };
        if start >= len {
            return Ok(ctx.pass());
        }
        let (valid, nested) = apply_to_items(ctx, &self.schema, &[], start..len)?;
        let mut result = ctx.node(valid, nested);
        if valid {
            result.annotation = Some(json!(true));
        }
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_additional_items(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(AdditionalItemsKeyword {
        schema: ctx.subschema_or_bool(value, &[name])?,
        tuple_len: ctx.sibling("items").and_then(Value::as_array).map(Vec::len),
    }))
}

#[derive(Debug)]
pub struct UnevaluatedItemsKeyword {
    pub schema: Schema,
}

impl Keyword for UnevaluatedItemsKeyword {
    fn sequence(&self) -> i32 {
        10
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(len) = ctx.instance().as_array().map(Vec::len) else {
            return Ok(ctx.pass());
        };
        let remaining: Vec<usize> = (0..len)
            .filter(|i| !ctx.evaluated().items.contains(i))
            .collect();
        let (valid, nested) = apply_to_items(ctx, &self.schema, &[], remaining.into_iter())?;
        let mut result = ctx.node(valid, nested);
        if valid && len > 0 {
            result.annotation = Some(json!(true));
        }
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_unevaluated_items(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(UnevaluatedItemsKeyword {
        schema: ctx.subschema_or_bool(value, &[name])?,
    }))
}

/// `contains`. The match count is shared with `minContains` and
/// `maxContains`; with a `minContains` sibling the lower bound is theirs.
#[derive(Debug)]
pub struct ContainsKeyword {
    pub schema: Schema,
    pub has_min_contains: bool,
}

impl Keyword for ContainsKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(items) = ctx.instance().as_array() else {
            return Ok(ctx.pass());
        };
        let mut nested = Vec::new();
        let mut matched = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let outcome = ctx.validate_item(&self.schema, &[], index, item)?;
            if outcome.is_valid {
                matched.push(index);
                ctx.mark_item(index);
            }
            nested.push(outcome);
        }
        ctx.set_misc("contains", json!(matched.len()));
        let bounded_elsewhere = self.has_min_contains && ctx.draft() >= Draft::Draft2019_09;
        let valid = !matched.is_empty() || bounded_elsewhere;
        if !valid {
            let mut result = ctx.fail(json!({}));
            result.nested = nested;
            return Ok(result);
        }
        let mut result = ctx.node(true, nested.into_iter().filter(|r| r.is_valid).collect());
        result.annotation = Some(json!(matched));
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_contains(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ContainsKeyword {
        schema: ctx.subschema(value, &[name])?,
        has_min_contains: ctx.sibling("minContains").is_some(),
    }))
}

/// `minContains` / `maxContains`, reading the count `contains` left.
#[derive(Debug)]
pub struct ContainsBoundKeyword {
    pub limit: u64,
    pub max: bool,
}

impl Keyword for ContainsBoundKeyword {
    fn sequence(&self) -> i32 {
        2
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(actual) = ctx.misc("contains").and_then(Value::as_u64) else {
            return Ok(ctx.pass());
        };
        let valid = if self.max {
            actual <= self.limit
        } else {
            actual >= self.limit
        };
        Ok(ctx.outcome(valid, json!({"actual": actual, "limit": self.limit})))
    }
}

fn build_contains_bound(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ContainsBoundKeyword {
        limit: expect_non_negative_integer(name, value)?,
        max: name == "maxContains",
    }))
}

/// `minItems` / `maxItems`.
#[derive(Debug)]
pub struct ItemCountKeyword {
    pub limit: u64,
    pub max: bool,
}

impl Keyword for ItemCountKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(items) = ctx.instance().as_array() else {
            return Ok(ctx.pass());
        };
        let actual = items.len() as u64;
        let valid = if self.max {
            actual <= self.limit
        } else {
            actual >= self.limit
        };
        Ok(ctx.outcome(valid, json!({"actual": actual, "limit": self.limit})))
    }
}

fn build_item_count(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ItemCountKeyword {
        limit: expect_non_negative_integer(name, value)?,
        max: name == "maxItems",
    }))
}

#[derive(Debug)]
pub struct UniqueItemsKeyword {
    pub unique: bool,
}

impl Keyword for UniqueItemsKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(items) = ctx.instance().as_array().filter(|_| self.unique) else {
            return Ok(ctx.pass());
        };
        let equality = &ctx.options().equality;
        let mut duplicates = Vec::new();
        for (i, a) in items.iter().enumerate() {
            if let Some(j) = items[..i].iter().position(|b| deep_equal_with(a, b, equality)) {
                duplicates.push(json!([j, i]));
                if ctx.is_flag() {
                    break;
                }
            }
        }
        Ok(ctx.outcome(duplicates.is_empty(), json!({"duplicates": duplicates})))
    }
}

fn build_unique_items(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(UniqueItemsKeyword {
        unique: expect_bool(name, value)?,
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let applicator = Some(Vocabulary::Applicator);
    let validation = Some(Vocabulary::Validation);
    vec![
        entry("items", DraftMask::ALL, applicator, build_items),
        entry("additionalItems", DraftMask::ALL, applicator, build_additional_items),
        entry("unevaluatedItems", DraftMask::DRAFT2019_09, applicator, build_unevaluated_items),
        entry("contains", DraftMask::since(Draft::Draft06), applicator, build_contains),
        entry("minContains", DraftMask::DRAFT2019_09, validation, build_contains_bound),
        entry("maxContains", DraftMask::DRAFT2019_09, validation, build_contains_bound),
        entry("minItems", DraftMask::ALL, validation, build_item_count),
        entry("maxItems", DraftMask::ALL, validation, build_item_count),
        entry("uniqueItems", DraftMask::ALL, validation, build_unique_items),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(schema: Value, instance: Value) -> ValidationResult {
        Schema::from_json(&schema).unwrap().validate(&instance).unwrap()
    }

    #[test]
    fn test_items_failure_is_reported_per_item() {
        let result = validate(
            json!({"minItems": 1, "items": {"type": "integer"}}),
            json!([1, "string"]),
        );
        assert!(!result.is_valid);
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword.as_deref(), Some("type"));
        assert_eq!(errors[0].instance_location, JsonPointer::root().with_index(1));
    }

    #[test]
    fn test_tuple_and_additional_items() {
        let schema = json!({
            "items": [{"type": "integer"}, {"type": "string"}],
            "additionalItems": false
        });
        assert!(validate(schema.clone(), json!([1, "a"])).is_valid);
        assert!(validate(schema.clone(), json!([1])).is_valid);
        let result = validate(schema, json!([1, "a", null]));
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword.as_deref(), Some("additionalItems"));
        assert_eq!(errors[0].instance_location, JsonPointer::root().with_index(2));

        assert!(validate(json!({"items": {}, "additionalItems": false}), json!([1, 2])).is_valid);
    }

    #[test]
    fn test_contains_bounds() {
        let schema = json!({"contains": {"type": "integer"}, "minContains": 2, "maxContains": 3});
        assert!(!validate(schema.clone(), json!([1, "a"])).is_valid);
        assert!(validate(schema.clone(), json!([1, 2, "a"])).is_valid);
        assert!(!validate(schema, json!([1, 2, 3, 4])).is_valid);

        assert!(validate(json!({"contains": {"type": "integer"}, "minContains": 0}), json!([])).is_valid);
        assert!(!validate(json!({"contains": {"type": "integer"}}), json!(["a"])).is_valid);
        assert!(validate(json!({"contains": false}), json!("not an array")).is_valid);
    }

    #[test]
    fn test_unevaluated_items() {
        let schema = json!({
            "allOf": [{"items": [true]}],
            "unevaluatedItems": false
        });
        assert!(validate(schema.clone(), json!([1])).is_valid);
        assert!(!validate(schema, json!([1, 2])).is_valid);
    }

    #[test]
    fn test_contains_marks_matching_items() {
        let schema = json!({"contains": {"type": "string"}, "unevaluatedItems": false});
        assert!(validate(schema.clone(), json!(["a"])).is_valid);
        let result = validate(schema, json!([1, "a"]));
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword.as_deref(), Some("unevaluatedItems"));
        assert_eq!(errors[0].instance_location, JsonPointer::root().with_index(0));
    }

    #[test]
    fn test_unique_items_uses_numeric_equality() {
        assert!(!validate(json!({"uniqueItems": true}), json!([1, 1.0])).is_valid);
        assert!(!validate(json!({"uniqueItems": true}), json!([{"a": [1]}, {"a": [1]}])).is_valid);
        assert!(validate(json!({"uniqueItems": true}), json!([[1, 2], [2, 1]])).is_valid);
        assert!(validate(json!({"uniqueItems": false}), json!([1, 1])).is_valid);
    }
}
