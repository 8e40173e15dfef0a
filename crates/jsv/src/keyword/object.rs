//! Object keywords.

use std::sync::Arc;

use indexmap::IndexMap;
use jsv_pointer::JsonPointer;
use regex::Regex;
use serde_json::{json, Value};

use super::{
    compile_regex, entry, expect_non_negative_integer, expect_object, expect_string_array, pointer,
    schema_map, Keyword, KeywordEntry,
};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema};
use crate::SchemaError;

fn names_annotation(result: &mut ValidationResult, names: Vec<String>) {
    if result.is_valid && !names.is_empty() {
        result.annotation = Some(json!(names));
    }
}

#[derive(Debug)]
pub struct PropertiesKeyword {
    pub properties: IndexMap<String, Schema>,
}

impl Keyword for PropertiesKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let mut nested = Vec::new();
        let mut matched = Vec::new();
        let mut valid = true;
        for (name, schema) in &self.properties {
            let Some(value) = object.get(name) else {
                continue;
            };
            let outcome = ctx.validate_property(schema, &[name.as_str()], name, value)?;
            valid &= outcome.is_valid;
            nested.push(outcome);
            ctx.mark_property(name);
            matched.push(name.clone());
            if !valid && ctx.is_flag() {
                break;
            }
        }
        let mut result = ctx.node(valid, nested);
        names_annotation(&mut result, matched);
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        self.properties
            .iter()
            .map(|(name, schema)| (pointer(&[name.as_str()]), schema.clone()))
            .collect()
    }
}

fn build_properties(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(PropertiesKeyword {
        properties: schema_map(name, value, ctx)?,
    }))
}

#[derive(Debug)]
pub struct PatternProperty {
    pub pattern: String,
    pub regex: Regex,
    pub schema: Schema,
}

#[derive(Debug)]
pub struct PatternPropertiesKeyword {
    pub patterns: Vec<PatternProperty>,
}

impl Keyword for PatternPropertiesKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let mut nested = Vec::new();
        let mut matched = Vec::new();
        let mut valid = true;
        for (name, value) in object {
            let mut hit = false;
            for entry in self.patterns.iter().filter(|p| p.regex.is_match(name)) {
                let outcome = ctx.validate_property(&entry.schema, &[entry.pattern.as_str()], name, value)?;
                valid &= outcome.is_valid;
                nested.push(outcome);
                hit = true;
            }
            if hit {
                ctx.mark_property(name);
                matched.push(name.clone());
            }
            if !valid && ctx.is_flag() {
                break;
            }
        }
        let mut result = ctx.node(valid, nested);
        names_annotation(&mut result, matched);
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        self.patterns
            .iter()
            .map(|p| (pointer(&[p.pattern.as_str()]), p.schema.clone()))
            .collect()
    }
}

fn build_pattern_properties(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    let patterns = schema_map(name, value, ctx)?
        .into_iter()
        .map(|(pattern, schema)| {
            Ok(PatternProperty {
                regex: compile_regex(&pattern)?,
                pattern,
                schema,
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;
    Ok(Arc::new(PatternPropertiesKeyword { patterns }))
}

/// Applies `schema` to each member in `names`. A `false` schema rejects the
/// member directly, reported by the keyword at the member's location.
fn apply_to_members(
    ctx: &mut ValidationContext<'_>,
    schema: &Schema,
    names: &[String],
) -> Result<ValidationResult, SchemaError> {
    let Some(object) = ctx.instance().as_object() else {
        return Ok(ctx.pass());
    };
    let mut nested = Vec::new();
    let mut valid = true;
    for name in names {
        let Some(value) = object.get(name) else {
            continue;
        };
        let outcome = if schema.as_bool() == Some(false) {
            let location = ctx.instance_location().with(name.as_str());
            ctx.fail_at(location, json!({"property": name, "properties": [name]}))
        } else {
            ctx.validate_property(schema, &[], name, value)?
        };
        valid &= outcome.is_valid;
        nested.push(outcome);
        ctx.mark_property(name);
        if !valid && ctx.is_flag() {
            break;
        }
    }
    let mut result = ctx.node(valid, nested);
    names_annotation(&mut result, names.to_vec());
    Ok(result)
}

/// `additionalProperties`: members matched by neither `properties` nor
/// `patternProperties` of the same schema object.
#[derive(Debug)]
pub struct AdditionalPropertiesKeyword {
    pub schema: Schema,
    pub known: Vec<String>,
    pub patterns: Vec<Regex>,
}

impl Keyword for AdditionalPropertiesKeyword {
    fn sequence(&self) -> i32 {
        2
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let additional: Vec<String> = object
            .keys()
            .filter(|name| !self.known.contains(*name))
            .filter(|name| !self.patterns.iter().any(|re| re.is_match(name)))
            .cloned()
            .collect();
        apply_to_members(ctx, &self.schema, &additional)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_additional_properties(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    let schema = ctx.subschema_or_bool(value, &[name])?;
    let known = match ctx.sibling("properties") {
        Some(properties) => expect_object("properties", properties)?.keys().cloned().collect(),
        None => Vec::new(),
    };
    let patterns = match ctx.sibling("patternProperties") {
        Some(patterns) => expect_object("patternProperties", patterns)?
            .keys()
            .map(|pattern| compile_regex(pattern))
            .collect::<Result<Vec<_>, SchemaError>>()?,
        None => Vec::new(),
    };
    Ok(Arc::new(AdditionalPropertiesKeyword {
        schema,
        known,
        patterns,
    }))
}

/// `unevaluatedProperties`: members no other keyword of this schema, its
/// passing in-place applicators or its references accounted for.
#[derive(Debug)]
pub struct UnevaluatedPropertiesKeyword {
    pub schema: Schema,
}

impl Keyword for UnevaluatedPropertiesKeyword {
    fn sequence(&self) -> i32 {
        10
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let evaluated = &ctx.evaluated().properties;
        let remaining: Vec<String> = object
            .keys()
            .filter(|name| !evaluated.contains(*name))
            .cloned()
            .collect();
        apply_to_members(ctx, &self.schema, &remaining)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_unevaluated_properties(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(UnevaluatedPropertiesKeyword {
        schema: ctx.subschema_or_bool(value, &[name])?,
    }))
}

#[derive(Debug)]
pub struct PropertyNamesKeyword {
    pub schema: Schema,
}

impl Keyword for PropertyNamesKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let mut nested = Vec::new();
        let mut valid = true;
        for name in object.keys() {
            let key = Value::String(name.clone());
            let location = ctx.instance_location().with(name.as_str());
            let outcome = ctx.validate_value(&self.schema, &[], location.clone(), &key)?;
            if outcome.is_valid {
                nested.push(outcome);
                continue;
            }
            valid = false;
            let mut failure = ctx.fail_at(location, json!({"property": name}));
            failure.nested.push(outcome);
            nested.push(failure);
            if ctx.is_flag() {
                break;
            }
        }
        Ok(ctx.node(valid, nested))
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_property_names(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(PropertyNamesKeyword {
        schema: ctx.subschema(value, &[name])?,
    }))
}

#[derive(Debug)]
pub struct RequiredKeyword {
    pub required: Vec<String>,
}

impl Keyword for RequiredKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let missing: Vec<&String> = self
            .required
            .iter()
            .filter(|name| !object.contains_key(*name))
            .collect();
        Ok(ctx.outcome(missing.is_empty(), json!({"missing": missing})))
    }
}

fn build_required(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(RequiredKeyword {
        required: expect_string_array(name, value)?,
    }))
}

/// `minProperties` / `maxProperties`.
#[derive(Debug)]
pub struct PropertyCountKeyword {
    pub limit: u64,
    pub max: bool,
}

impl Keyword for PropertyCountKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let actual = object.len() as u64;
        let valid = if self.max {
            actual <= self.limit
        } else {
            actual >= self.limit
        };
        Ok(ctx.outcome(valid, json!({"actual": actual, "limit": self.limit})))
    }
}

fn build_property_count(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(PropertyCountKeyword {
        limit: expect_non_negative_integer(name, value)?,
        max: name == "maxProperties",
    }))
}

#[derive(Debug)]
pub struct DependentRequiredKeyword {
    pub dependencies: IndexMap<String, Vec<String>>,
}

impl Keyword for DependentRequiredKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let mut nested = Vec::new();
        for (property, required) in &self.dependencies {
            if !object.contains_key(property) {
                continue;
            }
            let missing: Vec<&String> = required.iter().filter(|n| !object.contains_key(*n)).collect();
            if !missing.is_empty() {
                nested.push(ctx.fail(json!({"property": property, "missing": missing})));
            }
        }
        Ok(ctx.node(nested.is_empty(), nested))
    }
}

fn build_dependent_required(
    name: &str,
    value: &Value,
    _: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    let dependencies = expect_object(name, value)?
        .iter()
        .map(|(property, required)| Ok((property.clone(), expect_string_array(name, required)?)))
        .collect::<Result<IndexMap<_, _>, SchemaError>>()?;
    Ok(Arc::new(DependentRequiredKeyword { dependencies }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let applicator = Some(Vocabulary::Applicator);
    let validation = Some(Vocabulary::Validation);
    vec![
        entry("properties", DraftMask::ALL, applicator, build_properties),
        entry("patternProperties", DraftMask::ALL, applicator, build_pattern_properties),
        entry("additionalProperties", DraftMask::ALL, applicator, build_additional_properties),
        entry("propertyNames", DraftMask::since(Draft::Draft06), applicator, build_property_names),
        entry(
            "unevaluatedProperties",
            DraftMask::DRAFT2019_09,
            applicator,
            build_unevaluated_properties,
        ),
        entry("required", DraftMask::ALL, validation, build_required),
        entry("minProperties", DraftMask::ALL, validation, build_property_count),
        entry("maxProperties", DraftMask::ALL, validation, build_property_count),
        entry("dependentRequired", DraftMask::DRAFT2019_09, validation, build_dependent_required),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsv_pointer::JsonPointer;
    use serde_json::json;

    fn validate(schema: Value, instance: Value) -> ValidationResult {
        Schema::from_json(&schema).unwrap().validate(&instance).unwrap()
    }

    #[test]
    fn test_additional_properties_reports_the_member() {
        let result = validate(
            json!({"properties": {"a": {"type": "integer"}}, "additionalProperties": false}),
            json!({"a": 5, "b": 1}),
        );
        assert!(!result.is_valid);
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword.as_deref(), Some("additionalProperties"));
        assert_eq!(errors[0].instance_location, JsonPointer::root().with("b"));
        assert_eq!(errors[0].error.as_deref(), Some("Property 'b' is not allowed"));
    }

    #[test]
    fn test_pattern_properties_count_as_known() {
        let schema = json!({
            "patternProperties": {"^x-": {"type": "string"}},
            "additionalProperties": {"type": "integer"}
        });
        assert!(validate(schema.clone(), json!({"x-a": "s", "n": 1})).is_valid);
        assert!(!validate(schema.clone(), json!({"x-a": 1})).is_valid);
        assert!(!validate(schema, json!({"n": "s"})).is_valid);
    }

    #[test]
    fn test_unevaluated_properties_see_through_all_of() {
        let schema = json!({
            "allOf": [{"properties": {"a": {}}}],
            "unevaluatedProperties": false
        });
        assert!(validate(schema.clone(), json!({"a": 1})).is_valid);
        let result = validate(schema, json!({"a": 1, "b": 2}));
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].instance_location, JsonPointer::root().with("b"));
        assert_eq!(errors[0].keyword.as_deref(), Some("unevaluatedProperties"));
    }

    #[test]
    fn test_unevaluated_properties_see_every_any_of_branch() {
        let schema = json!({
            "anyOf": [
                {"properties": {"a": {"type": "string"}}, "required": ["a"]},
                {"properties": {"b": true}, "required": ["b"]}
            ],
            "unevaluatedProperties": false
        });
        assert!(validate(schema.clone(), json!({"b": 1})).is_valid);
        // The first branch fails on `a` but still evaluated it.
        assert!(validate(schema.clone(), json!({"a": 1, "b": 1})).is_valid);
        let result = validate(schema, json!({"b": 1, "c": 1}));
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].instance_location, JsonPointer::root().with("c"));
        assert_eq!(errors[0].keyword.as_deref(), Some("unevaluatedProperties"));
    }

    #[test]
    fn test_required_and_counts() {
        let result = validate(json!({"required": ["a", "b"]}), json!({"a": 1}));
        assert_eq!(
            result.errors()[0].error.as_deref(),
            Some("Required properties [\"b\"] are missing")
        );
        assert!(validate(json!({"required": ["a"]}), json!([1])).is_valid);
        assert!(!validate(json!({"minProperties": 2}), json!({"a": 1})).is_valid);
        assert!(validate(json!({"maxProperties": 1}), json!({"a": 1})).is_valid);
    }

    #[test]
    fn test_property_names_and_dependent_required() {
        let names = json!({"propertyNames": {"maxLength": 2}});
        assert!(validate(names.clone(), json!({"ab": 1})).is_valid);
        let result = validate(names, json!({"abc": 1}));
        assert_eq!(result.errors()[0].instance_location, JsonPointer::root().with("abc"));

        let dependent = json!({"dependentRequired": {"card": ["billing"]}});
        assert!(!validate(dependent.clone(), json!({"card": 1})).is_valid);
        assert!(validate(dependent, json!({"card": 1, "billing": 2})).is_valid);
    }
}
