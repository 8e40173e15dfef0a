//! Keywords for any instance type: `type`, `enum`, `const`.

use std::sync::Arc;

use jsv_util::deep_equal_with;
use serde_json::{json, Value};

use super::{entry, expect_array, type_name, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::BuildContext;
use crate::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl JsonType {
    fn parse(name: &str) -> Option<JsonType> {
        Some(match name {
            "null" => JsonType::Null,
            "boolean" => JsonType::Boolean,
            "object" => JsonType::Object,
            "array" => JsonType::Array,
            "number" => JsonType::Number,
            "string" => JsonType::String,
            "integer" => JsonType::Integer,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Integer => "integer",
        }
    }

    /// Draft 04 counts only numbers written without a fraction as
    /// integers; later drafts accept `1.0`.
    fn matches(self, value: &Value, draft: Draft) -> bool {
        match (self, value) {
            (JsonType::Null, Value::Null)
            | (JsonType::Boolean, Value::Bool(_))
            | (JsonType::Object, Value::Object(_))
            | (JsonType::Array, Value::Array(_))
            | (JsonType::Number, Value::Number(_))
            | (JsonType::String, Value::String(_)) => true,
            (JsonType::Integer, Value::Number(n)) if draft == Draft::Draft04 => n.is_i64() || n.is_u64(),
            (JsonType::Integer, Value::Number(n)) => jsv_util::is_integer(n),
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct TypeKeyword {
    pub types: Vec<JsonType>,
}

impl Keyword for TypeKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let instance = ctx.instance();
        let draft = ctx.draft();
        let valid = self.types.iter().any(|t| t.matches(instance, draft));
        let expected: Vec<&str> = self.types.iter().map(|t| t.as_str()).collect();
        Ok(ctx.outcome(
            valid,
            json!({"actual": type_name(instance), "expected": expected}),
        ))
    }
}

fn build_type(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let err = || SchemaError::invalid_keyword(name, "a type name or an array of type names", value);
    let names: Vec<&Value> = match value {
        Value::String(_) => vec![value],
        Value::Array(items) => items.iter().collect(),
        _ => return Err(err()),
    };
    let types = names
        .into_iter()
        .map(|item| item.as_str().and_then(JsonType::parse).ok_or_else(err))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::new(TypeKeyword { types }))
}

#[derive(Debug)]
pub struct EnumKeyword {
    pub values: Vec<Value>,
}

impl Keyword for EnumKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let equality = &ctx.options().equality;
        let instance = ctx.instance();
        let valid = self
            .values
            .iter()
            .any(|candidate| deep_equal_with(instance, candidate, equality));
        Ok(ctx.outcome(valid, json!({"expected": self.values})))
    }
}

fn build_enum(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(EnumKeyword {
        values: expect_array(name, value)?.clone(),
    }))
}

#[derive(Debug)]
pub struct ConstKeyword {
    pub value: Value,
}

impl Keyword for ConstKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let valid = deep_equal_with(ctx.instance(), &self.value, &ctx.options().equality);
        Ok(ctx.outcome(valid, json!({"expected": self.value})))
    }
}

fn build_const(_: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ConstKeyword {
        value: value.clone(),
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::Validation);
    vec![
        entry("type", DraftMask::ALL, vocab, build_type),
        entry("enum", DraftMask::ALL, vocab, build_enum),
        entry("const", DraftMask::since(Draft::Draft06), vocab, build_const),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BuildOptions;
    use crate::schema::Schema;
    use serde_json::json;

    fn valid(schema: Value, instance: Value) -> bool {
        Schema::from_json(&schema)
            .unwrap()
            .validate(&instance)
            .unwrap()
            .is_valid
    }

    #[test]
    fn test_type() {
        assert!(valid(json!({"type": "integer"}), json!(1.0)));
        assert!(valid(json!({"type": "number"}), json!(1)));
        assert!(!valid(json!({"type": "integer"}), json!(1.5)));
        assert!(valid(json!({"type": ["string", "null"]}), json!(null)));
        assert!(!valid(json!({"type": ["string", "null"]}), json!(false)));
        assert!(Schema::from_json(&json!({"type": "float"})).is_err());
        assert!(Schema::from_json(&json!({"type": 1})).is_err());
    }

    #[test]
    fn test_draft4_integers_are_written_without_fraction() {
        let options = BuildOptions {
            default_draft: Draft::Draft04,
            ..Default::default()
        };
        let schema = Schema::from_json_with(&json!({"type": "integer"}), &options).unwrap();
        assert!(schema.validate(&json!(3)).unwrap().is_valid);
        assert!(!schema.validate(&json!(3.0)).unwrap().is_valid);
    }

    #[test]
    fn test_type_message() {
        let schema = Schema::from_json(&json!({"type": "string"})).unwrap();
        let result = schema.validate(&json!(5)).unwrap();
        assert_eq!(
            result.errors()[0].error.as_deref(),
            Some("Value is of type integer, expected [\"string\"]")
        );
    }

    #[test]
    fn test_enum_and_const() {
        assert!(valid(json!({"enum": [1, "a", {"k": [null]}]}), json!({"k": [null]})));
        assert!(valid(json!({"enum": [1, "a"]}), json!(1.0)));
        assert!(!valid(json!({"enum": [1, "a"]}), json!("b")));
        assert!(valid(json!({"const": {"a": 1, "b": 2}}), json!({"b": 2, "a": 1})));
        assert!(!valid(json!({"const": null}), json!(0)));
        assert!(Schema::from_json(&json!({"enum": "a"})).is_err());
    }
}
