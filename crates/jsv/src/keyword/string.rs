//! String keywords. Lengths count Unicode scalar values, not bytes.

use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Value};

use super::{compile_regex, entry, expect_non_negative_integer, expect_string, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::BuildContext;
use crate::SchemaError;

/// `minLength` / `maxLength`.
#[derive(Debug)]
pub struct LengthKeyword {
    pub limit: u64,
    pub max: bool,
}

impl Keyword for LengthKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(text) = ctx.instance().as_str() else {
            return Ok(ctx.pass());
        };
        let actual = text.chars().count() as u64;
        let valid = if self.max {
            actual <= self.limit
        } else {
            actual >= self.limit
        };
        Ok(ctx.outcome(valid, json!({"actual": actual, "limit": self.limit})))
    }
}

fn build_length(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(LengthKeyword {
        limit: expect_non_negative_integer(name, value)?,
        max: name == "maxLength",
    }))
}

/// `pattern`: an unanchored search.
#[derive(Debug)]
pub struct PatternKeyword {
    pub pattern: String,
    pub regex: Regex,
}

impl Keyword for PatternKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(text) = ctx.instance().as_str() else {
            return Ok(ctx.pass());
        };
        Ok(ctx.outcome(self.regex.is_match(text), json!({"pattern": self.pattern})))
    }
}

fn build_pattern(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let pattern = expect_string(name, value)?;
    Ok(Arc::new(PatternKeyword {
        pattern: pattern.to_string(),
        regex: compile_regex(pattern)?,
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::Validation);
    vec![
        entry("maxLength", DraftMask::ALL, vocab, build_length),
        entry("minLength", DraftMask::ALL, vocab, build_length),
        entry("pattern", DraftMask::ALL, vocab, build_pattern),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_length_counts_code_points() {
        let schema = Schema::from_json(&json!({"minLength": 2, "maxLength": 2})).unwrap();
        assert!(schema.validate(&json!("日本")).unwrap().is_valid);
        assert!(!schema.validate(&json!("日")).unwrap().is_valid);
        assert!(schema.validate(&json!(12345)).unwrap().is_valid);
        let result = schema.validate(&json!("abc")).unwrap();
        assert_eq!(
            result.errors()[0].error.as_deref(),
            Some("String has length 3, at most 2 allowed")
        );
    }

    #[test]
    fn test_pattern() {
        let schema = Schema::from_json(&json!({"pattern": "^a+b"})).unwrap();
        assert!(schema.validate(&json!("aab")).unwrap().is_valid);
        assert!(!schema.validate(&json!("ba")).unwrap().is_valid);
        assert!(Schema::from_json(&json!({"pattern": "("})).is_err());
        let unanchored = Schema::from_json(&json!({"pattern": "b"})).unwrap();
        assert!(unanchored.validate(&json!("abc")).unwrap().is_valid);
    }
}
