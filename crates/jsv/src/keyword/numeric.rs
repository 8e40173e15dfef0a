//! Numeric keywords.
//!
//! Draft 04 spells exclusive bounds as booleans modifying `minimum` and
//! `maximum`; from draft 06 `exclusiveMinimum`/`exclusiveMaximum` carry
//! their own limit. Both shapes are registered as separate variants.

use std::cmp::Ordering;
use std::sync::Arc;

use jsv_util::{is_multiple_of, number_cmp};
use serde_json::{json, Number, Value};

use super::{entry, expect_bool, expect_number, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::BuildContext;
use crate::SchemaError;

#[derive(Debug)]
pub struct MultipleOfKeyword {
    pub divisor: Number,
}

impl Keyword for MultipleOfKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Value::Number(actual) = ctx.instance() else {
            return Ok(ctx.pass());
        };
        let valid = is_multiple_of(actual, &self.divisor);
        Ok(ctx.outcome(valid, json!({"actual": actual, "divisor": self.divisor})))
    }
}

fn build_multiple_of(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let divisor = expect_number(name, value)?;
    if divisor.as_f64().map_or(true, |d| d <= 0.0) {
        return Err(SchemaError::invalid_keyword(name, "a number greater than 0", value));
    }
    Ok(Arc::new(MultipleOfKeyword {
        divisor: divisor.clone(),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Minimum,
    Maximum,
}

/// A numeric limit: `minimum`, `maximum`, `exclusiveMinimum` or
/// `exclusiveMaximum`.
#[derive(Debug)]
pub struct LimitKeyword {
    pub limit: Number,
    pub bound: Bound,
    pub exclusive: bool,
}

impl LimitKeyword {
    fn admits(&self, actual: &Number) -> bool {
        let Some(ordering) = number_cmp(actual, &self.limit) else {
            return false;
        };
        match (self.bound, self.exclusive) {
            (Bound::Minimum, false) => ordering != Ordering::Less,
            (Bound::Minimum, true) => ordering == Ordering::Greater,
            (Bound::Maximum, false) => ordering != Ordering::Greater,
            (Bound::Maximum, true) => ordering == Ordering::Less,
        }
    }
}

impl Keyword for LimitKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Value::Number(actual) = ctx.instance() else {
            return Ok(ctx.pass());
        };
        Ok(ctx.outcome(
            self.admits(actual),
            json!({"actual": actual, "limit": self.limit, "exclusive": self.exclusive}),
        ))
    }
}

fn bound_of(name: &str) -> Bound {
    if name.ends_with("inimum") {
        Bound::Minimum
    } else {
        Bound::Maximum
    }
}

fn build_limit(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(LimitKeyword {
        limit: expect_number(name, value)?.clone(),
        bound: bound_of(name),
        exclusive: name.starts_with("exclusive"),
    }))
}

/// Draft 04 `minimum`/`maximum`: exclusivity comes from the boolean sibling.
fn build_limit_draft4(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let modifier = match name {
        "minimum" => "exclusiveMinimum",
        _ => "exclusiveMaximum",
    };
    let exclusive = match ctx.sibling(modifier) {
        Some(flag) => expect_bool(modifier, flag)?,
        None => false,
    };
    Ok(Arc::new(LimitKeyword {
        limit: expect_number(name, value)?.clone(),
        bound: bound_of(name),
        exclusive,
    }))
}

/// Draft 04 `exclusiveMinimum`/`exclusiveMaximum`: a flag read by the
/// matching limit, inert on its own.
#[derive(Debug)]
pub struct ExclusiveFlagKeyword {
    pub exclusive: bool,
}

impl Keyword for ExclusiveFlagKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_exclusive_flag(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ExclusiveFlagKeyword {
        exclusive: expect_bool(name, value)?,
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::Validation);
    let modern = DraftMask::since(Draft::Draft06);
    vec![
        entry("multipleOf", DraftMask::ALL, vocab, build_multiple_of),
        entry("minimum", DraftMask::DRAFT04, None, build_limit_draft4),
        entry("minimum", modern, vocab, build_limit),
        entry("maximum", DraftMask::DRAFT04, None, build_limit_draft4),
        entry("maximum", modern, vocab, build_limit),
        entry("exclusiveMinimum", DraftMask::DRAFT04, None, build_exclusive_flag),
        entry("exclusiveMinimum", modern, vocab, build_limit),
        entry("exclusiveMaximum", DraftMask::DRAFT04, None, build_exclusive_flag),
        entry("exclusiveMaximum", modern, vocab, build_limit),
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
    fn test_multiple_of_decimal() {
        let schema = json!({"multipleOf": 2.5});
        assert!(valid(schema.clone(), json!(7.5)));
        assert!(valid(schema.clone(), json!(-7.5)));
        assert!(valid(schema.clone(), json!(0)));
        let result = Schema::from_json(&schema).unwrap().validate(&json!(16)).unwrap();
        assert_eq!(result.errors().len(), 1);
        assert!(valid(json!({"multipleOf": 0.01}), json!(19.99)));
        assert!(Schema::from_json(&json!({"multipleOf": 0})).is_err());
    }

    #[test]
    fn test_limits() {
        assert!(valid(json!({"minimum": 3}), json!(3)));
        assert!(!valid(json!({"exclusiveMinimum": 3}), json!(3)));
        assert!(valid(json!({"exclusiveMinimum": 3}), json!(3.1)));
        assert!(valid(json!({"maximum": 3.5}), json!(3)));
        assert!(!valid(json!({"exclusiveMaximum": 3}), json!(3.0)));
        assert!(valid(json!({"maximum": 3}), json!("not a number")));
        assert!(valid(json!({"minimum": -1}), json!(u64::MAX)));
    }

    #[test]
    fn test_draft4_boolean_exclusivity() {
        let options = BuildOptions {
            default_draft: Draft::Draft04,
            ..Default::default()
        };
        let schema =
            Schema::from_json_with(&json!({"maximum": 3, "exclusiveMaximum": true}), &options).unwrap();
        assert!(!schema.validate(&json!(3)).unwrap().is_valid);
        assert!(schema.validate(&json!(2)).unwrap().is_valid);

        let lone = Schema::from_json_with(&json!({"exclusiveMinimum": true}), &options).unwrap();
        assert!(lone.validate(&json!(-100)).unwrap().is_valid);
        assert!(Schema::from_json_with(&json!({"exclusiveMinimum": 3}), &options).is_err());
    }
}
