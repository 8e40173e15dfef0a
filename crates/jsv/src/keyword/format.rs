//! The `format` keyword.
//!
//! Checks come from the [`FormatRegistry`](crate::FormatRegistry) in the
//! validation options. With `validate_format` off the keyword only
//! annotates.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{entry, expect_string, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::BuildContext;
use crate::SchemaError;

#[derive(Debug)]
pub struct FormatKeyword {
    pub format: String,
}

impl FormatKeyword {
    fn annotated(&self, mut result: ValidationResult) -> ValidationResult {
        result.annotation = Some(json!(self.format));
        result
    }
}

impl Keyword for FormatKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let options = ctx.options();
        if !options.validate_format {
            return Ok(self.annotated(ctx.pass()));
        }
        let Some(check) = options.formats.get(&self.format, ctx.draft()) else {
            if options.strict {
                return Err(SchemaError::UnknownFormat(self.format.clone()));
            }
            tracing::warn!(format = %self.format, draft = %ctx.draft(), "unknown format, not validated");
            return Ok(self.annotated(ctx.pass()));
        };
        let Some(text) = ctx.instance().as_str() else {
            return Ok(self.annotated(ctx.pass()));
        };
        if check(text) {
            Ok(self.annotated(ctx.pass()))
        } else {
            Ok(ctx.fail(json!({"format": self.format})))
        }
    }
}

fn build_format(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(FormatKeyword {
        format: expect_string(name, value)?.to_string(),
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    vec![entry("format", DraftMask::ALL, Some(Vocabulary::Format), build_format)]
}
