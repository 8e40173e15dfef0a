//! Annotation-only keywords: `title`, `description`, `default`, `examples`,
//! `readOnly`, `writeOnly`, `deprecated`.

use std::sync::Arc;

use serde_json::Value;

use super::{entry, expect_array, expect_bool, expect_string, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::BuildContext;
use crate::SchemaError;

/// Passes every instance and annotates it with the payload.
#[derive(Debug)]
pub struct AnnotationKeyword {
    pub value: Value,
}

impl Keyword for AnnotationKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let mut result = ctx.pass();
        result.annotation = Some(self.value.clone());
        Ok(result)
    }
}

fn build_annotation(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    match name {
        "title" | "description" => {
            expect_string(name, value)?;
        }
        "examples" => {
            expect_array(name, value)?;
        }
        "readOnly" | "writeOnly" | "deprecated" => {
            expect_bool(name, value)?;
        }
        _ => {}
    }
    Ok(Arc::new(AnnotationKeyword {
        value: value.clone(),
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::MetaData);
    vec![
        entry("title", DraftMask::ALL, vocab, build_annotation),
        entry("description", DraftMask::ALL, vocab, build_annotation),
        entry("default", DraftMask::ALL, vocab, build_annotation),
        entry("examples", DraftMask::since(Draft::Draft06), vocab, build_annotation),
        entry("readOnly", DraftMask::since(Draft::Draft07), vocab, build_annotation),
        entry("writeOnly", DraftMask::since(Draft::Draft07), vocab, build_annotation),
        entry("deprecated", DraftMask::DRAFT2019_09, vocab, build_annotation),
    ]
}
