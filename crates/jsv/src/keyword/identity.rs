//! Identity and container keywords: `$schema`, `$id`/`id`, `$anchor`,
//! `$recursiveAnchor`, `$vocabulary`, `$comment`, `$defs`, `definitions`.
//!
//! The schema builder reads identity from the raw object; these keywords
//! only check their payloads and never fail an instance.

use std::sync::Arc;

use indexmap::IndexMap;
use jsv_pointer::JsonPointer;
use serde_json::Value;

use super::{entry, expect_bool, expect_object, expect_string, schema_map, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema};
use crate::SchemaError;

#[derive(Debug)]
pub struct SchemaKeyword {
    pub uri: String,
}

impl Keyword for SchemaKeyword {
    fn sequence(&self) -> i32 {
        0
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_schema(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(SchemaKeyword {
        uri: expect_string(name, value)?.to_string(),
    }))
}

#[derive(Debug)]
pub struct IdKeyword {
    pub id: String,
}

impl Keyword for IdKeyword {
    fn sequence(&self) -> i32 {
        0
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_id(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let id = expect_string(name, value)?;
    if ctx.draft >= Draft::Draft2019_09 && id.contains('#') && !id.ends_with('#') {
        return Err(SchemaError::invalid_keyword(
            name,
            "a URI without a fragment (use $anchor)",
            value,
        ));
    }
    Ok(Arc::new(IdKeyword { id: id.to_string() }))
}

fn is_anchor_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '_'))
}

#[derive(Debug)]
pub struct AnchorKeyword {
    pub name: String,
}

impl Keyword for AnchorKeyword {
    fn sequence(&self) -> i32 {
        0
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_anchor(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let anchor = expect_string(name, value)?;
    if !is_anchor_name(anchor) {
        return Err(SchemaError::invalid_keyword(name, "a plain-name anchor", value));
    }
    Ok(Arc::new(AnchorKeyword {
        name: anchor.to_string(),
    }))
}

#[derive(Debug)]
pub struct RecursiveAnchorKeyword {
    pub enabled: bool,
}

impl Keyword for RecursiveAnchorKeyword {
    fn sequence(&self) -> i32 {
        0
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_recursive_anchor(
    name: &str,
    value: &Value,
    _: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(RecursiveAnchorKeyword {
        enabled: expect_bool(name, value)?,
    }))
}

/// `$vocabulary`: vocabulary URI -> required.
#[derive(Debug)]
pub struct VocabularyKeyword {
    pub vocabularies: IndexMap<String, bool>,
}

impl VocabularyKeyword {
    /// The declared vocabularies this implementation knows.
    pub fn known(&self) -> impl Iterator<Item = Vocabulary> + '_ {
        self.vocabularies
            .keys()
            .filter_map(|uri| Vocabulary::from_uri(uri))
    }
}

impl Keyword for VocabularyKeyword {
    fn sequence(&self) -> i32 {
        0
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_vocabulary(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let vocabularies = expect_object(name, value)?
        .iter()
        .map(|(uri, required)| Ok((uri.clone(), expect_bool(name, required)?)))
        .collect::<Result<IndexMap<_, _>, SchemaError>>()?;
    Ok(Arc::new(VocabularyKeyword { vocabularies }))
}

#[derive(Debug)]
pub struct CommentKeyword {
    pub comment: String,
}

impl Keyword for CommentKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }
}

fn build_comment(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(CommentKeyword {
        comment: expect_string(name, value)?.to_string(),
    }))
}

/// `$defs` and `definitions`: named subschemas for references to point at.
#[derive(Debug)]
pub struct DefinitionsKeyword {
    pub schemas: IndexMap<String, Schema>,
}

impl Keyword for DefinitionsKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        Ok(ctx.pass())
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        self.schemas
            .iter()
            .map(|(name, schema)| (JsonPointer::root().with(name.as_str()), schema.clone()))
            .collect()
    }
}

fn build_definitions(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(DefinitionsKeyword {
        schemas: schema_map(name, value, ctx)?,
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::Core);
    vec![
        entry("$schema", DraftMask::ALL, vocab, build_schema),
        entry("$vocabulary", DraftMask::DRAFT2019_09, vocab, build_vocabulary),
        entry("id", DraftMask::DRAFT04, None, build_id),
        entry("$id", DraftMask::since(Draft::Draft06), vocab, build_id),
        entry("$anchor", DraftMask::DRAFT2019_09, vocab, build_anchor),
        entry("$recursiveAnchor", DraftMask::DRAFT2019_09, vocab, build_recursive_anchor),
        entry("$comment", DraftMask::since(Draft::Draft07), vocab, build_comment),
        entry("$defs", DraftMask::DRAFT2019_09, vocab, build_definitions),
        entry("definitions", DraftMask::ALL, None, build_definitions),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anchor_names() {
        assert!(is_anchor_name("foo"));
        assert!(is_anchor_name("a-b.c:d_e1"));
        assert!(!is_anchor_name("1abc"));
        assert!(!is_anchor_name("a/b"));
        assert!(!is_anchor_name(""));
        let err = Schema::from_json(&json!({"$anchor": "#bad"})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { .. }));
    }

    #[test]
    fn test_identity_keywords_never_fail() {
        let schema = Schema::from_json(&json!({
            "$id": "http://example.com/x",
            "$comment": "note",
            "$defs": {"n": {"type": "number"}}
        }))
        .unwrap();
        assert!(schema.validate(&json!("anything")).unwrap().is_valid);
    }

    #[test]
    fn test_vocabulary_payload() {
        let schema = Schema::from_json(&json!({
            "$vocabulary": {
                "https://json-schema.org/draft/2019-09/vocab/core": true,
                "http://example.com/vocab/x": false
            }
        }))
        .unwrap();
        let keyword = schema.get_keyword("$vocabulary").unwrap();
        assert!(format!("{keyword:?}").contains("vocab/core"));
        let err = Schema::from_json(&json!({"$vocabulary": {"x": "yes"}})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { .. }));
    }
}
