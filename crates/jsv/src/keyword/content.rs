//! String-encoded content: `contentEncoding`, `contentMediaType` and
//! `contentSchema`.
//!
//! The media type and schema keywords read the encoding from their
//! `contentEncoding` sibling and decode before checking.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use jsv_pointer::JsonPointer;
use serde_json::{json, Value};

use super::{entry, expect_string, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema};
use crate::SchemaError;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Decodes `text` per `encoding`. `Ok(None)` when the text is not valid in
/// that encoding.
fn decode(encoding: Option<&str>, text: &str, ctx: &ValidationContext<'_>) -> Result<Option<Vec<u8>>, SchemaError> {
    match encoding.map(str::to_ascii_lowercase).as_deref() {
        None | Some("7bit") | Some("8bit") | Some("binary") => Ok(Some(text.as_bytes().to_vec())),
        Some("base64") => Ok(STANDARD.decode(text).ok()),
        Some(other) => {
            if ctx.options().strict {
                return Err(SchemaError::UnknownContentEncoding(other.to_string()));
            }
            tracing::warn!(encoding = other, "unknown content encoding, not decoded");
            Ok(Some(text.as_bytes().to_vec()))
        }
    }
}

fn is_json_media_type(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

#[derive(Debug)]
pub struct ContentEncodingKeyword {
    pub encoding: String,
}

impl Keyword for ContentEncodingKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(text) = ctx.instance().as_str() else {
            return Ok(ctx.pass());
        };
        let valid = decode(Some(self.encoding.as_str()), text, ctx)?.is_some();
        let mut result = ctx.outcome(valid, json!({"encoding": self.encoding}));
        if valid {
            result.annotation = Some(json!(self.encoding));
        }
        Ok(result)
    }
}

fn build_content_encoding(name: &str, value: &Value, _: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ContentEncodingKeyword {
        encoding: expect_string(name, value)?.to_string(),
    }))
}

/// `contentMediaType`. Only `application/json` is checked; other media
/// types are annotations.
#[derive(Debug)]
pub struct ContentMediaTypeKeyword {
    pub media_type: String,
    pub encoding: Option<String>,
}

impl Keyword for ContentMediaTypeKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(text) = ctx.instance().as_str() else {
            return Ok(ctx.pass());
        };
        let mut valid = true;
        if is_json_media_type(&self.media_type) {
            // An undecodable string is contentEncoding's failure, not ours.
            if let Some(bytes) = decode(self.encoding.as_deref(), text, ctx)? {
                valid = serde_json::from_slice::<Value>(&bytes).is_ok();
            }
        }
        let mut result = ctx.outcome(valid, json!({"mediaType": self.media_type}));
        if valid {
            result.annotation = Some(json!(self.media_type));
        }
        Ok(result)
    }
}

fn build_content_media_type(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ContentMediaTypeKeyword {
        media_type: expect_string(name, value)?.to_string(),
        encoding: ctx
            .sibling("contentEncoding")
            .and_then(Value::as_str)
            .map(str::to_string),
    }))
}

/// `contentSchema`: the decoded JSON document must match the schema.
/// Without a JSON `contentMediaType` sibling it only annotates.
#[derive(Debug)]
pub struct ContentSchemaKeyword {
    pub schema: Schema,
    pub encoding: Option<String>,
    pub is_json: bool,
}

impl Keyword for ContentSchemaKeyword {
    fn sequence(&self) -> i32 {
        2
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(text) = ctx.instance().as_str().filter(|_| self.is_json) else {
            return Ok(ctx.pass());
        };
        let Some(bytes) = decode(self.encoding.as_deref(), text, ctx)? else {
            return Ok(ctx.pass());
        };
        let Ok(document) = serde_json::from_slice::<Value>(&bytes) else {
            return Ok(ctx.pass());
        };
        let outcome = ctx.validate_value(&self.schema, &[], ctx.instance_location().clone(), &document)?;
        if outcome.is_valid {
            return Ok(ctx.node(true, vec![outcome]));
        }
        let mut result = ctx.fail(json!({}));
        result.nested.push(outcome);
        Ok(result)
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_content_schema(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(ContentSchemaKeyword {
        schema: ctx.subschema(value, &[name])?,
        encoding: ctx
            .sibling("contentEncoding")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_json: ctx
            .sibling("contentMediaType")
            .and_then(Value::as_str)
            .is_some_and(is_json_media_type),
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::Content);
    let since_07 = DraftMask::since(Draft::Draft07);
    vec![
        entry("contentEncoding", since_07, vocab, build_content_encoding),
        entry("contentMediaType", since_07, vocab, build_content_media_type),
        entry("contentSchema", DraftMask::DRAFT2019_09, vocab, build_content_schema),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ValidationOptions;
    use serde_json::json;

    fn valid(schema: Value, instance: Value) -> bool {
        Schema::from_json(&schema)
            .unwrap()
            .validate(&instance)
            .unwrap()
            .is_valid
    }

    #[test]
    fn test_base64_encoding() {
        let schema = json!({"contentEncoding": "base64"});
        assert!(valid(schema.clone(), json!("eyJhIjogMX0=")));
        assert!(!valid(schema.clone(), json!("not base64!")));
        assert!(valid(schema, json!(7)));
    }

    #[test]
    fn test_json_media_type() {
        let schema = json!({"contentMediaType": "application/json"});
        assert!(valid(schema.clone(), json!("{\"a\": 1}")));
        assert!(!valid(schema, json!("{a: 1}")));
        assert!(valid(json!({"contentMediaType": "text/plain"}), json!("{a: 1}")));
        assert!(is_json_media_type("application/json; charset=utf-8"));
    }

    #[test]
    fn test_content_schema_sees_decoded_document() {
        let schema = json!({
            "contentEncoding": "base64",
            "contentMediaType": "application/json",
            "contentSchema": {"required": ["a"]}
        });
        // {"a": 1} and {"b": 1}
        assert!(valid(schema.clone(), json!("eyJhIjogMX0=")));
        assert!(!valid(schema, json!("eyJiIjogMX0=")));
    }

    #[test]
    fn test_unknown_encoding() {
        let schema = Schema::from_json(&json!({"contentEncoding": "rot13"})).unwrap();
        assert!(schema.validate(&json!("abc")).unwrap().is_valid);
        let strict = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        assert_eq!(
            schema.validate_with(&json!("abc"), &strict).unwrap_err(),
            SchemaError::UnknownContentEncoding("rot13".into())
        );
    }
}
