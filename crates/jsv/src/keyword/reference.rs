//! `$ref` and `$recursiveRef`.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};
use url::Url;

use super::{entry, expect_string, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{DraftMask, Vocabulary};
use crate::resolve::{self, Resolved};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema, WeakSchema};
use crate::uri;
use crate::SchemaError;

/// Resolution result kept on the keyword.
///
/// Only targets inside the referencing document are cached: they depend on
/// nothing but that document. Targets in the tree are held weakly, since
/// the document owns them; rebuilt targets have no other owner.
#[derive(Debug)]
struct Cached {
    document: WeakSchema,
    target: CachedTarget,
}

#[derive(Debug)]
enum CachedTarget {
    InTree(WeakSchema),
    Detached(Schema),
}

#[derive(Debug)]
struct ReferenceTarget {
    reference: String,
    base_uri: Url,
    cache: RwLock<Option<Cached>>,
}

impl ReferenceTarget {
    fn new(reference: &str, base_uri: &Url) -> Self {
        Self {
            reference: reference.to_string(),
            base_uri: base_uri.clone(),
            cache: RwLock::new(None),
        }
    }

    fn cached(&self, ctx: &ValidationContext<'_>) -> Option<(Schema, Schema)> {
        let cache = self.cache.read();
        let cached = cache.as_ref()?;
        let document = cached.document.upgrade()?;
        if !document.ptr_eq(ctx.document()) {
            return None;
        }
        let target = match &cached.target {
            CachedTarget::InTree(weak) => weak.upgrade()?,
            CachedTarget::Detached(schema) => schema.clone(),
        };
        Some((document, target))
    }

    /// `(document, target)` the reference points at.
    fn resolve(&self, ctx: &ValidationContext<'_>) -> Result<(Schema, Schema), SchemaError> {
        if let Some(hit) = self.cached(ctx) {
            return Ok(hit);
        }
        let Resolved {
            document,
            target,
            detached,
        } = resolve::resolve(&self.reference, &self.base_uri, ctx)?;
        if document.ptr_eq(ctx.document()) {
            let target = if detached {
                CachedTarget::Detached(target.clone())
            } else {
                CachedTarget::InTree(target.downgrade())
            };
            *self.cache.write() = Some(Cached {
                document: document.downgrade(),
                target,
            });
        }
        Ok((document, target))
    }
}

/// Validates against `target`, unless this keyword is already being
/// applied at the same instance location further up the stack.
fn apply(
    reference: &str,
    document: Schema,
    target: &Schema,
    ctx: &mut ValidationContext<'_>,
) -> Result<ValidationResult, SchemaError> {
    if !ctx.enter_reference() {
        tracing::debug!(
            reference,
            instance = %ctx.instance_location(),
            "recursion detected"
        );
        let mut result = ctx.pass();
        result.annotation = Some(json!("recursion detected"));
        return Ok(result);
    }
    let outcome = ctx.validate_reference(document, target);
    ctx.leave_reference();
    let outcome = outcome?;
    Ok(ctx.node(outcome.is_valid, vec![outcome]))
}

#[derive(Debug)]
pub struct RefKeyword {
    target: ReferenceTarget,
}

impl RefKeyword {
    pub fn reference(&self) -> &str {
        &self.target.reference
    }
}

impl Keyword for RefKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let (document, target) = self.target.resolve(ctx)?;
        apply(&self.target.reference, document, &target, ctx)
    }
}

fn build_ref(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let reference = expect_string(name, value)?;
    uri::resolve(ctx.base_uri, reference)?;
    Ok(Arc::new(RefKeyword {
        target: ReferenceTarget::new(reference, ctx.base_uri),
    }))
}

/// `$recursiveRef`: resolves like `$ref`, but when the target carries
/// `$recursiveAnchor: true` the outermost such schema entered during this
/// validation is used instead.
#[derive(Debug)]
pub struct RecursiveRefKeyword {
    target: ReferenceTarget,
}

impl Keyword for RecursiveRefKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let (mut document, mut target) = self.target.resolve(ctx)?;
        if target.has_recursive_anchor() {
            if let Some((outer_document, outer)) = ctx.recursive_anchors().first() {
                document = outer_document.clone();
                target = outer.clone();
            }
        }
        apply(&self.target.reference, document, &target, ctx)
    }
}

fn build_recursive_ref(
    name: &str,
    value: &Value,
    ctx: &BuildContext<'_>,
) -> Result<Arc<dyn Keyword>, SchemaError> {
    let reference = expect_string(name, value)?;
    uri::resolve(ctx.base_uri, reference)?;
    Ok(Arc::new(RecursiveRefKeyword {
        target: ReferenceTarget::new(reference, ctx.base_uri),
    }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    vec![
        entry("$ref", DraftMask::ALL, Some(Vocabulary::Core), build_ref),
        entry(
            "$recursiveRef",
            DraftMask::DRAFT2019_09,
            Some(Vocabulary::Core),
            build_recursive_ref,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_pointer_and_anchor() {
        let schema = Schema::from_json(&json!({
            "properties": {
                "a": {"$ref": "#/$defs/positive"},
                "b": {"$ref": "#name"}
            },
            "$defs": {
                "positive": {"type": "integer", "minimum": 1},
                "named": {"$anchor": "name", "type": "string"}
            }
        }))
        .unwrap();
        assert!(schema.validate(&json!({"a": 3, "b": "x"})).unwrap().is_valid);
        assert!(!schema.validate(&json!({"a": 0})).unwrap().is_valid);
        assert!(!schema.validate(&json!({"b": 1})).unwrap().is_valid);
    }

    #[test]
    fn test_unresolvable_is_a_fault() {
        let schema = Schema::from_json(&json!({"$ref": "#/$defs/missing"})).unwrap();
        let err = schema.validate(&json!(1)).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableReference { .. }));
    }

    #[test]
    fn test_self_reference_terminates() {
        let schema = Schema::from_json(&json!({"$ref": "#", "type": "string"})).unwrap();
        let result = schema.validate(&json!(1)).unwrap();
        assert!(!result.is_valid);

        let draft7 = Schema::from_json(&json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$ref": "#"
        }))
        .unwrap();
        assert!(draft7.validate(&json!(1)).unwrap().is_valid);
    }

    #[test]
    fn test_reference_into_unknown_member() {
        let schema = Schema::from_json(&json!({
            "x-shapes": {"point": {"type": "array", "maxItems": 2}},
            "$ref": "#/x-shapes/point"
        }))
        .unwrap();
        assert!(schema.validate(&json!([1, 2])).unwrap().is_valid);
        assert!(!schema.validate(&json!([1, 2, 3])).unwrap().is_valid);
    }

    #[test]
    fn test_cycle_through_rebuilt_targets_is_detected() {
        let schema = Schema::from_json(&json!({
            "x-defs": {"loop": {"$ref": "#/x-defs/loop"}},
            "$ref": "#/x-defs/loop"
        }))
        .unwrap();
        let result = schema.validate(&json!(1)).unwrap();
        assert!(result.is_valid);
    }

    #[test]
    fn test_ref_overrides_siblings_before_2019() {
        let doc = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"s": {"type": "string"}},
            "properties": {"a": {"$ref": "#/definitions/s", "maxLength": 1}}
        });
        let schema = Schema::from_json(&doc).unwrap();
        assert!(schema.validate(&json!({"a": "long"})).unwrap().is_valid);

        let mut doc = doc;
        doc["$schema"] = json!("https://json-schema.org/draft/2019-09/schema");
        let schema = Schema::from_json(&doc).unwrap();
        assert!(!schema.validate(&json!({"a": "long"})).unwrap().is_valid);
    }
}
